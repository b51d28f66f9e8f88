//! Monthly aggregation
//!
//! Recomputes the current month's statistics in full from the history
//! table on every run; nothing here is incremental and nothing is
//! authoritative. Grouping is explicit key-to-accumulator maps followed by
//! a descending sort by count.

use crate::models::PlayEvent;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Disposable per-month statistics, consumed by the CSV exports.
#[derive(Debug, Clone)]
pub struct MonthlyReport {
    pub year_month: String,
    /// The month's events, in store order.
    pub tracks: Vec<PlayEvent>,
    pub total_minutes: f64,
    pub mean_minutes: f64,
    pub distinct_days: usize,
    pub plays_per_day: f64,
    /// `(track_name, count)`, descending by count.
    pub top_tracks: Vec<(String, u64)>,
    /// `(artist_name, count)`, descending by count.
    pub top_artists: Vec<(String, u64)>,
    /// `(genre, count)`, descending by count. A record with several genres
    /// counts once per genre; empty genre fields count toward none.
    pub top_genres: Vec<(String, u64)>,
    /// All 24 hours in ascending order, zero-filled.
    pub hourly: Vec<(u32, u64)>,
    /// One row per date present, ascending.
    pub daily: Vec<(NaiveDate, u64)>,
    /// `(weekday name, count)`, descending by count.
    pub weekdays: Vec<(String, u64)>,
}

/// Aggregate one month of history. `None` means no data for that month,
/// which is a normal outcome, not an error.
pub fn aggregate(history: &[PlayEvent], year_month: &str) -> Option<MonthlyReport> {
    let tracks: Vec<PlayEvent> = history
        .iter()
        .filter(|event| event.year_month() == year_month)
        .cloned()
        .collect();
    if tracks.is_empty() {
        return None;
    }

    let total_minutes: f64 = tracks.iter().map(PlayEvent::duration_min).sum();
    let mean_minutes = total_minutes / tracks.len() as f64;

    let days: BTreeSet<NaiveDate> = tracks.iter().map(|event| event.date).collect();
    let distinct_days = days.len();
    let plays_per_day = if distinct_days > 0 {
        tracks.len() as f64 / distinct_days as f64
    } else {
        0.0
    };

    let top_tracks = count_descending(tracks.iter().map(|event| event.track_name.clone()));
    let top_artists = count_descending(tracks.iter().map(|event| event.artist_name.clone()));
    let top_genres = count_descending(
        tracks
            .iter()
            .filter(|event| !event.genres.is_empty())
            .flat_map(|event| {
                event
                    .genres
                    .split(',')
                    .map(|genre| genre.trim().to_string())
                    .filter(|genre| !genre.is_empty())
            }),
    );

    let mut hour_counts = [0u64; 24];
    for event in &tracks {
        if let Some(slot) = hour_counts.get_mut(event.hour as usize) {
            *slot += 1;
        }
    }
    let hourly = (0..24u32)
        .map(|hour| (hour, hour_counts[hour as usize]))
        .collect();

    let mut daily_counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for event in &tracks {
        *daily_counts.entry(event.date).or_default() += 1;
    }
    let daily = daily_counts.into_iter().collect();

    let weekdays =
        count_descending(tracks.iter().map(|event| event.date.format("%A").to_string()));

    Some(MonthlyReport {
        year_month: year_month.to_string(),
        tracks,
        total_minutes,
        mean_minutes,
        distinct_days,
        plays_per_day,
        top_tracks,
        top_artists,
        top_genres,
        hourly,
        daily,
        weekdays,
    })
}

fn count_descending<I>(items: I) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for item in items {
        *counts.entry(item).or_default() += 1;
    }
    let mut sorted: Vec<(String, u64)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_event;
    use chrono::Timelike;

    fn event_at(track_id: &str, played_at: &str) -> PlayEvent {
        sample_event(track_id, played_at)
    }

    #[test]
    fn empty_month_yields_none() {
        let history = vec![event_at("a", "2024-04-30T10:00:00-03:00")];
        assert!(aggregate(&history, "2024-05").is_none());
        assert!(aggregate(&[], "2024-05").is_none());
    }

    #[test]
    fn filters_to_the_requested_month() {
        let history = vec![
            event_at("a", "2024-05-01T10:00:00-03:00"),
            event_at("b", "2024-04-30T10:00:00-03:00"),
            event_at("c", "2024-06-01T10:00:00-03:00"),
        ];
        let report = aggregate(&history, "2024-05").unwrap();
        assert_eq!(report.tracks.len(), 1);
        assert_eq!(report.tracks[0].track_id, "a");
    }

    #[test]
    fn distribution_totals_match_the_filtered_count() {
        let history = vec![
            event_at("a", "2024-05-01T09:00:00-03:00"),
            event_at("a", "2024-05-01T21:00:00-03:00"),
            event_at("b", "2024-05-02T21:30:00-03:00"),
        ];
        let report = aggregate(&history, "2024-05").unwrap();

        let hourly_total: u64 = report.hourly.iter().map(|(_, count)| count).sum();
        let daily_total: u64 = report.daily.iter().map(|(_, count)| count).sum();
        assert_eq!(hourly_total, report.tracks.len() as u64);
        assert_eq!(daily_total, report.tracks.len() as u64);
    }

    #[test]
    fn hourly_distribution_has_all_24_hours_zero_filled() {
        let history = vec![
            event_at("a", "2024-05-01T09:00:00-03:00"),
            event_at("a", "2024-05-01T21:00:00-03:00"),
            event_at("b", "2024-05-02T21:30:00-03:00"),
        ];
        assert_eq!(history[2].played_at.hour(), 21);

        let report = aggregate(&history, "2024-05").unwrap();
        assert_eq!(report.hourly.len(), 24);
        for (hour, count) in &report.hourly {
            let expected = match hour {
                9 => 1,
                21 => 2,
                _ => 0,
            };
            assert_eq!(*count, expected, "hour {hour}");
        }
        let hours: Vec<u32> = report.hourly.iter().map(|(hour, _)| *hour).collect();
        assert_eq!(hours, (0..24).collect::<Vec<_>>());
    }

    #[test]
    fn genre_explosion_counts_once_per_genre() {
        let mut first = event_at("a", "2024-05-01T10:00:00-03:00");
        first.genres = "rock, pop".to_string();
        let mut second = event_at("b", "2024-05-01T11:00:00-03:00");
        second.genres = "rock".to_string();
        let third = event_at("c", "2024-05-01T12:00:00-03:00"); // no genres

        let report = aggregate(&[first, second, third], "2024-05").unwrap();
        assert_eq!(
            report.top_genres,
            vec![("rock".to_string(), 2), ("pop".to_string(), 1)]
        );
    }

    #[test]
    fn tops_are_sorted_descending() {
        let history = vec![
            event_at("a", "2024-05-01T10:00:00-03:00"),
            event_at("a", "2024-05-02T10:00:00-03:00"),
            event_at("a", "2024-05-03T10:00:00-03:00"),
            event_at("b", "2024-05-01T11:00:00-03:00"),
            event_at("b", "2024-05-02T11:00:00-03:00"),
            event_at("c", "2024-05-01T12:00:00-03:00"),
        ];
        let report = aggregate(&history, "2024-05").unwrap();

        for window in report.top_tracks.windows(2) {
            assert!(window[0].1 >= window[1].1);
        }
        assert_eq!(report.top_tracks[0], ("track a".to_string(), 3));
        for window in report.top_artists.windows(2) {
            assert!(window[0].1 >= window[1].1);
        }
        for window in report.weekdays.windows(2) {
            assert!(window[0].1 >= window[1].1);
        }
    }

    #[test]
    fn summary_statistics() {
        let mut history = vec![
            event_at("a", "2024-05-01T10:00:00-03:00"),
            event_at("b", "2024-05-01T11:00:00-03:00"),
            event_at("c", "2024-05-03T12:00:00-03:00"),
        ];
        for event in &mut history {
            event.duration_ms = 120_000; // 2 minutes each
        }

        let report = aggregate(&history, "2024-05").unwrap();
        assert_eq!(report.total_minutes, 6.0);
        assert_eq!(report.mean_minutes, 2.0);
        assert_eq!(report.distinct_days, 2);
        assert_eq!(report.plays_per_day, 1.5);
    }

    #[test]
    fn weekday_names_derive_from_the_date() {
        // 2024-05-01 is a Wednesday.
        let history = vec![event_at("a", "2024-05-01T10:00:00-03:00")];
        let report = aggregate(&history, "2024-05").unwrap();
        assert_eq!(report.weekdays, vec![("Wednesday".to_string(), 1)]);
    }
}
