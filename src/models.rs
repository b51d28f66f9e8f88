//! Core data models
//!
//! [`PlayEvent`] is the unit record of the whole pipeline: one occurrence of
//! a track being played, enriched with genres and local-time derived fields.
//! It is what the history table and the monthly archives persist, and what
//! the aggregator consumes.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// One recorded playback of a track.
///
/// `played_at` is stored in the configured local offset; the pair
/// `(track_id, played_at)` identifies a play uniquely across the entire
/// history and is the deduplication key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub track_id: String,
    pub track_name: String,
    pub artist_id: String,
    pub artist_name: String,
    /// Comma-joined names of all contributing artists.
    pub all_artists: String,
    /// Comma-joined genre names of the primary artist; empty when the
    /// lookup failed or the artist has none.
    pub genres: String,
    pub popularity: i32,
    pub played_at: DateTime<FixedOffset>,
    /// Calendar date of `played_at` in local time.
    pub date: NaiveDate,
    /// Local hour of `played_at`, 0-23.
    pub hour: u32,
    pub duration_ms: i64,
}

impl PlayEvent {
    pub fn duration_min(&self) -> f64 {
        self.duration_ms as f64 / 60_000.0
    }

    /// Local year-month key, e.g. `2024-05`. Used both as the archive file
    /// key and as the aggregation filter predicate.
    pub fn year_month(&self) -> String {
        self.played_at.format("%Y-%m").to_string()
    }
}

/// Outcome of merging a batch into the persistent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    /// Net-new plays added to the full-history table.
    pub added: usize,
    /// Size of the full-history table after the merge.
    pub total: usize,
}

#[cfg(test)]
pub(crate) fn sample_event(track_id: &str, played_at: &str) -> PlayEvent {
    let played_at = DateTime::parse_from_rfc3339(played_at).unwrap();
    PlayEvent {
        track_id: track_id.to_string(),
        track_name: format!("track {track_id}"),
        artist_id: format!("artist-{track_id}"),
        artist_name: format!("Artist {track_id}"),
        all_artists: format!("Artist {track_id}"),
        genres: String::new(),
        popularity: 50,
        played_at,
        date: played_at.date_naive(),
        hour: chrono::Timelike::hour(&played_at),
        duration_ms: 200_000,
    }
}
