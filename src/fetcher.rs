//! Paginated play-history fetch
//!
//! Walks the recently-played endpoint backward in time until the current
//! month's window is exhausted. Two stopping conditions work together:
//!
//! - within a page (items are newest-first), the first item that falls
//!   before the local month start ends that page's scan without ending the
//!   crawl;
//! - after a page, the crawl stops once the oldest raw UTC timestamp in the
//!   page has crossed the UTC month start.
//!
//! The in-page break alone never terminates pagination; only the
//! whole-page check does, which can cost one extra page request per run.
//! A transient request failure ends the fetch for this run with whatever
//! was already collected; the next run re-covers the overlap and the merge
//! absorbs it.

use crate::api::{PlayHistoryItem, PlayHistorySource};
use crate::timestamp;
use crate::window::MonthWindow;
use tracing::{debug, warn};

/// Collect all raw items played at or after the window's local month start.
pub async fn fetch_window<S>(
    source: &S,
    window: &MonthWindow,
    page_limit: u32,
) -> Vec<PlayHistoryItem>
where
    S: PlayHistorySource + Sync,
{
    let mut collected = Vec::new();
    let mut before: Option<i64> = None;

    loop {
        let page = match source.recently_played(page_limit, before).await {
            Ok(page) => page,
            Err(err) => {
                warn!(error = %err, "recently-played request failed, ending fetch for this run");
                break;
            }
        };
        if page.items.is_empty() {
            break;
        }

        for item in &page.items {
            let played_utc = match timestamp::parse_played_at(&item.played_at) {
                Ok(ts) => ts,
                Err(err) => {
                    warn!(played_at = %item.played_at, error = %err, "skipping item with unparseable timestamp");
                    continue;
                }
            };
            if played_utc.with_timezone(&window.offset) < window.start_local {
                // Items are newest-first; everything after this one in the
                // page is older still.
                break;
            }
            collected.push(item.clone());
        }

        let oldest = page
            .items
            .iter()
            .filter_map(|item| timestamp::parse_played_at(&item.played_at).ok())
            .min();
        let Some(oldest) = oldest else {
            break;
        };
        before = Some(oldest.timestamp_millis());
        debug!(
            page_size = page.items.len(),
            collected = collected.len(),
            oldest = %oldest,
            "processed recently-played page"
        );
        if oldest < window.start_utc {
            break;
        }
    }

    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{RecentlyPlayedPage, TrackObject};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone, Utc};
    use std::sync::Mutex;

    fn item(track_id: &str, played_at: &str) -> PlayHistoryItem {
        PlayHistoryItem {
            track: TrackObject {
                id: track_id.to_string(),
                name: format!("track {track_id}"),
                artists: Vec::new(),
                popularity: 0,
                duration_ms: 1000,
            },
            played_at: played_at.to_string(),
        }
    }

    /// Serves scripted pages and records the cursors it was asked for.
    struct ScriptedSource {
        pages: Mutex<Vec<Result<RecentlyPlayedPage, String>>>,
        cursors: Mutex<Vec<Option<i64>>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<RecentlyPlayedPage, String>>) -> Self {
            let mut pages = pages;
            pages.reverse();
            Self {
                pages: Mutex::new(pages),
                cursors: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> usize {
            self.cursors.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PlayHistorySource for ScriptedSource {
        async fn recently_played(
            &self,
            _limit: u32,
            before: Option<i64>,
        ) -> anyhow::Result<RecentlyPlayedPage> {
            self.cursors.lock().unwrap().push(before);
            match self.pages.lock().unwrap().pop() {
                Some(Ok(page)) => Ok(page),
                Some(Err(message)) => Err(anyhow!(message)),
                None => Ok(RecentlyPlayedPage { items: Vec::new() }),
            }
        }
    }

    fn may_2024_window() -> MonthWindow {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        MonthWindow::current(Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap(), offset)
    }

    #[tokio::test]
    async fn stops_on_empty_page() {
        let source = ScriptedSource::new(vec![Ok(RecentlyPlayedPage { items: Vec::new() })]);
        let collected = fetch_window(&source, &may_2024_window(), 50).await;
        assert!(collected.is_empty());
        assert_eq!(source.requests(), 1);
    }

    #[tokio::test]
    async fn stops_after_page_crossing_the_window() {
        let source = ScriptedSource::new(vec![Ok(RecentlyPlayedPage {
            items: vec![
                item("a", "2024-05-02T12:00:00Z"),
                // Before the UTC month start (2024-05-01T03:00Z): ends the crawl.
                item("b", "2024-04-30T23:00:00Z"),
            ],
        })]);

        let collected = fetch_window(&source, &may_2024_window(), 50).await;
        assert_eq!(
            collected.iter().map(|i| i.track.id.as_str()).collect::<Vec<_>>(),
            vec!["a"]
        );
        assert_eq!(source.requests(), 1);
    }

    #[tokio::test]
    async fn fully_in_window_page_requests_the_next_page() {
        // Every item is after the boundary, so the crawl continues with the
        // page's oldest timestamp as the next cursor.
        let source = ScriptedSource::new(vec![
            Ok(RecentlyPlayedPage {
                items: vec![
                    item("a", "2024-05-02T12:00:00Z"),
                    item("b", "2024-05-01T05:00:00Z"),
                ],
            }),
            Ok(RecentlyPlayedPage { items: Vec::new() }),
        ]);

        let collected = fetch_window(&source, &may_2024_window(), 50).await;
        assert_eq!(
            collected.iter().map(|i| i.track.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(source.requests(), 2);

        // The second request carries the oldest timestamp of page one.
        let cursors = source.cursors.lock().unwrap().clone();
        let oldest = Utc.with_ymd_and_hms(2024, 5, 1, 5, 0, 0).unwrap();
        assert_eq!(cursors, vec![None, Some(oldest.timestamp_millis())]);
    }

    #[tokio::test]
    async fn out_of_window_item_mid_page_ends_that_scan() {
        // Items should be newest-first; if an out-of-window item shows up
        // mid-page, the scan stops there and later items are not examined.
        let source = ScriptedSource::new(vec![Ok(RecentlyPlayedPage {
            items: vec![
                item("a", "2024-05-10T12:00:00Z"),
                item("old", "2024-04-20T12:00:00Z"),
                item("b", "2024-05-05T12:00:00Z"),
            ],
        })]);

        let collected = fetch_window(&source, &may_2024_window(), 50).await;
        assert_eq!(
            collected.iter().map(|i| i.track.id.as_str()).collect::<Vec<_>>(),
            vec!["a"]
        );
        assert_eq!(source.requests(), 1);
    }

    #[tokio::test]
    async fn request_failure_keeps_partial_results() {
        let source = ScriptedSource::new(vec![
            Ok(RecentlyPlayedPage {
                items: vec![item("a", "2024-05-10T12:00:00Z")],
            }),
            Err("rate limited".to_string()),
        ]);

        let collected = fetch_window(&source, &may_2024_window(), 50).await;
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].track.id, "a");
    }

    #[tokio::test]
    async fn every_collected_item_is_inside_the_window() {
        let window = may_2024_window();
        let source = ScriptedSource::new(vec![Ok(RecentlyPlayedPage {
            items: vec![
                item("a", "2024-05-20T10:00:00Z"),
                item("b", "2024-05-01T03:00:00Z"),
                item("c", "2024-04-25T10:00:00Z"),
            ],
        })]);

        let collected = fetch_window(&source, &window, 50).await;
        for collected_item in &collected {
            let played = timestamp::parse_played_at(&collected_item.played_at).unwrap();
            assert!(played.with_timezone(&window.offset) >= window.start_local);
        }
        assert_eq!(collected.len(), 2);
    }

    #[tokio::test]
    async fn unparseable_timestamps_are_skipped() {
        let source = ScriptedSource::new(vec![Ok(RecentlyPlayedPage {
            items: vec![
                item("a", "2024-05-10T12:00:00Z"),
                item("bad", "not a timestamp"),
                item("b", "2024-04-01T12:00:00Z"),
            ],
        })]);

        let collected = fetch_window(&source, &may_2024_window(), 50).await;
        assert_eq!(
            collected.iter().map(|i| i.track.id.as_str()).collect::<Vec<_>>(),
            vec!["a"]
        );
    }
}
