//! Raw item enrichment
//!
//! Turns a raw play-history item into a [`PlayEvent`]: resolves the primary
//! artist's genres (best effort, never an error), converts `played_at` into
//! the reference offset, and derives the calendar date and local hour.
//!
//! Genre lookups are cached per run keyed by artist id, so a listening
//! streak of one artist costs a single request. Failed lookups are cached
//! as empty for the rest of the run.

use crate::api::{GenreSource, PlayHistoryItem};
use crate::models::PlayEvent;
use crate::timestamp;
use chrono::{FixedOffset, Timelike};
use std::collections::HashMap;
use tracing::{debug, warn};

pub struct Enricher<'a, G> {
    genres: &'a G,
    offset: FixedOffset,
    cache: HashMap<String, String>,
}

impl<'a, G> Enricher<'a, G>
where
    G: GenreSource + Sync,
{
    pub fn new(genres: &'a G, offset: FixedOffset) -> Self {
        Self {
            genres,
            offset,
            cache: HashMap::new(),
        }
    }

    /// Enrich one raw item. Returns `None` for items that cannot form a
    /// valid event (unparseable timestamp, no artists); those are logged
    /// and dropped, never fatal.
    pub async fn enrich(&mut self, item: &PlayHistoryItem) -> Option<PlayEvent> {
        let track = &item.track;

        let played_utc = match timestamp::parse_played_at(&item.played_at) {
            Ok(ts) => ts,
            Err(err) => {
                warn!(track_id = %track.id, error = %err, "skipping item with unparseable timestamp");
                return None;
            }
        };
        let Some(primary) = track.artists.first() else {
            warn!(track_id = %track.id, "skipping item with no artists");
            return None;
        };

        let genres = self.resolve_genres(&primary.id).await;
        let local = played_utc.with_timezone(&self.offset);

        Some(PlayEvent {
            track_id: track.id.clone(),
            track_name: track.name.clone(),
            artist_id: primary.id.clone(),
            artist_name: primary.name.clone(),
            all_artists: track
                .artists
                .iter()
                .map(|artist| artist.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            genres,
            popularity: track.popularity,
            played_at: local,
            date: local.date_naive(),
            hour: local.hour(),
            duration_ms: track.duration_ms,
        })
    }

    async fn resolve_genres(&mut self, artist_id: &str) -> String {
        if let Some(cached) = self.cache.get(artist_id) {
            return cached.clone();
        }
        let joined = match self.genres.artist_genres(artist_id).await {
            Ok(list) => list.join(", "),
            Err(err) => {
                debug!(artist_id, error = %err, "genre lookup failed, using empty genres");
                String::new()
            }
        };
        self.cache.insert(artist_id.to_string(), joined.clone());
        joined
    }
}
