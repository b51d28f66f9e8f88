//! Content-keyed deduplication
//!
//! A play is identified by `(track_id, played_at)`: the same track cannot
//! be played twice at the same instant. Merging keeps one event per key
//! with a last-write-wins policy (duplicates are expected byte-identical,
//! so the choice rarely matters) while preserving first-seen order, so
//! re-merging an overlapping batch never reshuffles the store.

use crate::models::PlayEvent;
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

pub type DedupKey = (String, DateTime<Utc>);

/// The deduplication key of an event. Timestamps are compared as instants,
/// so the stored offset representation cannot split a key.
pub fn dedup_key(event: &PlayEvent) -> DedupKey {
    (event.track_id.clone(), event.played_at.with_timezone(&Utc))
}

/// Merge `batch` into `existing`, dropping duplicate keys. Returns the
/// deduplicated union in first-seen order.
pub fn merge_events(existing: Vec<PlayEvent>, batch: &[PlayEvent]) -> Vec<PlayEvent> {
    let mut merged: Vec<PlayEvent> = Vec::with_capacity(existing.len() + batch.len());
    let mut index: HashMap<DedupKey, usize> = HashMap::with_capacity(merged.capacity());

    for event in existing.into_iter().chain(batch.iter().cloned()) {
        match index.entry(dedup_key(&event)) {
            Entry::Occupied(slot) => {
                merged[*slot.get()] = event;
            }
            Entry::Vacant(slot) => {
                slot.insert(merged.len());
                merged.push(event);
            }
        }
    }

    merged
}
