//! Spotify listening-history pipeline
//!
//! Collects the user's recently played tracks from the Spotify Web API,
//! merges them into a persistent, deduplicated history, and exports the
//! current month's aggregate statistics as flat CSV files for an external
//! dashboard.
//!
//! ## Pipeline
//!
//! 1. [`window`] resolves the current calendar-month boundary in a fixed
//!    UTC offset.
//! 2. [`fetcher`] pages backward through the recently-played endpoint until
//!    the window is exhausted.
//! 3. [`enricher`] augments each raw item with artist genres and derived
//!    local-time fields.
//! 4. [`store`] merges the batch into the full-history table and the
//!    per-month parquet archive, deduplicating on `(track_id, played_at)`.
//! 5. [`aggregate`] recomputes the month's statistics in full, and
//!    [`export`] writes them out.
//!
//! Steps 1-4 run as `spotify-stats ingest`, step 5 as
//! `spotify-stats transform`. Both are safe to re-run: overlapping fetch
//! windows are absorbed by the idempotent merge.

pub mod aggregate;
pub mod api;
pub mod commands;
pub mod config;
pub mod dedup;
pub mod enricher;
pub mod export;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod store;
pub mod timestamp;
pub mod window;

pub use models::{MergeResult, PlayEvent};
