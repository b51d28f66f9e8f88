//! Persistent history
//!
//! Two parallel representations of the ever-growing play history:
//!
//! - the full-history table (`recent_tracks.jsonl`), the authoritative
//!   queryable store the aggregator reads;
//! - one parquet archive per calendar month, a derived append-only cache
//!   of that month's events.
//!
//! [`MergeStore`] owns all write access and keeps both consistent: every
//! batch is deduplicated against each representation and both files are
//! rewritten wholly (write-to-temp then rename), which makes re-runs with
//! overlapping fetch windows idempotent.

mod history;
mod monthly;

pub use history::HistoryStore;
pub use monthly::MonthlyArchive;

use crate::dedup;
use crate::models::{MergeResult, PlayEvent};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct MergeStore {
    history: HistoryStore,
    archive: MonthlyArchive,
}

impl MergeStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            history: HistoryStore::in_dir(data_dir),
            archive: MonthlyArchive::new(data_dir),
        }
    }

    /// Merge a batch of freshly fetched events into both representations.
    pub fn merge(&self, batch: &[PlayEvent], year_month: &str) -> Result<MergeResult> {
        let existing = self.history.load()?;
        let before = existing.len();
        let merged = dedup::merge_events(existing, batch);
        let total = merged.len();
        self.history.replace_all(&merged)?;

        let monthly = self.archive.read(year_month)?;
        let monthly_merged = dedup::merge_events(monthly, batch);
        self.archive.write(year_month, &monthly_merged)?;

        let result = MergeResult {
            added: total - before,
            total,
        };
        info!(
            added = result.added,
            total = result.total,
            year_month,
            "merged batch into persistent history"
        );
        Ok(result)
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Path of the archive file for a month, for reporting.
    pub fn archive_file(&self, year_month: &str) -> PathBuf {
        self.archive.file_path(year_month)
    }
}
