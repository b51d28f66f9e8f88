//! Full-history table
//!
//! The `recent_tracks` table as a line-delimited JSON file. `load` treats a
//! missing file as an empty history; `replace_all` rewrites the file wholly
//! through a temp sibling and an atomic rename.

use crate::models::PlayEvent;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

pub const HISTORY_FILE: &str = "recent_tracks.jsonl";

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(HISTORY_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the entire history; a missing file is an empty history.
    pub fn load(&self) -> Result<Vec<PlayEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)
            .with_context(|| format!("failed to open history table {}", self.path.display()))?;
        let reader = BufReader::new(file);

        let mut events = Vec::new();
        for (line_number, line) in reader.lines().enumerate() {
            let line = line
                .with_context(|| format!("failed to read {}", self.path.display()))?;
            if line.trim().is_empty() {
                continue;
            }
            let event: PlayEvent = serde_json::from_str(&line).with_context(|| {
                format!(
                    "malformed record at line {} of {}",
                    line_number + 1,
                    self.path.display()
                )
            })?;
            events.push(event);
        }
        Ok(events)
    }

    /// Replace the table's contents wholly. Written to a temp sibling and
    /// renamed into place so a crash mid-write cannot corrupt the table.
    pub fn replace_all(&self, events: &[PlayEvent]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("jsonl.tmp");
        let file = File::create(&tmp)
            .with_context(|| format!("failed to create {}", tmp.display()))?;
        let mut writer = BufWriter::new(file);
        for event in events {
            serde_json::to_writer(&mut writer, event).context("failed to serialize play event")?;
            writer.write_all(b"\n").context("failed to write history table")?;
        }
        writer.flush().context("failed to flush history table")?;

        fs::rename(&tmp, &self.path).with_context(|| {
            format!("failed to move {} into place", self.path.display())
        })?;
        Ok(())
    }
}
