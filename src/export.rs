//! Dashboard CSV exports
//!
//! Seven flat files per run, all derived from one [`MonthlyReport`]. The
//! headers are the contract with the dashboard and keep the original
//! column names (`quantidade`, `gênero`, `hora`). Like the stores, every
//! file is written to a temp sibling and renamed into place.

use crate::aggregate::MonthlyReport;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// Write all exports into `data_dir` and return the written paths.
pub fn write_reports(data_dir: &Path, report: &MonthlyReport) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let mut written = Vec::with_capacity(7);
    written.push(write_cleaned_tracks(data_dir, report)?);
    written.push(write_counts(
        data_dir,
        "top_tracks.csv",
        "track_name",
        &report.top_tracks,
    )?);
    written.push(write_counts(
        data_dir,
        "top_artists.csv",
        "artist_name",
        &report.top_artists,
    )?);
    written.push(write_counts(
        data_dir,
        "top_genres.csv",
        "gênero",
        &report.top_genres,
    )?);
    written.push(write_hourly(data_dir, report)?);
    written.push(write_daily(data_dir, report)?);
    written.push(write_counts(
        data_dir,
        "weekday_distribution.csv",
        "weekday",
        &report.weekdays,
    )?);
    Ok(written)
}

fn write_cleaned_tracks(data_dir: &Path, report: &MonthlyReport) -> Result<PathBuf> {
    let path = data_dir.join("cleaned_tracks.csv");
    atomic_csv(&path, |writer| {
        writer.write_record([
            "track_id",
            "track_name",
            "artist_id",
            "artist_name",
            "all_artists",
            "genres",
            "popularity",
            "played_at",
            "date",
            "hour",
            "duration_min",
            "weekday",
        ])?;
        for event in &report.tracks {
            writer.write_record([
                event.track_id.as_str(),
                event.track_name.as_str(),
                event.artist_id.as_str(),
                event.artist_name.as_str(),
                event.all_artists.as_str(),
                event.genres.as_str(),
                &event.popularity.to_string(),
                &event.played_at.to_rfc3339(),
                &event.date.to_string(),
                &event.hour.to_string(),
                &format!("{:.4}", event.duration_min()),
                &event.date.format("%A").to_string(),
            ])?;
        }
        Ok(())
    })?;
    Ok(path)
}

fn write_counts(
    data_dir: &Path,
    file_name: &str,
    key_header: &str,
    rows: &[(String, u64)],
) -> Result<PathBuf> {
    let path = data_dir.join(file_name);
    atomic_csv(&path, |writer| {
        writer.write_record([key_header, "quantidade"])?;
        for (key, count) in rows {
            writer.write_record([key.as_str(), &count.to_string()])?;
        }
        Ok(())
    })?;
    Ok(path)
}

fn write_hourly(data_dir: &Path, report: &MonthlyReport) -> Result<PathBuf> {
    let path = data_dir.join("hourly_distribution.csv");
    atomic_csv(&path, |writer| {
        writer.write_record(["hora", "quantidade"])?;
        for (hour, count) in &report.hourly {
            writer.write_record([&hour.to_string(), &count.to_string()])?;
        }
        Ok(())
    })?;
    Ok(path)
}

fn write_daily(data_dir: &Path, report: &MonthlyReport) -> Result<PathBuf> {
    let path = data_dir.join("daily_trend.csv");
    atomic_csv(&path, |writer| {
        writer.write_record(["date", "quantidade"])?;
        for (date, count) in &report.daily {
            writer.write_record([&date.to_string(), &count.to_string()])?;
        }
        Ok(())
    })?;
    Ok(path)
}

fn atomic_csv<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut csv::Writer<File>) -> Result<()>,
{
    let tmp = path.with_extension("csv.tmp");
    let mut writer = csv::Writer::from_path(&tmp)
        .with_context(|| format!("failed to create {}", tmp.display()))?;
    write(&mut writer)?;
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", tmp.display()))?;
    drop(writer);
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to move {} into place", path.display()))?;
    Ok(())
}
