//! Monthly parquet archives
//!
//! One columnar file per calendar month (`raw_tracks_YYYY_MM.parquet`),
//! mirroring the month's slice of the history table. Reads tolerate a
//! missing file; writes go through a temp sibling and an atomic rename,
//! with ZSTD compression.

use crate::models::PlayEvent;
use anyhow::{anyhow, Context, Result};
use arrow::array::{Array, ArrayRef, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDate};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct MonthlyArchive {
    dir: PathBuf,
}

impl MonthlyArchive {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Archive file for a `YYYY-MM` key, e.g. `raw_tracks_2024_05.parquet`.
    pub fn file_path(&self, year_month: &str) -> PathBuf {
        self.dir
            .join(format!("raw_tracks_{}.parquet", year_month.replace('-', "_")))
    }

    /// Read one month's archive; a missing file is an empty month.
    pub fn read(&self, year_month: &str) -> Result<Vec<PlayEvent>> {
        let path = self.file_path(year_month);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)
            .with_context(|| format!("failed to open archive {}", path.display()))?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .with_context(|| format!("failed to read archive {}", path.display()))?
            .build()
            .context("failed to build parquet reader")?;

        let mut events = Vec::new();
        for batch in reader {
            let batch = batch.context("failed to decode parquet batch")?;
            events.extend(batch_to_events(&batch)?);
        }
        Ok(events)
    }

    /// Rewrite one month's archive wholly.
    pub fn write(&self, year_month: &str, events: &[PlayEvent]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;

        let path = self.file_path(year_month);
        let tmp = path.with_extension("parquet.tmp");
        let file = File::create(&tmp)
            .with_context(|| format!("failed to create {}", tmp.display()))?;

        let batch = events_to_batch(events)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(Default::default()))
            .build();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
            .context("failed to create parquet writer")?;
        writer.write(&batch).context("failed to write parquet batch")?;
        writer.close().context("failed to close parquet writer")?;

        fs::rename(&tmp, &path)
            .with_context(|| format!("failed to move {} into place", path.display()))?;
        Ok(())
    }
}

fn archive_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("track_id", DataType::Utf8, false),
        Field::new("track_name", DataType::Utf8, false),
        Field::new("artist_id", DataType::Utf8, false),
        Field::new("artist_name", DataType::Utf8, false),
        Field::new("all_artists", DataType::Utf8, false),
        Field::new("genres", DataType::Utf8, false),
        Field::new("popularity", DataType::Int32, false),
        Field::new("played_at", DataType::Utf8, false),
        Field::new("date", DataType::Utf8, false),
        Field::new("hour", DataType::Int32, false),
        Field::new("duration_ms", DataType::Int64, false),
    ]))
}

fn events_to_batch(events: &[PlayEvent]) -> Result<RecordBatch> {
    let string_col = |values: Vec<String>| -> ArrayRef { Arc::new(StringArray::from(values)) };

    let columns: Vec<ArrayRef> = vec![
        string_col(events.iter().map(|e| e.track_id.clone()).collect()),
        string_col(events.iter().map(|e| e.track_name.clone()).collect()),
        string_col(events.iter().map(|e| e.artist_id.clone()).collect()),
        string_col(events.iter().map(|e| e.artist_name.clone()).collect()),
        string_col(events.iter().map(|e| e.all_artists.clone()).collect()),
        string_col(events.iter().map(|e| e.genres.clone()).collect()),
        Arc::new(Int32Array::from(
            events.iter().map(|e| e.popularity).collect::<Vec<_>>(),
        )),
        string_col(events.iter().map(|e| e.played_at.to_rfc3339()).collect()),
        string_col(events.iter().map(|e| e.date.to_string()).collect()),
        Arc::new(Int32Array::from(
            events.iter().map(|e| e.hour as i32).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(
            events.iter().map(|e| e.duration_ms).collect::<Vec<_>>(),
        )),
    ];

    RecordBatch::try_new(archive_schema(), columns).context("failed to build record batch")
}

fn batch_to_events(batch: &RecordBatch) -> Result<Vec<PlayEvent>> {
    fn strings<'a>(batch: &'a RecordBatch, index: usize, name: &str) -> Result<&'a StringArray> {
        batch
            .column(index)
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| anyhow!("archive column {name} is not a string column"))
    }

    let track_id = strings(batch, 0, "track_id")?;
    let track_name = strings(batch, 1, "track_name")?;
    let artist_id = strings(batch, 2, "artist_id")?;
    let artist_name = strings(batch, 3, "artist_name")?;
    let all_artists = strings(batch, 4, "all_artists")?;
    let genres = strings(batch, 5, "genres")?;
    let popularity = batch
        .column(6)
        .as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(|| anyhow!("archive column popularity is not an int32 column"))?;
    let played_at = strings(batch, 7, "played_at")?;
    let date = strings(batch, 8, "date")?;
    let hour = batch
        .column(9)
        .as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(|| anyhow!("archive column hour is not an int32 column"))?;
    let duration_ms = batch
        .column(10)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| anyhow!("archive column duration_ms is not an int64 column"))?;

    let mut events = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        events.push(PlayEvent {
            track_id: track_id.value(row).to_string(),
            track_name: track_name.value(row).to_string(),
            artist_id: artist_id.value(row).to_string(),
            artist_name: artist_name.value(row).to_string(),
            all_artists: all_artists.value(row).to_string(),
            genres: genres.value(row).to_string(),
            popularity: popularity.value(row),
            played_at: DateTime::parse_from_rfc3339(played_at.value(row))
                .context("invalid played_at in archive")?,
            date: NaiveDate::parse_from_str(date.value(row), "%Y-%m-%d")
                .context("invalid date in archive")?,
            hour: hour.value(row) as u32,
            duration_ms: duration_ms.value(row),
        });
    }
    Ok(events)
}
