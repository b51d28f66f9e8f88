//! Transformation run: aggregate the current month and export CSVs.
//!
//! Reads only; the merge store owns all writes to the history. A month
//! with no data is a normal early stop that leaves previous exports
//! untouched.

use crate::aggregate;
use crate::config::get_config;
use crate::export;
use crate::store::HistoryStore;
use anyhow::Result;
use chrono::Utc;
use colored::Colorize;

pub fn run() -> Result<()> {
    let config = get_config();
    let offset = config.timezone.fixed_offset()?;
    let year_month = Utc::now().with_timezone(&offset).format("%Y-%m").to_string();

    let store = HistoryStore::in_dir(&config.paths.data_dir);
    let history = store.load()?;

    let Some(report) = aggregate::aggregate(&history, &year_month) else {
        println!("⚠️ No data found for the current month.");
        return Ok(());
    };

    let hours = (report.total_minutes / 60.0) as i64;
    let minutes = (report.total_minutes % 60.0) as i64;
    println!(
        "🎧 Plays this month: {}",
        report.tracks.len().to_string().bright_white().bold()
    );
    println!("🕒 Total time: {hours}h {minutes}min");
    println!("⏱️ Average per track: {:.2} min", report.mean_minutes);
    println!("📅 Average per day: {:.1} plays", report.plays_per_day);

    let written = export::write_reports(&config.paths.data_dir, &report)?;
    println!("✅ Reports written:");
    for path in &written {
        println!(" - {}", path.display());
    }

    Ok(())
}
