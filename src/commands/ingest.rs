//! Ingestion run: fetch, enrich, merge.
//!
//! Collects everything played since the start of the current month, merges
//! it into the persistent history, and prints a short summary. Safe to
//! re-run at any time; overlapping windows are absorbed by the merge.

use crate::api::SpotifyClient;
use crate::config::get_config;
use crate::enricher::Enricher;
use crate::fetcher;
use crate::store::MergeStore;
use crate::window::MonthWindow;
use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use tracing::info;

pub async fn run() -> Result<()> {
    let config = get_config();
    let offset = config.timezone.fixed_offset()?;
    let window = MonthWindow::current(Utc::now(), offset);

    println!(
        "📅 Collecting plays since {}...",
        window.start_local.format("%d/%m/%Y").to_string().bold()
    );

    let client = SpotifyClient::from_env(&config.api)?;
    let items = fetcher::fetch_window(&client, &window, config.api.page_limit).await;
    info!(fetched = items.len(), "fetch complete");

    let mut enricher = Enricher::new(&client, offset);
    let mut batch = Vec::with_capacity(items.len());
    for item in &items {
        if let Some(event) = enricher.enrich(item).await {
            batch.push(event);
        }
    }

    let year_month = window.year_month();
    let store = MergeStore::new(&config.paths.data_dir);
    let result = store.merge(&batch, &year_month)?;

    if result.added == result.total {
        println!("📥 Initialized history with {} plays.", result.total);
    } else {
        println!(
            "📈 New plays added: {}",
            result.added.to_string().bright_white().bold()
        );
    }
    println!("✅ History updated ({} plays total).", result.total);
    println!(
        "✅ Archive '{}' refreshed.",
        store.archive_file(&year_month).display()
    );

    if batch.is_empty() {
        println!("⚠️ No new plays were fetched.");
    } else {
        println!("\n🆕 Latest fetched plays:");
        let mut newest = batch.clone();
        newest.sort_by(|a, b| b.played_at.cmp(&a.played_at));
        for event in newest.iter().take(10) {
            println!(
                "  {}  {} — {}",
                event.played_at.format("%Y-%m-%d %H:%M"),
                event.track_name.bold(),
                event.artist_name
            );
        }
    }

    Ok(())
}
