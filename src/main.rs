use anyhow::Result;
use clap::{Parser, Subcommand};
use spotify_stats::{commands, logging};

#[derive(Parser)]
#[command(name = "spotify-stats")]
#[command(about = "Incremental Spotify listening-history collector with monthly statistics exports")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch this month's recent plays and merge them into the history
    Ingest,
    /// Aggregate the current month and export the dashboard CSVs
    Transform,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging();

    match cli.command {
        Commands::Ingest => commands::ingest::run().await,
        Commands::Transform => commands::transform::run(),
    }
}
