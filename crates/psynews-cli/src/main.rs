use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod report;
mod run;

#[derive(Debug, Parser)]
#[command(name = "psynews")]
#[command(about = "Psychology research digest pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect articles, score them, and merge survivors into the store.
    Run {
        /// Override the configured collection limit.
        #[arg(long)]
        limit: Option<usize>,
        /// Run the full pipeline but skip persisting the store.
        #[arg(long)]
        dry_run: bool,
        /// Evaluate recency as of this date instead of today (YYYY-MM-DD).
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Print aggregate statistics for the persisted store.
    Report,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = psynews_core::load_app_config_from_env()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { limit, dry_run, date } => run::run(&config, limit, dry_run, date).await,
        Commands::Report => report::report(&config),
    }
}
