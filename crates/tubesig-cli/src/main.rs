mod disclosure;
mod html;
mod llm;
mod pipeline;
mod review;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tubesig_core::AppConfig;

use crate::disclosure::DisclosureCommands;
use crate::html::HtmlCommands;
use crate::llm::LlmCommands;
use crate::review::ReviewCommands;

/// Default file names under `TUBESIG_DATA_DIR`.
pub(crate) mod files {
    pub const RAW_SIGNALS: &str = "signals_raw.json";
    pub const DEDUP_SIGNALS: &str = "signals_dedup.json";
    pub const UPLOAD_DATES: &str = "upload_dates.json";
    pub const SIGNALS: &str = "signals.json";
    pub const REVIEWS: &str = "reviews.json";
    pub const FINAL_SIGNALS: &str = "signals_final.json";
    pub const PAGE: &str = "review.html";
    pub const DISCLOSURE_SEEN: &str = "disclosure_seen.json";
}

#[derive(Debug, Parser)]
#[command(name = "tubesig")]
#[command(about = "Trading-signal review pipeline and disclosure forwarder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Merge repeated extractions of the same (video, asset) call
    Dedup {
        /// Raw extracted signals [default: <data dir>/signals_raw.json]
        #[arg(long)]
        input: Option<PathBuf>,
        /// Deduplicated output [default: <data dir>/signals_dedup.json]
        #[arg(long)]
        output: Option<PathBuf>,
        /// Report what would change without writing the output
        #[arg(long)]
        dry_run: bool,
    },
    /// Attach upload dates to signals and sort newest first
    Dates {
        /// Signals to date [default: <data dir>/signals_dedup.json]
        #[arg(long)]
        signals: Option<PathBuf>,
        /// Upload-date lookup (object or list of video metadata) [default: <data dir>/upload_dates.json]
        #[arg(long)]
        dates: Option<PathBuf>,
        /// Dated output [default: <data dir>/signals.json]
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Filter, summarize and apply review verdicts
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },
    /// Inspect and update the review page's embedded data
    Html {
        #[command(subcommand)]
        command: HtmlCommands,
    },
    /// LLM API connectivity and model checks
    Llm {
        #[command(subcommand)]
        command: LlmCommands,
    },
    /// Financial disclosure polling and forwarding
    Disclosure {
        #[command(subcommand)]
        command: DisclosureCommands,
    },
}

/// `path`, or `name` under the configured data directory.
pub(crate) fn resolve(config: &AppConfig, path: Option<PathBuf>, name: &str) -> PathBuf {
    path.unwrap_or_else(|| config.data_file(name))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = tubesig_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Dedup {
            input,
            output,
            dry_run,
        } => {
            let input = resolve(&config, input, files::RAW_SIGNALS);
            let output = resolve(&config, output, files::DEDUP_SIGNALS);
            pipeline::run_dedup(&input, &output, dry_run)?;
        }
        Commands::Dates {
            signals,
            dates,
            output,
            dry_run,
        } => {
            let signals = resolve(&config, signals, files::DEDUP_SIGNALS);
            let dates = resolve(&config, dates, files::UPLOAD_DATES);
            let output = resolve(&config, output, files::SIGNALS);
            pipeline::run_dates(&signals, &dates, &output, dry_run)?;
        }
        Commands::Review { command } => review::run(&config, command).await?,
        Commands::Html { command } => html::run(&config, command)?,
        Commands::Llm { command } => llm::run(&config, command).await?,
        Commands::Disclosure { command } => disclosure::run(&config, command).await?,
    }

    Ok(())
}
