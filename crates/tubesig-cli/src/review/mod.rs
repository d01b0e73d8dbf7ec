//! Review command handlers.
//!
//! `rejected`, `summary`, `inline` and `final` are offline file transforms;
//! `fetch` and `llm` talk to the review server and the LLM API.

mod remote;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use tubesig_core::{AppConfig, ReviewSet};
use tubesig_pipeline::{final_signals, inline_reviews, rejected, summarize};

use crate::{files, resolve};

/// Sub-commands available under `review`.
#[derive(Debug, Subcommand)]
pub enum ReviewCommands {
    /// List rejected signals with their reasons
    Rejected {
        #[arg(long)]
        signals: Option<PathBuf>,
        #[arg(long)]
        reviews: Option<PathBuf>,
    },
    /// Print approval counts overall and per signal type
    Summary {
        #[arg(long)]
        signals: Option<PathBuf>,
        #[arg(long)]
        reviews: Option<PathBuf>,
    },
    /// Copy verdicts onto the signals' review fields
    Inline {
        #[arg(long)]
        signals: Option<PathBuf>,
        #[arg(long)]
        reviews: Option<PathBuf>,
        /// Output file [default: overwrite --signals]
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Write the publishable set with rejected signals removed
    Final {
        #[arg(long)]
        signals: Option<PathBuf>,
        #[arg(long)]
        reviews: Option<PathBuf>,
        /// Output file [default: <data dir>/signals_final.json]
        #[arg(long)]
        output: Option<PathBuf>,
        /// Keep signals that have no verdict yet
        #[arg(long)]
        keep_unreviewed: bool,
        #[arg(long)]
        dry_run: bool,
    },
    /// Download verdicts from the review server
    Fetch {
        /// Reviews file to write [default: <data dir>/reviews.json]
        #[arg(long)]
        output: Option<PathBuf>,
        /// Review server base URL [default: TUBESIG_REVIEW_SERVER_URL]
        #[arg(long)]
        server: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Ask the LLM for verdicts on signals that have none
    Llm {
        #[arg(long)]
        signals: Option<PathBuf>,
        /// Reviews file to extend [default: <data dir>/reviews.json]
        #[arg(long)]
        output: Option<PathBuf>,
        /// Model name [default: first of TUBESIG_LLM_MODELS]
        #[arg(long)]
        model: Option<String>,
        /// Review at most this many signals
        #[arg(long)]
        limit: Option<usize>,
        /// List the signals that would be sent without calling the API
        #[arg(long)]
        dry_run: bool,
    },
}

/// Reads the reviews file, treating a missing file as no verdicts yet.
fn load_reviews(path: &Path) -> anyhow::Result<ReviewSet> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "reviews file not found; treating as empty");
        return Ok(ReviewSet::new());
    }
    Ok(tubesig_core::read_reviews(path)?)
}

pub(crate) async fn run(config: &AppConfig, command: ReviewCommands) -> anyhow::Result<()> {
    match command {
        ReviewCommands::Rejected { signals, reviews } => {
            let signals = tubesig_core::read_signals(&resolve(config, signals, files::SIGNALS))?;
            let reviews = load_reviews(&resolve(config, reviews, files::REVIEWS))?;
            print_rejected(&signals, &reviews);
        }
        ReviewCommands::Summary { signals, reviews } => {
            let signals = tubesig_core::read_signals(&resolve(config, signals, files::SIGNALS))?;
            let reviews = load_reviews(&resolve(config, reviews, files::REVIEWS))?;
            print!("{}", summarize(&signals, &reviews));
        }
        ReviewCommands::Inline {
            signals,
            reviews,
            output,
            dry_run,
        } => {
            let signals_path = resolve(config, signals, files::SIGNALS);
            let output = output.unwrap_or_else(|| signals_path.clone());
            let signals = tubesig_core::read_signals(&signals_path)?;
            let reviews = load_reviews(&resolve(config, reviews, files::REVIEWS))?;

            let inlined = inline_reviews(signals, &reviews);
            let reviewed = inlined.iter().filter(|s| s.review_status.is_some()).count();
            println!("{reviewed} of {} signals carry a verdict", inlined.len());
            write_or_report(&output, &inlined, dry_run)?;
        }
        ReviewCommands::Final {
            signals,
            reviews,
            output,
            keep_unreviewed,
            dry_run,
        } => {
            let signals = tubesig_core::read_signals(&resolve(config, signals, files::SIGNALS))?;
            let reviews = load_reviews(&resolve(config, reviews, files::REVIEWS))?;
            let output = resolve(config, output, files::FINAL_SIGNALS);

            let total = signals.len();
            let kept = final_signals(signals, &reviews, keep_unreviewed);
            println!("kept {} of {total} signals", kept.len());
            write_or_report(&output, &kept, dry_run)?;
        }
        ReviewCommands::Fetch {
            output,
            server,
            dry_run,
        } => {
            let output = resolve(config, output, files::REVIEWS);
            remote::run_fetch(config, server.as_deref(), &output, dry_run).await?;
        }
        ReviewCommands::Llm {
            signals,
            output,
            model,
            limit,
            dry_run,
        } => {
            let signals = resolve(config, signals, files::SIGNALS);
            let output = resolve(config, output, files::REVIEWS);
            remote::run_llm_review(config, &signals, &output, model.as_deref(), limit, dry_run)
                .await?;
        }
    }
    Ok(())
}

fn print_rejected(signals: &[tubesig_core::Signal], reviews: &ReviewSet) {
    let report = rejected(signals, reviews);
    for entry in &report.rejected {
        println!(
            "{}\t{}\t{}",
            entry.signal.review_id(),
            entry.signal.signal_type,
            entry.reason
        );
    }
    println!("{} rejected", report.rejected.len());
    if !report.orphans.is_empty() {
        println!(
            "{} reviews match no signal: {}",
            report.orphans.len(),
            report.orphans.join(", ")
        );
    }
}

fn write_or_report(
    output: &Path,
    signals: &[tubesig_core::Signal],
    dry_run: bool,
) -> anyhow::Result<()> {
    if dry_run {
        println!("dry-run: would write {}", output.display());
        return Ok(());
    }
    tubesig_core::write_signals(output, signals)?;
    println!("wrote {}", output.display());
    Ok(())
}
