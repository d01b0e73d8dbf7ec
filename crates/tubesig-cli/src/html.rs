//! Review page command handlers.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use serde_json::Value;
use tubesig_core::AppConfig;
use tubesig_pipeline::html::{REVIEWS_VAR, SIGNALS_VAR};
use tubesig_pipeline::{analyze, check_signals, inject_data_script};

use crate::{files, resolve};

/// Sub-commands available under `html`.
#[derive(Debug, Subcommand)]
pub enum HtmlCommands {
    /// Embed a signals file as the page's SIGNALS_DATA, adding the script block if the page has none
    Embed {
        /// Review page [default: <data dir>/review.html]
        #[arg(long)]
        html: Option<PathBuf>,
        /// Signals to embed [default: <data dir>/signals_final.json]
        #[arg(long)]
        signals: Option<PathBuf>,
        /// Output page [default: overwrite --html]
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Embed a reviews file as a script variable, replacing any existing value
    Inject {
        #[arg(long)]
        html: Option<PathBuf>,
        /// Reviews to embed [default: <data dir>/reviews.json]
        #[arg(long)]
        reviews: Option<PathBuf>,
        /// Script variable to assign
        #[arg(long, default_value = REVIEWS_VAR)]
        var: String,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Describe the page's script blocks and embedded data
    Analyze {
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Flag signal values that break string building in the page
    Check {
        #[arg(long)]
        signals: Option<PathBuf>,
    },
}

pub(crate) fn run(config: &AppConfig, command: HtmlCommands) -> anyhow::Result<()> {
    match command {
        HtmlCommands::Embed {
            html,
            signals,
            output,
            dry_run,
        } => {
            let html = resolve(config, html, files::PAGE);
            let signals = tubesig_core::read_signals(&resolve(config, signals, files::FINAL_SIGNALS))?;
            let output = output.unwrap_or_else(|| html.clone());
            println!("embedding {} signals as {SIGNALS_VAR}", signals.len());
            splice(&html, &output, SIGNALS_VAR, &signals, dry_run)
        }
        HtmlCommands::Inject {
            html,
            reviews,
            var,
            output,
            dry_run,
        } => {
            let html = resolve(config, html, files::PAGE);
            // Raw JSON so a hand-edited reviews file is carried over verbatim.
            let reviews: Value = tubesig_core::read_json(&resolve(config, reviews, files::REVIEWS))?;
            let output = output.unwrap_or_else(|| html.clone());
            let count = reviews.as_object().map_or(0, serde_json::Map::len);
            println!("injecting {count} reviews as {var}");
            splice(&html, &output, &var, &reviews, dry_run)
        }
        HtmlCommands::Analyze { html } => {
            let html = resolve(config, html, files::PAGE);
            let page = read_page(&html)?;
            print!("{}", analyze(&page));
            Ok(())
        }
        HtmlCommands::Check { signals } => {
            let path = resolve(config, signals, files::SIGNALS);
            let signals = tubesig_core::read_signals(&path)?;
            let issues = check_signals(&signals);
            for issue in &issues {
                println!("{issue}");
            }
            if !issues.is_empty() {
                anyhow::bail!("{} issues in {}", issues.len(), path.display());
            }
            println!("{} signals checked, no issues", signals.len());
            Ok(())
        }
    }
}

fn read_page(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn splice<T: serde::Serialize + ?Sized>(
    html: &Path,
    output: &Path,
    var: &str,
    value: &T,
    dry_run: bool,
) -> anyhow::Result<()> {
    let page = read_page(html)?;
    if tubesig_pipeline::html::find_data_blob(&page, var)?.is_none() {
        println!("{var} not found in {}; adding a new script block", html.display());
    }
    let updated = inject_data_script(&page, var, value)?;
    println!("page size {} -> {} bytes", page.len(), updated.len());

    if dry_run {
        println!("dry-run: would write {}", output.display());
        return Ok(());
    }
    tubesig_core::write_atomic(output, &updated)?;
    println!("wrote {}", output.display());
    Ok(())
}
