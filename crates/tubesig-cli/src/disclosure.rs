//! Disclosure polling command handlers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use clap::Subcommand;
use tubesig_client::{
    forward_new, ChatBotClient, ClientError, DisclosureClient, DisclosureQuery, ForwardReport,
    MessageSink, SeenSet,
};
use tubesig_core::{AppConfig, Watchlist};

use crate::{files, resolve};

/// Sub-commands available under `disclosure`.
#[derive(Debug, Subcommand)]
pub enum DisclosureCommands {
    /// Fetch the day's filings and forward new watchlist matches to the chat
    Poll {
        /// Filing date as YYYYMMDD [default: today, re-evaluated each pass]
        #[arg(long, value_parser = parse_compact_date)]
        date: Option<NaiveDate>,
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
        /// Seconds between passes in --watch mode
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
        /// Forwarded receipt numbers [default: <data dir>/disclosure_seen.json]
        #[arg(long)]
        seen: Option<PathBuf>,
        /// Only this company's filings
        #[arg(long)]
        corp_code: Option<String>,
        /// Print messages instead of sending them; the seen set is not saved
        #[arg(long)]
        dry_run: bool,
    },
}

pub(crate) fn parse_compact_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .map_err(|e| format!("expected YYYYMMDD, got {value:?}: {e}"))
}

/// Prints each message to stdout instead of sending it.
struct DryRunSink;

impl MessageSink for DryRunSink {
    async fn send(&self, text: &str) -> Result<(), ClientError> {
        println!("---\n{text}");
        Ok(())
    }
}

struct Poller<'a> {
    client: DisclosureClient,
    watchlist: Watchlist,
    seen_path: &'a Path,
    seen: SeenSet,
    date: Option<NaiveDate>,
    corp_code: Option<String>,
    dry_run: bool,
}

impl Poller<'_> {
    fn query(&self) -> DisclosureQuery {
        let date = self
            .date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let query = DisclosureQuery::for_date(date);
        match &self.corp_code {
            Some(code) => query.with_corp_code(code),
            None => query,
        }
    }

    async fn pass<S: MessageSink>(&mut self, sink: &S) -> anyhow::Result<ForwardReport> {
        let query = self.query();
        let filings = self.client.list_all(&query).await?;
        let report = forward_new(&filings, &self.watchlist, &mut self.seen, sink).await;

        if !self.dry_run && report.sent > 0 {
            self.seen.save(self.seen_path)?;
        }
        println!(
            "{}: {} filings, {} matched, {} sent, {} already seen, {} failed",
            query.bgn_de, report.fetched, report.matched, report.sent, report.skipped_seen, report.failed
        );
        Ok(report)
    }

    async fn run<S: MessageSink>(
        &mut self,
        sink: &S,
        watch: bool,
        interval: Duration,
    ) -> anyhow::Result<()> {
        if !watch {
            self.pass(sink).await?;
            return Ok(());
        }

        loop {
            // A failed pass is retried on the next tick rather than ending the watch.
            if let Err(e) = self.pass(sink).await {
                tracing::error!(error = %e, "disclosure poll failed");
            }
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("interrupted, stopping disclosure watch");
                    return Ok(());
                }
            }
        }
    }
}

pub(crate) async fn run(config: &AppConfig, command: DisclosureCommands) -> anyhow::Result<()> {
    let DisclosureCommands::Poll {
        date,
        watch,
        interval_secs,
        seen,
        corp_code,
        dry_run,
    } = command;

    if watch && interval_secs == 0 {
        anyhow::bail!("--interval-secs must be greater than 0");
    }

    let api_key = config
        .dart_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DART_API_KEY is not set"))?;
    let client = DisclosureClient::with_base_url(
        api_key,
        config.http_timeout_secs,
        &config.disclosure_base_url,
    )?
    .with_retry(config.http_max_retries, config.http_retry_backoff_base_ms);

    let watchlist = tubesig_core::load_watchlist(&config.watchlist_path)?;
    if watchlist.is_empty() {
        tracing::warn!(
            path = %config.watchlist_path.display(),
            "watchlist is empty; every filing will be forwarded"
        );
    }

    let seen_path = resolve(config, seen, files::DISCLOSURE_SEEN);
    let seen = SeenSet::load(&seen_path)?;
    tracing::info!(path = %seen_path.display(), seen = seen.len(), "loaded seen set");

    let mut poller = Poller {
        client,
        watchlist,
        seen_path: &seen_path,
        seen,
        date,
        corp_code,
        dry_run,
    };
    let interval = Duration::from_secs(interval_secs);

    if dry_run {
        return poller.run(&DryRunSink, watch, interval).await;
    }

    let token = config
        .telegram_bot_token
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("TELEGRAM_BOT_TOKEN is not set"))?;
    let chat_id = config
        .telegram_chat_id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("TELEGRAM_CHAT_ID is not set"))?;
    let bot = ChatBotClient::new(token, config.http_timeout_secs)?
        .with_retry(config.http_max_retries, config.http_retry_backoff_base_ms);

    poller.run(&bot.for_chat(chat_id), watch, interval).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_date_parses() {
        assert_eq!(
            parse_compact_date("20250307"),
            Ok(NaiveDate::from_ymd_opt(2025, 3, 7).unwrap())
        );
    }

    #[test]
    fn compact_date_rejects_other_shapes() {
        assert!(parse_compact_date("2025-03-07").is_err());
        assert!(parse_compact_date("20251340").is_err());
        assert!(parse_compact_date("").is_err());
    }

    #[test]
    fn query_uses_fixed_date_and_corp_code() {
        let poller = Poller {
            client: DisclosureClient::with_base_url("key", 5, "http://127.0.0.1:9").unwrap(),
            watchlist: Watchlist::default(),
            seen_path: Path::new("unused.json"),
            seen: SeenSet::default(),
            date: NaiveDate::from_ymd_opt(2025, 3, 7),
            corp_code: Some("00126380".to_owned()),
            dry_run: true,
        };
        let query = poller.query();
        assert_eq!(query.bgn_de, "20250307");
        assert_eq!(query.end_de, "20250307");
        assert_eq!(query.corp_code.as_deref(), Some("00126380"));
    }
}
