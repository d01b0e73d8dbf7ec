use std::path::Path;

use tubesig_client::{LlmClient, ReviewServerClient};
use tubesig_core::{AppConfig, Signal};

use super::load_reviews;
use crate::llm::pick_model;

pub(super) async fn run_fetch(
    config: &AppConfig,
    server: Option<&str>,
    output: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let base_url = server.unwrap_or(&config.review_server_url);
    let client = ReviewServerClient::new(base_url, config.http_timeout_secs)?;

    if !client.health().await {
        anyhow::bail!("review server at {base_url} is not reachable");
    }

    let reviews = client.fetch_analysis().await?;
    println!(
        "fetched {} reviews ({} approved, {} rejected)",
        reviews.len(),
        reviews.count(tubesig_core::ReviewStatus::Approved),
        reviews.count(tubesig_core::ReviewStatus::Rejected)
    );

    if dry_run {
        println!("dry-run: would write {}", output.display());
        return Ok(());
    }
    tubesig_core::write_reviews(output, &reviews)?;
    println!("wrote {}", output.display());
    Ok(())
}

/// Signals without a verdict in `reviews`, in file order, at most `limit`.
fn pending<'a>(
    signals: &'a [Signal],
    reviews: &tubesig_core::ReviewSet,
    limit: Option<usize>,
) -> Vec<&'a Signal> {
    signals
        .iter()
        .filter(|s| !reviews.contains(&s.review_id()))
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

pub(super) async fn run_llm_review(
    config: &AppConfig,
    signals_path: &Path,
    output: &Path,
    model: Option<&str>,
    limit: Option<usize>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let signals = tubesig_core::read_signals(signals_path)?;
    let mut reviews = load_reviews(output)?;
    let model = pick_model(config, model)?;
    let todo = pending(&signals, &reviews, limit);

    if dry_run {
        for signal in &todo {
            println!("{}\t{}", signal.review_id(), signal.signal_type);
        }
        println!("dry-run: would send {} signals to {model}", todo.len());
        return Ok(());
    }

    let api_key = config
        .anthropic_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("ANTHROPIC_API_KEY is not set; cannot run review llm"))?;
    let client = LlmClient::with_base_url(
        api_key,
        config.http_timeout_secs,
        config.llm_max_tokens,
        &config.llm_base_url,
    )?
    .with_retry(config.http_max_retries, config.http_retry_backoff_base_ms);

    let mut failed = 0usize;
    let mut stored = 0usize;
    for signal in &todo {
        let review_id = signal.review_id();
        match client.review_signal(&model, signal).await {
            Ok(review) => {
                println!("{review_id}\t{}\t{}", review.status, review.reason);
                reviews.insert(review_id, review);
                stored += 1;
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(review_id = %review_id, error = %e, "skipping signal, review failed");
            }
        }
    }

    println!(
        "reviewed {stored} of {} pending signals with {model} ({failed} failed)",
        todo.len()
    );
    if stored > 0 {
        tubesig_core::write_reviews(output, &reviews)?;
        println!("wrote {}", output.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tubesig_core::{Review, ReviewSet, SignalType};

    use super::*;

    #[test]
    fn pending_skips_reviewed_and_honours_limit() {
        let signals = vec![
            Signal::new("v1", "A", SignalType::Buy),
            Signal::new("v1", "B", SignalType::Buy),
            Signal::new("v2", "C", SignalType::Sell),
            Signal::new("v3", "D", SignalType::Hold),
        ];
        let reviews: ReviewSet = [("v1_B".to_owned(), Review::approved(""))]
            .into_iter()
            .collect();

        let all: Vec<String> = pending(&signals, &reviews, None)
            .iter()
            .map(|s| s.review_id())
            .collect();
        assert_eq!(all, ["v1_A", "v2_C", "v3_D"]);

        assert_eq!(pending(&signals, &reviews, Some(2)).len(), 2);
    }
}
