//! LLM connectivity command handlers.

use clap::Subcommand;
use tubesig_client::{first_available, LlmClient};
use tubesig_core::AppConfig;

const DEFAULT_PING_PROMPT: &str = "Reply with one short sentence confirming you can read this.";

/// Sub-commands available under `llm`.
#[derive(Debug, Subcommand)]
pub enum LlmCommands {
    /// Try candidate model names in order and report which answer
    Probe {
        /// Comma-separated candidates [default: TUBESIG_LLM_MODELS]
        #[arg(long, value_delimiter = ',')]
        models: Vec<String>,
    },
    /// Send one prompt and print the reply with token usage
    Ping {
        /// Model name [default: first of TUBESIG_LLM_MODELS]
        #[arg(long)]
        model: Option<String>,
        #[arg(long, default_value = DEFAULT_PING_PROMPT)]
        prompt: String,
    },
}

/// Model to use: the explicit one, else the first configured candidate.
pub(crate) fn pick_model(config: &AppConfig, model: Option<&str>) -> anyhow::Result<String> {
    model
        .map(ToOwned::to_owned)
        .or_else(|| config.llm_models.first().cloned())
        .ok_or_else(|| anyhow::anyhow!("no model given and TUBESIG_LLM_MODELS is empty"))
}

fn build_client(config: &AppConfig) -> anyhow::Result<LlmClient> {
    let api_key = config
        .anthropic_api_key
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("ANTHROPIC_API_KEY is not set"))?;
    Ok(LlmClient::with_base_url(
        api_key,
        config.http_timeout_secs,
        config.llm_max_tokens,
        &config.llm_base_url,
    )?
    .with_retry(config.http_max_retries, config.http_retry_backoff_base_ms))
}

pub(crate) async fn run(config: &AppConfig, command: LlmCommands) -> anyhow::Result<()> {
    let client = build_client(config)?;

    match command {
        LlmCommands::Probe { models } => {
            let models = if models.is_empty() {
                config.llm_models.clone()
            } else {
                models
            };
            if models.is_empty() {
                anyhow::bail!("no candidate models; pass --models or set TUBESIG_LLM_MODELS");
            }

            let probes = client.probe_models(&models).await;
            for probe in &probes {
                match (&probe.resolved, &probe.error) {
                    (Some(resolved), _) => println!("ok    {} (answered as {resolved})", probe.model),
                    (None, Some(error)) => println!("fail  {}: {error}", probe.model),
                    (None, None) => println!("ok    {}", probe.model),
                }
            }

            match first_available(&probes) {
                Some(model) => println!("first available: {model}"),
                None => anyhow::bail!("none of the {} candidate models answered", probes.len()),
            }
        }
        LlmCommands::Ping { model, prompt } => {
            let model = pick_model(config, model.as_deref())?;
            let completion = client.complete(&model, &prompt).await?;
            println!("{}", completion.text.trim());
            println!(
                "model {} | {} in / {} out tokens | stop: {}",
                completion.model,
                completion.input_tokens,
                completion.output_tokens,
                completion.stop_reason.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}
