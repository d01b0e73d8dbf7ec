use crate::app_config::AppConfig;
use crate::ConfigError;

/// Candidate model names tried in order when `TUBESIG_LLM_MODELS` is unset.
pub const DEFAULT_LLM_MODELS: &str =
    "claude-opus-4-1-20250805,claude-opus-4-20250514,claude-3-opus-20240229";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Secrets: an empty value counts as unset.
    let secret = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let log_level = or_default("TUBESIG_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("TUBESIG_DATA_DIR", "./data"));
    let bind_addr = parse_addr("TUBESIG_BIND_ADDR", "127.0.0.1:5000")?;

    let http_timeout_secs = parse_u64("TUBESIG_HTTP_TIMEOUT_SECS", "30")?;
    if http_timeout_secs == 0 {
        return Err(invalid(
            "TUBESIG_HTTP_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let http_max_retries = parse_u32("TUBESIG_HTTP_MAX_RETRIES", "3")?;
    let http_retry_backoff_base_ms = parse_u64("TUBESIG_HTTP_RETRY_BACKOFF_BASE_MS", "1000")?;

    let anthropic_api_key = secret("ANTHROPIC_API_KEY");
    let llm_base_url = or_default("TUBESIG_LLM_BASE_URL", "https://api.anthropic.com");
    let llm_models = parse_model_list(&or_default("TUBESIG_LLM_MODELS", DEFAULT_LLM_MODELS));
    if llm_models.is_empty() {
        return Err(invalid(
            "TUBESIG_LLM_MODELS",
            "at least one model name is required".to_string(),
        ));
    }
    let llm_max_tokens = parse_u32("TUBESIG_LLM_MAX_TOKENS", "1024")?;

    let review_server_url = or_default("TUBESIG_REVIEW_SERVER_URL", "http://127.0.0.1:5000");

    let dart_api_key = secret("DART_API_KEY");
    let disclosure_base_url = or_default(
        "TUBESIG_DISCLOSURE_BASE_URL",
        "https://opendart.fss.or.kr/api",
    );
    let telegram_bot_token = secret("TELEGRAM_BOT_TOKEN");
    let telegram_chat_id = secret("TELEGRAM_CHAT_ID");
    let watchlist_path = PathBuf::from(or_default(
        "TUBESIG_WATCHLIST_PATH",
        "./config/watchlist.yaml",
    ));

    Ok(AppConfig {
        log_level,
        data_dir,
        bind_addr,
        http_timeout_secs,
        http_max_retries,
        http_retry_backoff_base_ms,
        anthropic_api_key,
        llm_base_url,
        llm_models,
        llm_max_tokens,
        review_server_url,
        dart_api_key,
        disclosure_base_url,
        telegram_bot_token,
        telegram_chat_id,
        watchlist_path,
    })
}

/// Split a comma-separated model list, dropping blanks and duplicates.
fn parse_model_list(raw: &str) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !models.iter().any(|m| m == name) {
            models.push(name.to_string());
        }
    }
    models
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
