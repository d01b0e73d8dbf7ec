use std::collections::HashMap;
use std::env::VarError;

use super::*;

fn lookup_from_map<'a>(
    map: &'a HashMap<&'a str, &'a str>,
) -> impl Fn(&str) -> Result<String, VarError> + 'a {
    move |key| {
        map.get(key)
            .map(|v| (*v).to_string())
            .ok_or(VarError::NotPresent)
    }
}

#[test]
fn build_app_config_defaults_with_empty_env() {
    let map: HashMap<&str, &str> = HashMap::new();
    let result = build_app_config(lookup_from_map(&map));
    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let cfg = result.unwrap();
    assert_eq!(cfg.log_level, "info");
    assert_eq!(cfg.data_dir, std::path::PathBuf::from("./data"));
    assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:5000");
    assert_eq!(cfg.http_timeout_secs, 30);
    assert_eq!(cfg.http_max_retries, 3);
    assert_eq!(cfg.http_retry_backoff_base_ms, 1000);
    assert!(cfg.anthropic_api_key.is_none());
    assert_eq!(cfg.llm_base_url, "https://api.anthropic.com");
    assert_eq!(cfg.llm_models.len(), 3);
    assert_eq!(cfg.llm_max_tokens, 1024);
    assert_eq!(cfg.review_server_url, "http://127.0.0.1:5000");
    assert!(cfg.dart_api_key.is_none());
    assert_eq!(cfg.disclosure_base_url, "https://opendart.fss.or.kr/api");
    assert!(cfg.telegram_bot_token.is_none());
    assert!(cfg.telegram_chat_id.is_none());
}

#[test]
fn build_app_config_fails_with_invalid_bind_addr() {
    let mut map = HashMap::new();
    map.insert("TUBESIG_BIND_ADDR", "not-a-socket-addr");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TUBESIG_BIND_ADDR"),
        "expected InvalidEnvVar(TUBESIG_BIND_ADDR), got: {result:?}"
    );
}

#[test]
fn http_timeout_override() {
    let mut map = HashMap::new();
    map.insert("TUBESIG_HTTP_TIMEOUT_SECS", "60");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.http_timeout_secs, 60);
}

#[test]
fn http_timeout_zero_is_invalid() {
    let mut map = HashMap::new();
    map.insert("TUBESIG_HTTP_TIMEOUT_SECS", "0");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TUBESIG_HTTP_TIMEOUT_SECS"),
        "expected InvalidEnvVar(TUBESIG_HTTP_TIMEOUT_SECS), got: {result:?}"
    );
}

#[test]
fn http_max_retries_invalid() {
    let mut map = HashMap::new();
    map.insert("TUBESIG_HTTP_MAX_RETRIES", "not-a-number");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TUBESIG_HTTP_MAX_RETRIES"),
        "expected InvalidEnvVar(TUBESIG_HTTP_MAX_RETRIES), got: {result:?}"
    );
}

#[test]
fn retry_backoff_override() {
    let mut map = HashMap::new();
    map.insert("TUBESIG_HTTP_RETRY_BACKOFF_BASE_MS", "250");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.http_retry_backoff_base_ms, 250);
}

#[test]
fn llm_models_are_trimmed_and_deduplicated() {
    let mut map = HashMap::new();
    map.insert("TUBESIG_LLM_MODELS", " model-a , model-b,,model-a ");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(cfg.llm_models, vec!["model-a", "model-b"]);
}

#[test]
fn llm_models_blank_is_invalid() {
    let mut map = HashMap::new();
    map.insert("TUBESIG_LLM_MODELS", " , ");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TUBESIG_LLM_MODELS"),
        "expected InvalidEnvVar(TUBESIG_LLM_MODELS), got: {result:?}"
    );
}

#[test]
fn llm_max_tokens_invalid() {
    let mut map = HashMap::new();
    map.insert("TUBESIG_LLM_MAX_TOKENS", "-5");
    let result = build_app_config(lookup_from_map(&map));
    assert!(
        matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "TUBESIG_LLM_MAX_TOKENS"),
        "expected InvalidEnvVar(TUBESIG_LLM_MAX_TOKENS), got: {result:?}"
    );
}

#[test]
fn empty_secrets_count_as_unset() {
    let mut map = HashMap::new();
    map.insert("ANTHROPIC_API_KEY", "   ");
    map.insert("TELEGRAM_BOT_TOKEN", "");
    map.insert("DART_API_KEY", "dart-key");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert!(cfg.anthropic_api_key.is_none());
    assert!(cfg.telegram_bot_token.is_none());
    assert_eq!(cfg.dart_api_key.as_deref(), Some("dart-key"));
}

#[test]
fn debug_output_redacts_secrets() {
    let mut map = HashMap::new();
    map.insert("ANTHROPIC_API_KEY", "sk-ant-super-secret");
    map.insert("TELEGRAM_BOT_TOKEN", "123:telegram-secret");
    map.insert("DART_API_KEY", "dart-secret");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    let rendered = format!("{cfg:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(!rendered.contains("telegram-secret"));
    assert!(!rendered.contains("dart-secret"));
    assert!(rendered.contains("[redacted]"));
}

#[test]
fn data_file_joins_under_data_dir() {
    let mut map = HashMap::new();
    map.insert("TUBESIG_DATA_DIR", "/tmp/tubesig");
    let cfg = build_app_config(lookup_from_map(&map)).unwrap();
    assert_eq!(
        cfg.data_file("signals.json"),
        std::path::PathBuf::from("/tmp/tubesig/signals.json")
    );
}
