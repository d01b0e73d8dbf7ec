use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub http_timeout_secs: u64,
    pub http_max_retries: u32,
    pub http_retry_backoff_base_ms: u64,
    pub anthropic_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_models: Vec<String>,
    pub llm_max_tokens: u32,
    pub review_server_url: String,
    pub dart_api_key: Option<String>,
    pub disclosure_base_url: String,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub watchlist_path: PathBuf,
}

impl AppConfig {
    /// Resolve a default file name under the data directory.
    #[must_use]
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("data_dir", &self.data_dir)
            .field("bind_addr", &self.bind_addr)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("http_max_retries", &self.http_max_retries)
            .field(
                "http_retry_backoff_base_ms",
                &self.http_retry_backoff_base_ms,
            )
            .field(
                "anthropic_api_key",
                &self.anthropic_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_models", &self.llm_models)
            .field("llm_max_tokens", &self.llm_max_tokens)
            .field("review_server_url", &self.review_server_url)
            .field(
                "dart_api_key",
                &self.dart_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("disclosure_base_url", &self.disclosure_base_url)
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "[redacted]"),
            )
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("watchlist_path", &self.watchlist_path)
            .finish()
    }
}
