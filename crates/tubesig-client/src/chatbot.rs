//! Telegram Bot API client for forwarding messages to a chat.
//!
//! The bot token is part of every request path, so request URLs are stripped
//! from errors and the token is never logged.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::forward::MessageSink;
use crate::http;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://api.telegram.org";
const SERVICE: &str = "chatbot";

/// Longest message text the Bot API accepts.
pub const MAX_MESSAGE_CHARS: usize = 4096;

pub type MessageId = i64;

pub struct ChatBotClient {
    client: Client,
    token: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for ChatBotClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatBotClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &"[redacted]")
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct BotResponse {
    ok: bool,
    #[serde(default)]
    result: Option<SentMessage>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: MessageId,
}

/// Cuts `text` to at most [`MAX_MESSAGE_CHARS`] characters, ending with `…`
/// when anything was dropped.
#[must_use]
pub fn truncate_message(text: &str) -> String {
    match text.char_indices().nth(MAX_MESSAGE_CHARS) {
        None => text.to_owned(),
        Some(_) => {
            let keep = text
                .char_indices()
                .nth(MAX_MESSAGE_CHARS - 1)
                .map_or(text.len(), |(idx, _)| idx);
            format!("{}…", &text[..keep])
        }
    }
}

impl ChatBotClient {
    /// Creates a client pointed at the production Bot API.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(token: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        Self::with_base_url(token, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ClientError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        token: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: http::build_client(timeout_secs)?,
            token: token.to_owned(),
            base_url: http::parse_base_url(base_url)?,
            max_retries: 3,
            backoff_base_ms: 1_000,
        })
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Binds the client to one chat so it can act as a [`MessageSink`].
    #[must_use]
    pub fn for_chat(&self, chat_id: &str) -> ChatSink<'_> {
        ChatSink {
            client: self,
            chat_id: chat_id.to_owned(),
        }
    }

    /// Sends `text` to `chat_id` and returns the new message's id.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] when the Bot API answers `ok: false`.
    /// - [`ClientError::Http`] on network failure (URL stripped).
    /// - [`ClientError::Deserialize`] if the body does not match the expected shape.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<MessageId, ClientError> {
        let text = truncate_message(text);
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_once(chat_id, &text)
        })
        .await
    }

    async fn send_once(&self, chat_id: &str, text: &str) -> Result<MessageId, ClientError> {
        // `./` keeps the `bot<id>:<secret>` segment from parsing as a URL scheme.
        let url = http::join(&self.base_url, &format!("./bot{}/sendMessage", self.token))?;
        let request = SendMessageRequest {
            chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;

        let parsed: BotResponse = serde_json::from_str(&body).map_err(|e| {
            // Gateways in front of the Bot API answer 5xx with HTML.
            if status >= 500 {
                ClientError::Api {
                    service: SERVICE,
                    status: Some(status),
                    message: http::excerpt(&body),
                }
            } else {
                ClientError::Deserialize {
                    context: format!("sendMessage (HTTP {status})"),
                    source: e,
                }
            }
        })?;

        match parsed {
            BotResponse {
                ok: true,
                result: Some(sent),
                ..
            } => {
                tracing::debug!(chat_id, message_id = sent.message_id, "message sent");
                Ok(sent.message_id)
            }
            BotResponse {
                ok, description, error_code, ..
            } => Err(ClientError::Api {
                service: SERVICE,
                status: error_code.or(Some(status)),
                message: description.unwrap_or_else(|| {
                    if ok {
                        "response without result".to_owned()
                    } else {
                        "request rejected".to_owned()
                    }
                }),
            }),
        }
    }
}

/// A [`ChatBotClient`] bound to one chat id.
#[derive(Debug)]
pub struct ChatSink<'a> {
    client: &'a ChatBotClient,
    chat_id: String,
}

impl MessageSink for ChatSink<'_> {
    async fn send(&self, text: &str) -> Result<(), ClientError> {
        self.client.send_message(&self.chat_id, text).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_message("hello"), "hello");
        let exact = "a".repeat(MAX_MESSAGE_CHARS);
        assert_eq!(truncate_message(&exact), exact);
    }

    #[test]
    fn long_text_is_cut_on_char_boundary() {
        let long = "공시".repeat(MAX_MESSAGE_CHARS);
        let cut = truncate_message(&long);
        assert_eq!(cut.chars().count(), MAX_MESSAGE_CHARS);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn debug_hides_token() {
        let client = ChatBotClient::with_base_url("123:secret", 5, "http://localhost:1").unwrap();
        assert!(!format!("{client:?}").contains("secret"));
    }
}
