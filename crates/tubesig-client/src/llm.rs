//! Client for the Anthropic Messages API.
//!
//! Used for three things: plain completions (`tubesig llm ping`), probing
//! which model names the account can use, and asking a model for a review
//! verdict on a single signal.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tubesig_core::{Review, ReviewStatus, Signal};

use crate::error::ClientError;
use crate::http;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const SERVICE: &str = "llm";

/// Token budget for model probes; the reply content is irrelevant.
const PROBE_MAX_TOKENS: u32 = 16;
const PROBE_PROMPT: &str = "Reply with the single word: ok";

pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_tokens: u32,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[redacted]")
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

/// One model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Model name as reported by the API (may be more specific than requested).
    pub model: String,
    /// Concatenated text blocks of the reply.
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub stop_reason: Option<String>,
}

/// Result of trying one candidate model name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelProbe {
    pub model: String,
    /// Model name the API answered with, when the probe succeeded.
    pub resolved: Option<String>,
    pub error: Option<String>,
}

impl ModelProbe {
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.error.is_none()
    }
}

/// First probed model that answered, in probe order.
#[must_use]
pub fn first_available(probes: &[ModelProbe]) -> Option<&str> {
    probes
        .iter()
        .find(|p| p.is_available())
        .map(|p| p.model.as_str())
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl LlmClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64, max_tokens: u32) -> Result<Self, ClientError> {
        Self::with_base_url(api_key, timeout_secs, max_tokens, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ClientError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        max_tokens: u32,
        base_url: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: http::build_client(timeout_secs)?,
            api_key: api_key.to_owned(),
            base_url: http::parse_base_url(base_url)?,
            max_tokens,
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

    /// Sends `prompt` as a single user turn and returns the reply.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] when the API answers with a non-2xx status.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the reply does not match the expected shape.
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<Completion, ClientError> {
        self.complete_with(model, prompt, self.max_tokens).await
    }

    async fn complete_with(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Completion, ClientError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_once(model, prompt, max_tokens)
        })
        .await
    }

    async fn send_once(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Completion, ClientError> {
        let url = http::join(&self.base_url, "v1/messages")?;
        let request = MessagesRequest {
            model,
            max_tokens,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &body));
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: format!("messages(model={model})"),
                source: e,
            })?;

        let text = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        tracing::debug!(
            model = %parsed.model,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "completion received"
        );

        Ok(Completion {
            model: parsed.model,
            text,
            input_tokens: parsed.usage.input_tokens,
            output_tokens: parsed.usage.output_tokens,
            stop_reason: parsed.stop_reason,
        })
    }

    /// Tries each candidate model in order with a minimal prompt.
    ///
    /// Never stops early: every candidate gets a [`ModelProbe`], failed or not.
    pub async fn probe_models(&self, models: &[String]) -> Vec<ModelProbe> {
        let mut probes = Vec::with_capacity(models.len());
        for model in models {
            let probe = match self
                .complete_with(model, PROBE_PROMPT, PROBE_MAX_TOKENS)
                .await
            {
                Ok(completion) => {
                    tracing::info!(model = %model, resolved = %completion.model, "model available");
                    ModelProbe {
                        model: model.clone(),
                        resolved: Some(completion.model),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::info!(model = %model, error = %e, "model unavailable");
                    ModelProbe {
                        model: model.clone(),
                        resolved: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            probes.push(probe);
        }
        probes
    }

    /// Asks `model` whether `signal` is a genuine trading call.
    ///
    /// # Errors
    ///
    /// Any error from [`LlmClient::complete`], or
    /// [`ClientError::InvalidVerdict`] when the reply holds no verdict object.
    pub async fn review_signal(&self, model: &str, signal: &Signal) -> Result<Review, ClientError> {
        let prompt = review_prompt(signal);
        let completion = self.complete(model, &prompt).await?;
        parse_verdict(&completion.text)
    }
}

fn api_error(status: u16, body: &str) -> ClientError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => format!("{}: {}", envelope.error.kind, envelope.error.message),
        Err(_) => http::excerpt(body),
    };
    ClientError::Api {
        service: SERVICE,
        status: Some(status),
        message,
    }
}

fn review_prompt(signal: &Signal) -> String {
    let title = signal
        .title
        .as_deref()
        .map(|t| format!("Video title: {t}\n"))
        .unwrap_or_default();
    let context = signal
        .context
        .as_deref()
        .map(|c| format!("Context: {c}\n"))
        .unwrap_or_default();

    format!(
        "You are checking trading signals extracted from YouTube video transcripts.\n\
         Decide whether the quote really expresses the stated call on the stated asset.\n\
         Reject sarcasm, hypotheticals, quotes of other people, and calls on a different asset.\n\n\
         Asset: {asset}\n\
         Signal type: {signal_type}\n\
         {title}\
         Quote: {content}\n\
         {context}\n\
         Answer with one JSON object and nothing else: \
         {{\"status\": \"approved\" or \"rejected\", \"reason\": \"<one sentence>\"}}",
        asset = signal.asset,
        signal_type = signal.signal_type,
        content = signal.content,
    )
}

#[derive(Deserialize)]
struct Verdict {
    status: ReviewStatus,
    #[serde(default)]
    reason: String,
}

/// Extracts the first JSON object from a model reply and reads it as a verdict.
///
/// Text around the object (prose, code fences) is ignored.
///
/// # Errors
///
/// Returns [`ClientError::InvalidVerdict`] when no JSON object is found or
/// the first one lacks a valid `status`.
pub fn parse_verdict(text: &str) -> Result<Review, ClientError> {
    let object = text
        .match_indices('{')
        .find_map(|(start, _)| {
            serde_json::Deserializer::from_str(&text[start..])
                .into_iter::<serde_json::Value>()
                .next()
                .and_then(Result::ok)
                .filter(serde_json::Value::is_object)
        })
        .ok_or_else(|| ClientError::InvalidVerdict(http::excerpt(text)))?;

    let verdict: Verdict = serde_json::from_value(object)
        .map_err(|e| ClientError::InvalidVerdict(format!("{e}: {}", http::excerpt(text))))?;

    Ok(Review {
        status: verdict.status,
        reason: verdict.reason,
    })
}
