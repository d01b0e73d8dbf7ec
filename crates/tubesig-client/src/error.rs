use thiserror::Error;

/// Errors returned by the HTTP clients in this crate.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure, or a non-2xx status surfaced by `reqwest`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote service answered but reported a failure in its body.
    #[error("{service} API error: {message}")]
    Api {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The model reply did not contain a usable review verdict.
    #[error("model reply is not a valid verdict: {0}")]
    InvalidVerdict(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ClientError {
    /// Returns `true` for errors that are worth retrying after a back-off delay.
    ///
    /// Network timeouts, connection failures, 5xx responses, 429 (rate
    /// limited) and 529 (provider overloaded) are retriable. Everything else
    /// is returned to the caller immediately.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            ClientError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| is_retriable_status(s.as_u16()))
            }
            ClientError::Api {
                status: Some(status),
                ..
            } => is_retriable_status(*status),
            ClientError::Api { status: None, .. }
            | ClientError::Deserialize { .. }
            | ClientError::InvalidVerdict(_)
            | ClientError::InvalidBaseUrl { .. } => false,
        }
    }
}

fn is_retriable_status(status: u16) -> bool {
    status == 429 || status == 529 || (500..600).contains(&status)
}
