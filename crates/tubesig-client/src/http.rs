use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::ClientError;

const USER_AGENT: &str = concat!("tubesig/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body carried into [`ClientError::Api`].
const MAX_ERROR_BODY: usize = 300;

pub(crate) fn build_client(timeout_secs: u64) -> Result<Client, ClientError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(USER_AGENT)
        .build()?)
}

/// Parses `base_url`, normalised to end with exactly one slash so that
/// [`Url::join`] appends to the path instead of replacing its last segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, ClientError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

pub(crate) fn join(base: &Url, path: &str) -> Result<Url, ClientError> {
    base.join(path).map_err(|e| ClientError::InvalidBaseUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })
}

/// Cuts an error body down to something fit for a log line.
pub(crate) fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_owned(),
    }
}
