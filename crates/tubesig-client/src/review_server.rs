//! Client for the local review server's analysis endpoint.

use reqwest::{Client, Url};
use serde::Deserialize;
use tubesig_core::ReviewSet;

use crate::error::ClientError;
use crate::http;

#[derive(Debug)]
pub struct ReviewServerClient {
    client: Client,
    base_url: Url,
}

/// The endpoint has answered both bare and wrapped in the server's
/// `{data, meta}` envelope.
#[derive(Deserialize)]
#[serde(untagged)]
enum AnalysisBody {
    Envelope { data: ReviewSet },
    Bare(ReviewSet),
}

impl ReviewServerClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ClientError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        Ok(Self {
            client: http::build_client(timeout_secs)?,
            base_url: http::parse_base_url(base_url)?,
        })
    }

    /// Fetches the current review verdicts from `GET /api/opus4-analysis`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure or a non-2xx status.
    /// - [`ClientError::Deserialize`] if the body is not a review map.
    pub async fn fetch_analysis(&self) -> Result<ReviewSet, ClientError> {
        let url = http::join(&self.base_url, "api/opus4-analysis")?;
        let response = self.client.get(url.clone()).send().await?;
        let body = response.error_for_status()?.text().await?;

        let parsed: AnalysisBody =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        let reviews = match parsed {
            AnalysisBody::Envelope { data } | AnalysisBody::Bare(data) => data,
        };
        tracing::info!(count = reviews.len(), "fetched reviews from review server");
        Ok(reviews)
    }

    /// `true` when `GET /api/health` answers with a 2xx status.
    pub async fn health(&self) -> bool {
        let Ok(url) = http::join(&self.base_url, "api/health") else {
            return false;
        };
        match self.client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "review server health check failed");
                false
            }
        }
    }
}
