//! Client for the DART `OpenAPI` disclosure listing (`list.json`).
//!
//! The API answers HTTP 200 for almost everything and reports the outcome in
//! a `status` field: `"000"` is success, `"013"` means the query matched no
//! filings, anything else is an error.

use chrono::NaiveDate;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::http;
use crate::retry::retry_with_backoff;

const DEFAULT_BASE_URL: &str = "https://opendart.fss.or.kr/api";
const VIEWER_URL: &str = "https://dart.fss.or.kr/dsaf001/main.do?rcpNo=";
const SERVICE: &str = "disclosure";

const STATUS_OK: &str = "000";
const STATUS_NO_DATA: &str = "013";

/// Hard stop for [`DisclosureClient::list_all`].
const MAX_PAGES: u32 = 50;

/// Largest page size the API accepts.
pub const MAX_PAGE_COUNT: u32 = 100;

/// One filing as listed by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    #[serde(default)]
    pub corp_code: String,
    #[serde(default)]
    pub corp_name: String,
    #[serde(default)]
    pub stock_code: String,
    /// Market: `Y` (KOSPI), `K` (KOSDAQ), `N` (KONEX), `E` (other).
    #[serde(default)]
    pub corp_cls: String,
    #[serde(default)]
    pub report_nm: String,
    /// Receipt number, unique per filing.
    #[serde(default)]
    pub rcept_no: String,
    #[serde(default)]
    pub flr_nm: String,
    /// Receipt date, `YYYYMMDD`.
    #[serde(default)]
    pub rcept_dt: String,
    #[serde(default)]
    pub rm: String,
}

impl Disclosure {
    #[must_use]
    pub fn viewer_url(&self) -> String {
        format!("{VIEWER_URL}{}", self.rcept_no)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisclosureQuery {
    /// Start date, `YYYYMMDD`.
    pub bgn_de: String,
    /// End date, `YYYYMMDD`.
    pub end_de: String,
    pub page_no: u32,
    pub page_count: u32,
    pub corp_code: Option<String>,
}

impl DisclosureQuery {
    /// All filings received on `date`, first page, maximum page size.
    #[must_use]
    pub fn for_date(date: NaiveDate) -> Self {
        let day = date.format("%Y%m%d").to_string();
        Self {
            bgn_de: day.clone(),
            end_de: day,
            page_no: 1,
            page_count: MAX_PAGE_COUNT,
            corp_code: None,
        }
    }

    #[must_use]
    pub fn with_corp_code(mut self, corp_code: &str) -> Self {
        self.corp_code = Some(corp_code.to_owned());
        self
    }

    fn page(&self, page_no: u32) -> Self {
        Self {
            page_no,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisclosurePage {
    pub page_no: u32,
    pub total_count: u32,
    pub total_page: u32,
    pub entries: Vec<Disclosure>,
}

#[derive(Deserialize)]
struct ListResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    page_no: u32,
    #[serde(default)]
    total_count: u32,
    #[serde(default)]
    total_page: u32,
    #[serde(default)]
    list: Vec<Disclosure>,
}

pub struct DisclosureClient {
    client: Client,
    api_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for DisclosureClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisclosureClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

impl DisclosureClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
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
        base_url: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: http::build_client(timeout_secs)?,
            api_key: api_key.to_owned(),
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

    /// Fetches one page of filings.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] if the response status is neither `000` nor `013`.
    /// - [`ClientError::Http`] on network failure or a non-2xx HTTP status.
    /// - [`ClientError::Deserialize`] if the body does not match the expected shape.
    pub async fn list(&self, query: &DisclosureQuery) -> Result<DisclosurePage, ClientError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.list_once(query)
        })
        .await
    }

    async fn list_once(&self, query: &DisclosureQuery) -> Result<DisclosurePage, ClientError> {
        let url = self.build_url(query)?;
        // The key travels in the query string; keep it out of error messages.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let body = response
            .error_for_status()
            .map_err(reqwest::Error::without_url)?
            .text()
            .await
            .map_err(reqwest::Error::without_url)?;

        let parsed: ListResponse =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: format!("list.json(bgn_de={}, page_no={})", query.bgn_de, query.page_no),
                source: e,
            })?;

        match parsed.status.as_str() {
            STATUS_OK => Ok(DisclosurePage {
                page_no: parsed.page_no,
                total_count: parsed.total_count,
                total_page: parsed.total_page,
                entries: parsed.list,
            }),
            STATUS_NO_DATA => Ok(DisclosurePage {
                page_no: query.page_no,
                ..DisclosurePage::default()
            }),
            other => Err(ClientError::Api {
                service: SERVICE,
                status: None,
                message: format!("status {other}: {}", parsed.message),
            }),
        }
    }

    /// Fetches every page for `query`, starting at `query.page_no`.
    ///
    /// Stops at `total_page`, at the first empty page, or after 50 pages.
    ///
    /// # Errors
    ///
    /// Any error from [`DisclosureClient::list`]; pages fetched before the
    /// failure are discarded.
    pub async fn list_all(&self, query: &DisclosureQuery) -> Result<Vec<Disclosure>, ClientError> {
        let first_page = query.page_no.max(1);
        let mut entries = Vec::new();

        for page_no in first_page..first_page + MAX_PAGES {
            let page = self.list(&query.page(page_no)).await?;
            let done = page.entries.is_empty() || page_no >= page.total_page;
            entries.extend(page.entries);
            if done {
                break;
            }
            if page_no + 1 == first_page + MAX_PAGES {
                tracing::warn!(
                    total_page = page.total_page,
                    max_pages = MAX_PAGES,
                    "disclosure listing truncated at page cap"
                );
            }
        }

        tracing::info!(count = entries.len(), bgn_de = %query.bgn_de, "fetched disclosures");
        Ok(entries)
    }

    fn build_url(&self, query: &DisclosureQuery) -> Result<Url, ClientError> {
        let mut url = http::join(&self.base_url, "list.json")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("crtfc_key", &self.api_key);
            pairs.append_pair("bgn_de", &query.bgn_de);
            pairs.append_pair("end_de", &query.end_de);
            pairs.append_pair("page_no", &query.page_no.to_string());
            pairs.append_pair("page_count", &query.page_count.to_string());
            if let Some(corp_code) = &query.corp_code {
                pairs.append_pair("corp_code", corp_code);
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_for_date_formats_compact() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let query = DisclosureQuery::for_date(date).with_corp_code("00126380");
        assert_eq!(query.bgn_de, "20250307");
        assert_eq!(query.end_de, "20250307");
        assert_eq!(query.page_no, 1);
        assert_eq!(query.page_count, MAX_PAGE_COUNT);
        assert_eq!(query.corp_code.as_deref(), Some("00126380"));
    }

    #[test]
    fn build_url_encodes_all_params() {
        let client = DisclosureClient::with_base_url("k&y", 5, "http://localhost:1/api").unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let url = client.build_url(&DisclosureQuery::for_date(date)).unwrap();
        assert_eq!(url.path(), "/api/list.json");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("crtfc_key".into(), "k&y".into())));
        assert!(pairs.contains(&("bgn_de".into(), "20250102".into())));
        assert!(!pairs.iter().any(|(k, _)| k == "corp_code"));
    }

    #[test]
    fn viewer_url_uses_receipt_number() {
        let d = Disclosure {
            rcept_no: "20250307000123".into(),
            ..Disclosure::default()
        };
        assert_eq!(
            d.viewer_url(),
            "https://dart.fss.or.kr/dsaf001/main.do?rcpNo=20250307000123"
        );
    }

    #[test]
    fn debug_hides_api_key() {
        let client = DisclosureClient::with_base_url("secret-key", 5, "http://localhost:1").unwrap();
        assert!(!format!("{client:?}").contains("secret-key"));
    }
}
