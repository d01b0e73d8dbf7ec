//! Filter new disclosures against the watchlist and forward them to a chat.

use std::collections::BTreeSet;
use std::future::Future;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tubesig_core::{read_json, write_json, CoreError, Watchlist};

use crate::disclosure::Disclosure;
use crate::error::ClientError;

/// Destination for forwarded messages.
pub trait MessageSink {
    fn send(&self, text: &str) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// `true` when `disclosure` should be forwarded under `watchlist`.
///
/// An empty watchlist matches everything. Otherwise a filing matches when its
/// `corp_code` is listed or a keyword occurs (case-insensitively) in its
/// company or report name; any `exclude` keyword found there vetoes it.
#[must_use]
pub fn matches_watchlist(disclosure: &Disclosure, watchlist: &Watchlist) -> bool {
    let haystack = format!("{} {}", disclosure.corp_name, disclosure.report_nm).to_lowercase();
    let contains = |needle: &String| haystack.contains(&needle.to_lowercase());

    if watchlist.exclude.iter().any(contains) {
        return false;
    }
    if watchlist.is_empty() {
        return true;
    }
    watchlist
        .corp_codes
        .iter()
        .any(|code| code == &disclosure.corp_code)
        || watchlist.keywords.iter().any(contains)
}

/// Chat message text for one filing.
#[must_use]
pub fn format_disclosure(disclosure: &Disclosure) -> String {
    let stock = if disclosure.stock_code.is_empty() {
        String::new()
    } else {
        format!(" ({})", disclosure.stock_code)
    };
    let remark = if disclosure.rm.trim().is_empty() {
        String::new()
    } else {
        format!(" [{}]", disclosure.rm.trim())
    };
    format!(
        "📢 {corp}{stock}\n{report}{remark}\nFiler: {filer}\nReceived: {date}\n{url}",
        corp = disclosure.corp_name,
        report = disclosure.report_nm.trim(),
        filer = disclosure.flr_nm,
        date = format_receipt_date(&disclosure.rcept_dt),
        url = disclosure.viewer_url(),
    )
}

/// `20250307` → `2025-03-07`; anything else is shown as is.
fn format_receipt_date(raw: &str) -> String {
    if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &raw[..4], &raw[4..6], &raw[6..])
    } else {
        raw.to_owned()
    }
}

/// Receipt numbers already forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenSet(BTreeSet<String>);

impl SeenSet {
    /// Loads the set from `path`; a missing file is an empty set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no seen-set file yet, starting empty");
            return Ok(Self::default());
        }
        read_json(path)
    }

    /// # Errors
    ///
    /// Returns [`CoreError`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        write_json(path, self)
    }

    #[must_use]
    pub fn contains(&self, rcept_no: &str) -> bool {
        self.0.contains(rcept_no)
    }

    /// Returns `false` if the receipt number was already present.
    pub fn insert(&mut self, rcept_no: &str) -> bool {
        self.0.insert(rcept_no.to_owned())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardReport {
    pub fetched: usize,
    pub matched: usize,
    pub sent: usize,
    pub skipped_seen: usize,
    pub failed: usize,
}

/// Sends every matching, not-yet-seen disclosure to `sink`, in input order.
///
/// Successfully sent filings are added to `seen`; failed ones are logged,
/// counted and left out so the next poll retries them.
pub async fn forward_new<S: MessageSink>(
    disclosures: &[Disclosure],
    watchlist: &Watchlist,
    seen: &mut SeenSet,
    sink: &S,
) -> ForwardReport {
    let mut report = ForwardReport {
        fetched: disclosures.len(),
        ..ForwardReport::default()
    };

    for disclosure in disclosures {
        if !matches_watchlist(disclosure, watchlist) {
            continue;
        }
        report.matched += 1;

        if seen.contains(&disclosure.rcept_no) {
            report.skipped_seen += 1;
            continue;
        }

        match sink.send(&format_disclosure(disclosure)).await {
            Ok(()) => {
                seen.insert(&disclosure.rcept_no);
                report.sent += 1;
            }
            Err(e) => {
                report.failed += 1;
                tracing::warn!(
                    rcept_no = %disclosure.rcept_no,
                    corp_name = %disclosure.corp_name,
                    error = %e,
                    "failed to forward disclosure"
                );
            }
        }
    }

    tracing::info!(
        fetched = report.fetched,
        matched = report.matched,
        sent = report.sent,
        skipped_seen = report.skipped_seen,
        failed = report.failed,
        "forwarding pass finished"
    );
    report
}
