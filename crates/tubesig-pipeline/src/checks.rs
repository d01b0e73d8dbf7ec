//! Pre-publish checks for values the review page splices into markup and
//! inline handlers (`onclick="review('<id>')"` and the like).
//!
//! Problems are reported, never rewritten: fixing them silently would change
//! review ids that existing verdicts are keyed by.

use std::collections::HashSet;
use std::fmt;

use tubesig_core::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IssueKind {
    SingleQuote,
    DoubleQuote,
    Backslash,
    ScriptClose,
    Newline,
    /// The asset contains `_`, so the dedup key string is ambiguous.
    DelimiterInAsset,
    /// An earlier signal has the same review id; one verdict would cover both.
    DuplicateReviewId,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::SingleQuote => "single quote",
            IssueKind::DoubleQuote => "double quote",
            IssueKind::Backslash => "backslash",
            IssueKind::ScriptClose => "</script> sequence",
            IssueKind::Newline => "line break",
            IssueKind::DelimiterInAsset => "'_' in asset (ambiguous dedup key)",
            IssueKind::DuplicateReviewId => "review id shared with an earlier signal",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub review_id: String,
    pub field: &'static str,
    pub kind: IssueKind,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.review_id, self.field, self.kind)
    }
}

fn text_issues(value: &str) -> Vec<IssueKind> {
    let mut kinds = Vec::new();
    if value.contains('\'') {
        kinds.push(IssueKind::SingleQuote);
    }
    if value.contains('"') {
        kinds.push(IssueKind::DoubleQuote);
    }
    if value.contains('\\') {
        kinds.push(IssueKind::Backslash);
    }
    if value.to_ascii_lowercase().contains("</script") {
        kinds.push(IssueKind::ScriptClose);
    }
    if value.contains(['\n', '\r', '\u{2028}', '\u{2029}']) {
        kinds.push(IssueKind::Newline);
    }
    kinds
}

/// Scan signals for values that would break string concatenation in the
/// review page, in signal order.
#[must_use]
pub fn check_signals(signals: &[Signal]) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut review_ids: HashSet<String> = HashSet::new();

    for signal in signals {
        let review_id = signal.review_id();

        let fields: [(&'static str, Option<&str>); 4] = [
            ("review_id", Some(review_id.as_str())),
            ("video_id", Some(signal.video_id.as_str())),
            ("asset", Some(signal.asset.as_str())),
            ("title", signal.title.as_deref()),
        ];
        for (field, value) in fields {
            let Some(value) = value else { continue };
            for kind in text_issues(value) {
                issues.push(Issue {
                    review_id: review_id.clone(),
                    field,
                    kind,
                });
            }
        }

        if signal.asset.contains('_') {
            issues.push(Issue {
                review_id: review_id.clone(),
                field: "asset",
                kind: IssueKind::DelimiterInAsset,
            });
        }

        if !review_ids.insert(review_id.clone()) {
            issues.push(Issue {
                review_id,
                field: "review_id",
                kind: IssueKind::DuplicateReviewId,
            });
        }
    }

    if !issues.is_empty() {
        tracing::warn!(count = issues.len(), "signal data issues found");
    }
    issues
}
