//! Attach upload dates to signals and order them newest first.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tubesig_core::Signal;

/// `video_id → upload_date` lookup.
///
/// Accepts either a plain JSON object or a list of video metadata records
/// (`[{"video_id": .., "upload_date": ..}, ..]`, `id` accepted for `video_id`).
/// Later list entries override earlier ones; null or missing dates are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "UploadDatesRepr")]
pub struct UploadDates(HashMap<String, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum UploadDatesRepr {
    Map(HashMap<String, Option<String>>),
    List(Vec<VideoMeta>),
}

#[derive(Deserialize)]
struct VideoMeta {
    #[serde(alias = "id")]
    video_id: String,
    #[serde(default)]
    upload_date: Option<String>,
}

impl From<UploadDatesRepr> for UploadDates {
    fn from(repr: UploadDatesRepr) -> Self {
        let map = match repr {
            UploadDatesRepr::Map(map) => map
                .into_iter()
                .filter_map(|(id, date)| date.map(|d| (id, d)))
                .collect(),
            UploadDatesRepr::List(videos) => videos
                .into_iter()
                .filter_map(|v| v.upload_date.map(|d| (v.video_id, d)))
                .collect(),
        };
        Self(map)
    }
}

impl UploadDates {
    #[must_use]
    pub fn get(&self, video_id: &str) -> Option<&str> {
        self.0.get(video_id).map(String::as_str)
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

impl FromIterator<(String, String)> for UploadDates {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

static DASHED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));
static COMPACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}$").expect("valid date regex"));

/// Matched dates by shape. Dates are reported, never rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    pub total: usize,
    pub matched: usize,
    pub missing: usize,
    /// `YYYY-MM-DD` dates.
    pub dashed: usize,
    /// `YYYYMMDD` dates.
    pub compact: usize,
    /// Dates in neither form.
    pub non_iso: usize,
}

impl JoinReport {
    /// True when the string sort cannot be trusted: dates of different
    /// shapes compare by their characters (`"20240101" > "2024-12-31"`).
    #[must_use]
    pub fn mixed_formats(&self) -> bool {
        let shapes = [self.dashed, self.compact, self.non_iso];
        shapes.iter().filter(|&&n| n > 0).count() > 1
    }
}

#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub signals: Vec<Signal>,
    pub report: JoinReport,
}

/// Left-join upload dates by `video_id`, then stable-sort newest first.
///
/// Every signal's `upload_date` is overwritten with the lookup result, or the
/// empty string when the video is unknown. Ordering is plain string order, so
/// signals with an empty date end up last and equal dates keep input order.
#[must_use]
pub fn join_upload_dates(mut signals: Vec<Signal>, dates: &UploadDates) -> JoinOutcome {
    let mut report = JoinReport {
        total: signals.len(),
        ..JoinReport::default()
    };

    for signal in &mut signals {
        match dates.get(&signal.video_id) {
            Some(date) => {
                report.matched += 1;
                if DASHED_RE.is_match(date) {
                    report.dashed += 1;
                } else if COMPACT_RE.is_match(date) {
                    report.compact += 1;
                } else {
                    report.non_iso += 1;
                    tracing::warn!(
                        video_id = %signal.video_id,
                        upload_date = date,
                        "upload date is not ISO formatted; string sort may misplace it"
                    );
                }
                signal.upload_date = Some(date.to_string());
            }
            None => {
                report.missing += 1;
                signal.upload_date = Some(String::new());
            }
        }
    }

    signals.sort_by(|a, b| date_of(b).cmp(date_of(a)));

    if report.mixed_formats() {
        tracing::warn!(
            dashed = report.dashed,
            compact = report.compact,
            non_iso = report.non_iso,
            "upload dates mix formats; newest-first order is unreliable"
        );
    }

    tracing::info!(
        total = report.total,
        matched = report.matched,
        missing = report.missing,
        "joined upload dates"
    );

    JoinOutcome { signals, report }
}

fn date_of(signal: &Signal) -> &str {
    signal.upload_date.as_deref().unwrap_or("")
}
