//! The signal record extracted from a video transcript.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::review::ReviewStatus;

/// The eight categorical calls a signal can carry, from most bullish to most
/// bearish.
///
/// Extraction output is not schema-checked, so any other string is kept as
/// [`SignalType::Other`] and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignalType {
    StrongBuy,
    Buy,
    Positive,
    Hold,
    Neutral,
    Concern,
    Sell,
    StrongSell,
    Other(String),
}

impl SignalType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SignalType::StrongBuy => "STRONG_BUY",
            SignalType::Buy => "BUY",
            SignalType::Positive => "POSITIVE",
            SignalType::Hold => "HOLD",
            SignalType::Neutral => "NEUTRAL",
            SignalType::Concern => "CONCERN",
            SignalType::Sell => "SELL",
            SignalType::StrongSell => "STRONG_SELL",
            SignalType::Other(raw) => raw,
        }
    }
}

impl From<String> for SignalType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "STRONG_BUY" => SignalType::StrongBuy,
            "BUY" => SignalType::Buy,
            "POSITIVE" => SignalType::Positive,
            "HOLD" => SignalType::Hold,
            "NEUTRAL" => SignalType::Neutral,
            "CONCERN" => SignalType::Concern,
            "SELL" => SignalType::Sell,
            "STRONG_SELL" => SignalType::StrongSell,
            _ => SignalType::Other(raw),
        }
    }
}

impl From<SignalType> for String {
    fn from(signal_type: SignalType) -> Self {
        match signal_type {
            SignalType::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extractor's confidence. Only `HIGH` matters for ranking; unexpected
/// values are kept verbatim as [`Confidence::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Confidence {
    Low,
    Medium,
    High,
    Other(String),
}

impl From<String> for Confidence {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "LOW" => Confidence::Low,
            "MEDIUM" => Confidence::Medium,
            "HIGH" => Confidence::High,
            _ => Confidence::Other(raw),
        }
    }
}

impl From<Confidence> for String {
    fn from(confidence: Confidence) -> Self {
        match confidence {
            Confidence::Low => "LOW".to_owned(),
            Confidence::Medium => "MEDIUM".to_owned(),
            Confidence::High => "HIGH".to_owned(),
            Confidence::Other(raw) => raw,
        }
    }
}

/// One extracted claim that a video recommends buying, selling or holding an asset.
///
/// Keys this crate does not know about are kept in `extra` and written back
/// unchanged, so older or richer extraction files survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub video_id: String,
    pub asset: String,
    pub signal_type: SignalType,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_status: Option<ReviewStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Signal {
    #[must_use]
    pub fn new(video_id: &str, asset: &str, signal_type: SignalType) -> Self {
        Self {
            id: None,
            video_id: video_id.to_string(),
            asset: asset.to_string(),
            signal_type,
            content: String::new(),
            context: None,
            title: None,
            confidence: None,
            timestamp: None,
            timestamp_seconds: None,
            upload_date: None,
            merged_count: None,
            review_status: None,
            review_reason: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: &str) -> Self {
        self.content = content.to_string();
        self
    }

    #[must_use]
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Composite `video_id + "_" + asset` string records are merged on.
    ///
    /// Not injective: `("a_b", "c")` and `("a", "b_c")` render the same and
    /// are treated as one call.
    #[must_use]
    pub fn dedup_key(&self) -> String {
        format!("{}_{}", self.video_id, self.asset)
    }

    /// Key under which reviews for this signal are stored.
    #[must_use]
    pub fn review_id(&self) -> String {
        self.id.clone().unwrap_or_else(|| self.dedup_key())
    }

    #[must_use]
    pub fn is_high_confidence(&self) -> bool {
        self.confidence == Some(Confidence::High)
    }

    /// Content length in characters, not bytes.
    #[must_use]
    pub fn content_len(&self) -> usize {
        self.content.chars().count()
    }
}
