//! Joining review verdicts onto signals.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use tubesig_core::{Review, ReviewSet, ReviewStatus, Signal, SignalType};

#[derive(Debug, Clone, PartialEq)]
pub struct RejectedSignal {
    pub signal: Signal,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RejectedReport {
    /// Rejected signals in signal-file order.
    pub rejected: Vec<RejectedSignal>,
    /// Review ids with no matching signal.
    pub orphans: Vec<String>,
}

/// Signals whose verdict is `rejected`, plus reviews that point nowhere.
#[must_use]
pub fn rejected(signals: &[Signal], reviews: &ReviewSet) -> RejectedReport {
    let rejected = signals
        .iter()
        .filter_map(|signal| match reviews.get(&signal.review_id()) {
            Some(Review {
                status: ReviewStatus::Rejected,
                reason,
            }) => Some(RejectedSignal {
                signal: signal.clone(),
                reason: reason.clone(),
            }),
            _ => None,
        })
        .collect();

    RejectedReport {
        rejected,
        orphans: orphan_ids(signals, reviews),
    }
}

fn orphan_ids(signals: &[Signal], reviews: &ReviewSet) -> Vec<String> {
    let known: HashSet<String> = signals.iter().map(Signal::review_id).collect();
    reviews
        .iter()
        .filter(|(id, _)| !known.contains(id.as_str()))
        .map(|(id, _)| id.clone())
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub approved: usize,
    pub rejected: usize,
    pub unreviewed: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewSummary {
    pub total_signals: usize,
    pub approved: usize,
    pub rejected: usize,
    pub unreviewed: usize,
    pub orphans: usize,
    pub by_type: BTreeMap<SignalType, StatusCounts>,
    /// `(review_id, reason)` for every rejected signal.
    pub rejections: Vec<(String, String)>,
}

impl ReviewSummary {
    #[must_use]
    pub fn reviewed(&self) -> usize {
        self.approved + self.rejected
    }

    /// Share of reviewed signals that were approved, `None` before any review.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn approval_rate(&self) -> Option<f64> {
        let reviewed = self.reviewed();
        (reviewed > 0).then(|| self.approved as f64 / reviewed as f64)
    }
}

impl fmt::Display for ReviewSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "signals:    {}", self.total_signals)?;
        writeln!(f, "reviewed:   {}", self.reviewed())?;
        writeln!(f, "  approved: {}", self.approved)?;
        writeln!(f, "  rejected: {}", self.rejected)?;
        writeln!(f, "unreviewed: {}", self.unreviewed)?;
        if self.orphans > 0 {
            writeln!(f, "orphan reviews (no matching signal): {}", self.orphans)?;
        }
        if let Some(rate) = self.approval_rate() {
            writeln!(f, "approval rate: {:.1}%", rate * 100.0)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{:<13}{:>10}{:>10}{:>12}",
            "TYPE", "APPROVED", "REJECTED", "UNREVIEWED"
        )?;
        for (signal_type, counts) in &self.by_type {
            writeln!(
                f,
                "{:<13}{:>10}{:>10}{:>12}",
                signal_type.as_str(),
                counts.approved,
                counts.rejected,
                counts.unreviewed
            )?;
        }

        if !self.rejections.is_empty() {
            writeln!(f)?;
            writeln!(f, "rejections:")?;
            for (id, reason) in &self.rejections {
                writeln!(f, "  {id}: {reason}")?;
            }
        }
        Ok(())
    }
}

/// Tally verdicts overall and per signal type.
#[must_use]
pub fn summarize(signals: &[Signal], reviews: &ReviewSet) -> ReviewSummary {
    let mut summary = ReviewSummary {
        total_signals: signals.len(),
        orphans: orphan_ids(signals, reviews).len(),
        ..ReviewSummary::default()
    };

    for signal in signals {
        let review_id = signal.review_id();
        let counts = summary.by_type.entry(signal.signal_type.clone()).or_default();
        match reviews.get(&review_id) {
            Some(review) if review.status == ReviewStatus::Approved => {
                counts.approved += 1;
                summary.approved += 1;
            }
            Some(review) => {
                counts.rejected += 1;
                summary.rejected += 1;
                summary.rejections.push((review_id, review.reason.clone()));
            }
            None => {
                counts.unreviewed += 1;
                summary.unreviewed += 1;
            }
        }
    }

    summary
}

/// Copy each verdict onto its signal's `review_status` / `review_reason`.
///
/// Signals without a verdict have both fields cleared, so re-running after a
/// verdict was withdrawn does not leave stale values behind.
#[must_use]
pub fn inline_reviews(mut signals: Vec<Signal>, reviews: &ReviewSet) -> Vec<Signal> {
    for signal in &mut signals {
        match reviews.get(&signal.review_id()) {
            Some(review) => {
                signal.review_status = Some(review.status);
                signal.review_reason = Some(review.reason.clone());
            }
            None => {
                signal.review_status = None;
                signal.review_reason = None;
            }
        }
    }
    signals
}

/// The publishable set: rejected signals removed, unreviewed ones kept only
/// when `keep_unreviewed` is set.
#[must_use]
pub fn final_signals(signals: Vec<Signal>, reviews: &ReviewSet, keep_unreviewed: bool) -> Vec<Signal> {
    signals
        .into_iter()
        .filter(|signal| match reviews.get(&signal.review_id()) {
            Some(review) => review.status == ReviewStatus::Approved,
            None => keep_unreviewed,
        })
        .collect()
}
