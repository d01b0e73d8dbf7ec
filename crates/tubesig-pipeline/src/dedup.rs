//! Merge repeated extractions of the same call.
//!
//! Transcripts are often chunked and re-processed, so one video can yield
//! several records for the same asset. Records are grouped by their dedup
//! key (`video_id + "_" + asset`) and one representative survives per group,
//! so every output record has its own review id.

use std::collections::{BTreeMap, HashMap};

use tubesig_core::{Signal, SignalType};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub input: usize,
    pub output: usize,
    /// Groups that had more than one member.
    pub merged_groups: usize,
    /// Output records per signal type.
    pub by_type: BTreeMap<SignalType, usize>,
}

#[derive(Debug, Clone)]
pub struct DedupOutcome {
    pub signals: Vec<Signal>,
    pub report: DedupReport,
}

struct Group {
    best: Signal,
    merged: usize,
    members: usize,
}

/// Ranking used to pick a group's representative: HIGH confidence first,
/// then the longest content.
fn rank(signal: &Signal) -> (bool, usize) {
    (signal.is_high_confidence(), signal.content_len())
}

/// Collapse records sharing a [`Signal::dedup_key`] into one.
///
/// The key string is what reviews are stored under, so pairs that render to
/// the same key (`("a_b", "c")` and `("a", "b_c")`) are merged as well.
///
/// The representative is the member with the greatest [`rank`]; on an exact
/// tie the earliest one in input order wins. Its `merged_count` becomes the
/// sum of the members' own `merged_count` (absent counts as one), which is the
/// group size for raw input and leaves already-merged output unchanged.
///
/// Output keeps the order in which each group was first seen.
#[must_use]
pub fn dedup_signals(signals: Vec<Signal>) -> DedupOutcome {
    let input = signals.len();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Group> = Vec::new();

    for signal in signals {
        let weight = signal.merged_count.unwrap_or(1).max(1);
        let key = signal.dedup_key();

        if let Some(&i) = index.get(&key) {
            let group = &mut groups[i];
            if group.best.video_id != signal.video_id {
                tracing::warn!(
                    dedup_key = %key,
                    first = %group.best.video_id,
                    other = %signal.video_id,
                    "different (video_id, asset) pairs share a dedup key; merging them"
                );
            }
            group.merged = group.merged.saturating_add(weight);
            group.members += 1;
            if rank(&signal) > rank(&group.best) {
                group.best = signal;
            }
        } else {
            index.insert(key, groups.len());
            groups.push(Group {
                best: signal,
                merged: weight,
                members: 1,
            });
        }
    }

    let merged_groups = groups.iter().filter(|g| g.members > 1).count();
    let mut by_type: BTreeMap<SignalType, usize> = BTreeMap::new();

    let signals: Vec<Signal> = groups
        .into_iter()
        .map(|group| {
            let mut best = group.best;
            best.merged_count = Some(group.merged);
            *by_type.entry(best.signal_type.clone()).or_default() += 1;
            best
        })
        .collect();

    tracing::info!(
        input,
        output = signals.len(),
        merged_groups,
        "deduplicated signals"
    );

    DedupOutcome {
        report: DedupReport {
            input,
            output: signals.len(),
            merged_groups,
            by_type,
        },
        signals,
    }
}
