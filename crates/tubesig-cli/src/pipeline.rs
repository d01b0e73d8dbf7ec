//! `dedup` and `dates` command handlers.

use std::path::Path;

use anyhow::Context;
use tubesig_pipeline::{dedup_signals, join_upload_dates, UploadDates};

pub(crate) fn run_dedup(input: &Path, output: &Path, dry_run: bool) -> anyhow::Result<()> {
    let signals = tubesig_core::read_signals(input)?;
    let outcome = dedup_signals(signals);
    let report = &outcome.report;

    println!(
        "{} signals -> {} ({} groups merged)",
        report.input, report.output, report.merged_groups
    );
    for (signal_type, count) in &report.by_type {
        println!("  {:<12} {count}", signal_type.as_str());
    }

    if dry_run {
        println!("dry-run: would write {}", output.display());
        return Ok(());
    }
    tubesig_core::write_signals(output, &outcome.signals)?;
    println!("wrote {}", output.display());
    Ok(())
}

pub(crate) fn run_dates(
    signals: &Path,
    dates: &Path,
    output: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let records = tubesig_core::read_signals(signals)?;
    let lookup: UploadDates = tubesig_core::read_json(dates)
        .with_context(|| format!("loading upload dates from {}", dates.display()))?;
    if lookup.is_empty() {
        tracing::warn!(path = %dates.display(), "upload-date lookup is empty");
    }

    let outcome = join_upload_dates(records, &lookup);
    let report = &outcome.report;
    println!(
        "{} signals: {} dated, {} without a date",
        report.total, report.matched, report.missing
    );
    if report.non_iso > 0 {
        println!(
            "warning: {} dates are not YYYY-MM-DD / YYYYMMDD and may sort out of place",
            report.non_iso
        );
    }
    if report.mixed_formats() {
        println!(
            "warning: dates mix formats ({} YYYY-MM-DD, {} YYYYMMDD, {} other); newest-first order is unreliable",
            report.dashed, report.compact, report.non_iso
        );
    }

    if dry_run {
        println!("dry-run: would write {}", output.display());
        return Ok(());
    }
    tubesig_core::write_signals(output, &outcome.signals)?;
    println!("wrote {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use tubesig_core::{Confidence, Signal, SignalType};

    use super::*;

    #[test]
    fn dedup_then_dates_writes_sorted_output() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.json");
        let dedup = dir.path().join("dedup.json");
        let dates = dir.path().join("dates.json");
        let out = dir.path().join("signals.json");

        let signals = vec![
            Signal::new("v1", "BTC", SignalType::Buy).with_content("short"),
            Signal::new("v1", "BTC", SignalType::Buy)
                .with_content("longer")
                .with_confidence(Confidence::High),
            Signal::new("v2", "ETH", SignalType::Sell),
        ];
        tubesig_core::write_signals(&raw, &signals).unwrap();
        std::fs::write(&dates, r#"{"v1": "2024-01-01", "v2": "2024-02-01"}"#).unwrap();

        run_dedup(&raw, &dedup, false).unwrap();
        run_dates(&dedup, &dates, &out, false).unwrap();

        let written = tubesig_core::read_signals(&out).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].asset, "ETH");
        assert_eq!(written[1].merged_count, Some(2));
        assert_eq!(written[1].content, "longer");
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("raw.json");
        let out = dir.path().join("out.json");
        tubesig_core::write_signals(&raw, &[Signal::new("v", "A", SignalType::Hold)]).unwrap();

        run_dedup(&raw, &out, true).unwrap();
        assert!(!out.exists());
    }
}
