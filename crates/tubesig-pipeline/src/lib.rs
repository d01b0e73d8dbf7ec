//! Offline transformations over signal and review files.
//!
//! Each module backs one step of the batch sequence: dedup, upload-date
//! join, review filtering, splicing data into the review page, and the
//! pre-publish data checks. Nothing here touches the network or the disk;
//! callers read and write files through `tubesig_core::io`.

pub mod checks;
pub mod dates;
pub mod dedup;
pub mod error;
pub mod html;
pub mod review;

pub use checks::{check_signals, Issue, IssueKind};
pub use dates::{join_upload_dates, JoinOutcome, JoinReport, UploadDates};
pub use dedup::{dedup_signals, DedupOutcome, DedupReport};
pub use error::HtmlError;
pub use html::{analyze, inject_data_script, replace_data_blob, HtmlReport};
pub use review::{
    final_signals, inline_reviews, rejected, summarize, RejectedReport, RejectedSignal,
    ReviewSummary, StatusCounts,
};
