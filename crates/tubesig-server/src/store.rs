//! In-memory copy of the signal and review files the server works on.

use std::collections::HashSet;
use std::path::PathBuf;

use tubesig_core::{read_reviews, read_signals, write_reviews, AppConfig, CoreError, Review, ReviewSet, Signal};

pub const SIGNALS_FILE: &str = "signals.json";
pub const REVIEWS_FILE: &str = "reviews.json";
pub const PAGE_FILE: &str = "review.html";

#[derive(Debug, Clone)]
pub struct StorePaths {
    pub signals: PathBuf,
    pub reviews: PathBuf,
    /// Review page served at `/`; `None` when the data directory has none.
    pub page: Option<PathBuf>,
}

impl StorePaths {
    pub fn from_config(config: &AppConfig) -> Self {
        let page = config.data_file(PAGE_FILE);
        Self {
            signals: config.data_file(SIGNALS_FILE),
            reviews: config.data_file(REVIEWS_FILE),
            page: page.exists().then_some(page),
        }
    }
}

#[derive(Debug)]
pub enum SetReviewError {
    UnknownSignal,
    Persist(CoreError),
}

#[derive(Debug)]
pub struct ReviewStore {
    paths: StorePaths,
    signals: Vec<Signal>,
    reviews: ReviewSet,
    review_ids: HashSet<String>,
}

impl ReviewStore {
    /// Reads both files; either one missing counts as empty.
    pub fn load(paths: StorePaths) -> Result<Self, CoreError> {
        let signals = if paths.signals.exists() {
            read_signals(&paths.signals)?
        } else {
            tracing::warn!(path = %paths.signals.display(), "signals file not found; serving none");
            Vec::new()
        };
        let reviews = if paths.reviews.exists() {
            read_reviews(&paths.reviews)?
        } else {
            ReviewSet::new()
        };
        Ok(Self::new(paths, signals, reviews))
    }

    pub fn new(paths: StorePaths, signals: Vec<Signal>, reviews: ReviewSet) -> Self {
        let review_ids = signals.iter().map(Signal::review_id).collect();
        Self {
            paths,
            signals,
            reviews,
            review_ids,
        }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn reviews(&self) -> &ReviewSet {
        &self.reviews
    }

    /// Signals with their current verdicts copied onto them.
    pub fn inlined_signals(&self) -> Vec<Signal> {
        tubesig_pipeline::inline_reviews(self.signals.clone(), &self.reviews)
    }

    /// Stores a verdict and writes the reviews file. The in-memory set only
    /// changes once the write succeeded.
    pub async fn set_review(
        &mut self,
        review_id: &str,
        review: Review,
    ) -> Result<Option<Review>, SetReviewError> {
        if !self.review_ids.contains(review_id) {
            return Err(SetReviewError::UnknownSignal);
        }
        let mut next = self.reviews.clone();
        let previous = next.insert(review_id.to_owned(), review);
        self.reviews = persist(self.paths.reviews.clone(), next)
            .await
            .map_err(SetReviewError::Persist)?;
        Ok(previous)
    }

    /// Removes a verdict; `Ok(None)` when there was none.
    pub async fn remove_review(&mut self, review_id: &str) -> Result<Option<Review>, CoreError> {
        if !self.reviews.contains(review_id) {
            return Ok(None);
        }
        let mut next = self.reviews.clone();
        let removed = next.remove(review_id);
        self.reviews = persist(self.paths.reviews.clone(), next).await?;
        Ok(removed)
    }
}

/// Writes `reviews` on the blocking pool and hands the set back once it is on disk.
async fn persist(path: PathBuf, reviews: ReviewSet) -> Result<ReviewSet, CoreError> {
    let display = path.display().to_string();
    tokio::task::spawn_blocking(move || write_reviews(&path, &reviews).map(|()| reviews))
        .await
        .unwrap_or_else(|e| {
            Err(CoreError::Io {
                path: display,
                source: std::io::Error::other(e),
            })
        })
}

#[cfg(test)]
mod tests {
    use tubesig_core::{ReviewStatus, SignalType};

    use super::*;

    fn paths(dir: &std::path::Path) -> StorePaths {
        StorePaths {
            signals: dir.join(SIGNALS_FILE),
            reviews: dir.join(REVIEWS_FILE),
            page: None,
        }
    }

    #[test]
    fn missing_files_load_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReviewStore::load(paths(dir.path())).unwrap();
        assert_eq!(store.signal_count(), 0);
        assert!(store.reviews().is_empty());
    }

    #[tokio::test]
    async fn set_review_persists_and_rejects_unknown_ids() {
        let dir = tempfile::tempdir().unwrap();
        let signals = vec![Signal::new("v1", "BTC", SignalType::Buy)];
        let mut store = ReviewStore::new(paths(dir.path()), signals, ReviewSet::new());

        assert!(matches!(
            store.set_review("v9_XRP", Review::approved("")).await,
            Err(SetReviewError::UnknownSignal)
        ));

        let previous = store
            .set_review("v1_BTC", Review::rejected("sarcasm"))
            .await
            .unwrap();
        assert!(previous.is_none());

        let on_disk = read_reviews(&dir.path().join(REVIEWS_FILE)).unwrap();
        assert_eq!(on_disk.count(ReviewStatus::Rejected), 1);

        let inlined = store.inlined_signals();
        assert_eq!(inlined[0].review_reason.as_deref(), Some("sarcasm"));
    }

    #[tokio::test]
    async fn remove_review_reports_absent() {
        let dir = tempfile::tempdir().unwrap();
        let signals = vec![Signal::new("v1", "BTC", SignalType::Buy)];
        let reviews: ReviewSet = [("v1_BTC".to_owned(), Review::approved("ok"))].into_iter().collect();
        let mut store = ReviewStore::new(paths(dir.path()), signals, reviews);

        assert_eq!(store.remove_review("v1_BTC").await.unwrap(), Some(Review::approved("ok")));
        assert_eq!(store.remove_review("v1_BTC").await.unwrap(), None);
        assert!(read_reviews(&dir.path().join(REVIEWS_FILE)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_write_leaves_reviews_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the reviews file should be makes the rename fail.
        let blocked = dir.path().join(REVIEWS_FILE);
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), "x").unwrap();

        let signals = vec![Signal::new("v1", "BTC", SignalType::Buy)];
        let mut store = ReviewStore::new(paths(dir.path()), signals, ReviewSet::new());

        let result = store.set_review("v1_BTC", Review::approved("")).await;
        assert!(matches!(result, Err(SetReviewError::Persist(_))));
        assert!(store.reviews().is_empty());
    }
}
