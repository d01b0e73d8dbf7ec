//! Review verdicts keyed by signal review id.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Approved,
    Rejected,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewStatus::Approved => write!(f, "approved"),
            ReviewStatus::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub status: ReviewStatus,
    #[serde(default)]
    pub reason: String,
}

impl Review {
    #[must_use]
    pub fn approved(reason: &str) -> Self {
        Self {
            status: ReviewStatus::Approved,
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn rejected(reason: &str) -> Self {
        Self {
            status: ReviewStatus::Rejected,
            reason: reason.to_string(),
        }
    }
}

/// Review id → verdict, serialized as a plain JSON object in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewSet(BTreeMap<String, Review>);

impl ReviewSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, review_id: &str) -> Option<&Review> {
        self.0.get(review_id)
    }

    /// Store a verdict, returning the one it replaced.
    pub fn insert(&mut self, review_id: String, review: Review) -> Option<Review> {
        self.0.insert(review_id, review)
    }

    pub fn remove(&mut self, review_id: &str) -> Option<Review> {
        self.0.remove(review_id)
    }

    #[must_use]
    pub fn contains(&self, review_id: &str) -> bool {
        self.0.contains_key(review_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Review> {
        self.0.iter()
    }

    #[must_use]
    pub fn count(&self, status: ReviewStatus) -> usize {
        self.0.values().filter(|r| r.status == status).count()
    }
}

impl<'a> IntoIterator for &'a ReviewSet {
    type Item = (&'a String, &'a Review);
    type IntoIter = btree_map::Iter<'a, String, Review>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, Review)> for ReviewSet {
    fn from_iter<I: IntoIterator<Item = (String, Review)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<(String, Review)> for ReviewSet {
    fn extend<I: IntoIterator<Item = (String, Review)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
