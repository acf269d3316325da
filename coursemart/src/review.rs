use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ReviewId, UserId};

/// A review of a course.
///
/// Reviews live in their own store; a course only keeps their ids. The rating is
/// optional because stored documents are not guaranteed to carry one; the rating
/// helpers reject such reviews with `Error::MalformedReview`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub author: Option<UserId>,
    pub rating: Option<f64>,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(author: Option<UserId>, rating: Option<f64>, feedback: Option<String>) -> Self {
        Self {
            id: ReviewId::new(),
            author,
            rating,
            feedback,
            created_at: Utc::now(),
        }
    }

    /// A review carrying only a rating.
    pub fn rated(rating: f64) -> Self {
        Self::new(None, Some(rating), None)
    }

    /// A review without a rating.
    pub fn unrated() -> Self {
        Self::new(None, None, None)
    }

    pub fn with_author(mut self, author: UserId) -> Self {
        self.author = Some(author);
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }
}
