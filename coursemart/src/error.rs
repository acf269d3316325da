use crate::{CourseId, ReviewId};
use std::fmt;
use thiserror::Error;

pub type BoxDynError = Box<dyn std::error::Error + 'static + Send + Sync>;

/// The kind of entity a course refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Field,
    Instructor,
    Student,
    Review,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::Field => "field",
            ReferenceKind::Instructor => "instructor",
            ReferenceKind::Student => "student",
            ReferenceKind::Review => "review",
        };
        f.write_str(name)
    }
}

/// Represents all the ways a course operation can fail.
///
/// Errors are surfaced to the caller unchanged: nothing in this crate retries
/// or recovers locally.
#[derive(Error, Debug)]
pub enum Error {
    /// A required field is missing or blank.
    #[error("validation failed: `{field}` is required")]
    Validation { field: &'static str },
    /// Another course already uses this title.
    #[error("a course titled `{title}` already exists")]
    UniquenessViolation { title: String },
    /// A referenced entity does not exist in its store.
    #[error("{kind} `{id}` not found")]
    ReferenceNotFound { kind: ReferenceKind, id: String },
    /// Page numbers and page sizes start at 1.
    #[error("invalid page request: page {page}, page size {page_size}")]
    InvalidPage { page: i64, page_size: i64 },
    /// The review has no usable numeric rating.
    #[error("review `{0}` does not carry a numeric rating")]
    MalformedReview(ReviewId),
    /// The course already references this review.
    #[error("review `{0}` is already attached to the course")]
    DuplicateReview(ReviewId),
    /// A course with this id is already stored.
    #[error("course `{0}` already exists")]
    AlreadyExists(CourseId),
    /// The course does not exist.
    #[error("course `{0}` not found")]
    NotFound(CourseId),
    /// The underlying store failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] BoxDynError),
}

impl Error {
    /// Wraps a backend error.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::StorageUnavailable(Box::new(err))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
