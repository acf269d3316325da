//! Storage contracts for courses and the entities they refer to.
//!
//! A store is handed to whatever needs it (see `CourseManager`); there is no
//! process-wide registry. Implementations map their own failures to
//! `Error::StorageUnavailable` and report title collisions as
//! `Error::UniquenessViolation`. None of them enforce reference integrity.
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{
    Course, CourseFilter, CourseId, Error, FieldId, Page, PageRequest, Review, ReviewId,
    TextQuery, UserId,
};

/// Persistence of course records.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Persists a new course.
    ///
    /// Fails with `Error::AlreadyExists` if a course with the same id is stored, and
    /// with `Error::UniquenessViolation` if another course has the same title.
    async fn insert(&self, course: &Course) -> Result<(), Error>;

    /// Loads a course by id.
    async fn find(&self, id: CourseId) -> Result<Option<Course>, Error>;

    /// Loads a course by its exact title.
    async fn find_by_title(&self, title: &str) -> Result<Option<Course>, Error>;

    /// Overwrites a stored course with `course`.
    ///
    /// The whole record is replaced: concurrent writers of the same course race and
    /// the last one wins. Fails with `Error::NotFound` if the course does not exist.
    async fn save(&self, course: &Course) -> Result<(), Error>;

    /// Deletes a course. Returns false if it did not exist.
    async fn delete(&self, id: CourseId) -> Result<bool, Error>;

    /// Streams the courses whose title matches `query`, most relevant first.
    ///
    /// The stream is lazy and finite. Calling this again runs the search again.
    fn search_text<'a>(&'a self, query: &'a TextQuery) -> BoxStream<'a, Result<Course, Error>>;

    /// Returns one page of the courses matching `filter`, oldest first.
    async fn paginate(
        &self,
        filter: &CourseFilter,
        request: PageRequest,
    ) -> Result<Page<Course>, Error>;
}

/// Persistence of reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_review(&self, review: &Review) -> Result<(), Error>;

    /// Loads the reviews with the given ids, in the order requested.
    ///
    /// Ids with no stored review are skipped.
    async fn reviews(&self, ids: &[ReviewId]) -> Result<Vec<Review>, Error>;
}

/// Existence checks for the fields and users courses point to.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn field_exists(&self, id: FieldId) -> Result<bool, Error>;

    async fn user_exists(&self, id: UserId) -> Result<bool, Error>;
}
