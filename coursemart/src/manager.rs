//! The course record manager.
//!
//! `CourseManager` is the entry point the application layer talks to. It owns the
//! store it is given and validates, defaults, rates and resolves courses on top of
//! it. Each call is an independent request against the store: there is no locking
//! between calls, so two `add_review` calls racing on the same course end with
//! whichever `save` lands last.
use async_stream::stream;
use chrono::Utc;
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::ReferenceKind;
use crate::store::{CourseStore, Directory, ReviewStore};
use crate::{
    Course, CourseFilter, CourseId, Error, NewCourse, Page, PageRequest, Review, ReviewId,
    TextQuery, UserId,
};

/// Behaviour switches of a `CourseManager`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourseManagerConfig {
    /// Page size used by `CourseManager::list`.
    pub default_page_size: i64,
    /// Check that the field and instructor of a new course exist before storing it.
    pub verify_references_on_create: bool,
}

impl Default for CourseManagerConfig {
    fn default() -> Self {
        Self {
            default_page_size: crate::paginate::DEFAULT_PAGE_SIZE,
            verify_references_on_create: false,
        }
    }
}

/// A course together with the entities it refers to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCourse {
    pub course: Course,
    /// The referenced reviews that exist, in course order.
    pub reviews: Vec<Review>,
    /// Referenced review ids with no stored review.
    pub missing_reviews: Vec<ReviewId>,
    /// `None` when the course has no field.
    pub field_exists: Option<bool>,
    /// `None` when the course has no instructor.
    pub instructor_exists: Option<bool>,
}

impl ResolvedCourse {
    /// True when every reference points to an existing entity.
    pub fn is_consistent(&self) -> bool {
        self.missing_reviews.is_empty()
            && self.field_exists != Some(false)
            && self.instructor_exists != Some(false)
    }
}

#[derive(Clone)]
pub struct CourseManager<S> {
    store: S,
    config: CourseManagerConfig,
}

impl<S> CourseManager<S>
where
    S: CourseStore + ReviewStore + Directory,
{
    pub fn new(store: S) -> Self {
        Self::with_config(store, CourseManagerConfig::default())
    }

    pub fn with_config(store: S, config: CourseManagerConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &CourseManagerConfig {
        &self.config
    }

    /// Validates `new`, applies the defaults and persists the course.
    ///
    /// # Errors
    ///
    /// * `Error::Validation` if `title` or `subtitle` is missing;
    /// * `Error::UniquenessViolation` if the title, trimmed, is taken;
    /// * `Error::ReferenceNotFound` if reference checks are enabled and fail.
    #[instrument(skip(self, new), fields(title = %new.title))]
    pub async fn create(&self, new: NewCourse) -> Result<Course, Error> {
        let course = Course::from_new(new, Utc::now())?;
        if self.config.verify_references_on_create {
            self.verify_references(&course).await?;
        }
        self.store.insert(&course).await?;
        info!(course_id = %course.id, "course created");
        Ok(course)
    }

    #[instrument(skip(self))]
    pub async fn find(&self, id: CourseId) -> Result<Option<Course>, Error> {
        self.store.find(id).await
    }

    async fn load(&self, id: CourseId) -> Result<Course, Error> {
        self.store.find(id).await?.ok_or(Error::NotFound(id))
    }

    /// Streams the courses whose title matches `text`, most relevant first.
    ///
    /// See [`TextQuery`] for the query syntax. Nothing runs until the stream is
    /// polled.
    pub fn find_by_text_query<'a>(&'a self, text: &str) -> BoxStream<'a, Result<Course, Error>> {
        let query = TextQuery::parse(text);
        stream! {
            debug!(%query, "text search");
            let mut courses = self.store.search_text(&query);
            while let Some(course) = courses.next().await {
                yield course;
            }
        }
        .boxed()
    }

    /// Returns page `page` of the courses matching `filter`.
    ///
    /// Fails with `Error::InvalidPage` if `page` or `page_size` is not positive.
    #[instrument(skip(self, filter))]
    pub async fn paginate(
        &self,
        filter: &CourseFilter,
        page: i64,
        page_size: i64,
    ) -> Result<Page<Course>, Error> {
        let request = PageRequest::new(page, page_size)?;
        self.store.paginate(filter, request).await
    }

    /// Like `paginate`, with the configured default page size.
    pub async fn list(&self, filter: &CourseFilter, page: i64) -> Result<Page<Course>, Error> {
        self.paginate(filter, page, self.config.default_page_size)
            .await
    }

    /// Stores `review`, attaches it to the course and recomputes the rating.
    ///
    /// The course's existing reviews are loaded from the review store; every one of
    /// them must exist and carry a numeric rating. A review the course already
    /// references fails with `Error::DuplicateReview` and is not stored again.
    #[instrument(skip(self, review), fields(review_id = %review.id))]
    pub async fn add_review(&self, course_id: CourseId, review: &Review) -> Result<Course, Error> {
        let mut course = self.load(course_id).await?;
        let existing = self.store.reviews(&course.reviews).await?;
        let rating = course.add_review(review, &existing)?;
        self.store.insert_review(review).await?;
        self.store.save(&course).await?;
        info!(%course_id, rating, reviews = course.reviews.len(), "review added");
        Ok(course)
    }

    /// Recomputes the rating of a course from its stored reviews.
    #[instrument(skip(self))]
    pub async fn recalculate_rating(&self, course_id: CourseId) -> Result<Course, Error> {
        let mut course = self.load(course_id).await?;
        let reviews = self.store.reviews(&course.reviews).await?;
        let rating = course.calculate_average_rating(&reviews)?;
        self.store.save(&course).await?;
        debug!(%course_id, rating, "rating recalculated");
        Ok(course)
    }

    /// Enrolls a student. Enrolling the same student twice changes nothing.
    #[instrument(skip(self))]
    pub async fn enroll_student(
        &self,
        course_id: CourseId,
        student: UserId,
    ) -> Result<Course, Error> {
        let mut course = self.load(course_id).await?;
        if course.enroll_student(student) {
            self.store.save(&course).await?;
            info!(%course_id, %student, total = course.total_students, "student enrolled");
        } else {
            debug!(%course_id, %student, "student already enrolled");
        }
        Ok(course)
    }

    #[instrument(skip(self))]
    pub async fn record_view(&self, course_id: CourseId) -> Result<Course, Error> {
        let mut course = self.load(course_id).await?;
        course.record_view();
        self.store.save(&course).await?;
        Ok(course)
    }

    /// Checks every reference of `course`, failing on the first dangling one.
    pub async fn verify_references(&self, course: &Course) -> Result<(), Error> {
        if let Some(field) = course.field {
            if !self.store.field_exists(field).await? {
                return Err(dangling(ReferenceKind::Field, field));
            }
        }
        if let Some(instructor) = course.instructor {
            if !self.store.user_exists(instructor).await? {
                return Err(dangling(ReferenceKind::Instructor, instructor));
            }
        }
        for student in &course.students {
            if !self.store.user_exists(*student).await? {
                return Err(dangling(ReferenceKind::Student, student));
            }
        }
        let reviews = self.store.reviews(&course.reviews).await?;
        if let Some(missing) = missing_reviews(&course.reviews, &reviews).first() {
            return Err(dangling(ReferenceKind::Review, missing));
        }
        Ok(())
    }

    /// Loads a course and resolves its references.
    ///
    /// Dangling references are reported in the result, not as errors.
    #[instrument(skip(self))]
    pub async fn resolve(&self, course_id: CourseId) -> Result<ResolvedCourse, Error> {
        let course = self.load(course_id).await?;
        let reviews = self.store.reviews(&course.reviews).await?;
        let missing_reviews = missing_reviews(&course.reviews, &reviews);
        let field_exists = match course.field {
            Some(field) => Some(self.store.field_exists(field).await?),
            None => None,
        };
        let instructor_exists = match course.instructor {
            Some(instructor) => Some(self.store.user_exists(instructor).await?),
            None => None,
        };
        let resolved = ResolvedCourse {
            course,
            reviews,
            missing_reviews,
            field_exists,
            instructor_exists,
        };
        if !resolved.is_consistent() {
            warn!(%course_id, "course has dangling references");
        }
        Ok(resolved)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, course_id: CourseId) -> Result<bool, Error> {
        self.store.delete(course_id).await
    }
}

fn dangling(kind: ReferenceKind, id: impl ToString) -> Error {
    Error::ReferenceNotFound {
        kind,
        id: id.to_string(),
    }
}

fn missing_reviews(ids: &[ReviewId], found: &[Review]) -> Vec<ReviewId> {
    ids.iter()
        .filter(|id| !found.iter().any(|review| review.id == **id))
        .copied()
        .collect()
}
