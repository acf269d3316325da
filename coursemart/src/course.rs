//! The course record.
//!
//! A [`Course`] is created from a [`NewCourse`], which carries the required fields
//! and whatever optional fields the instructor filled in; everything else takes its
//! declared default. Rating helpers operate in memory only: the caller persists the
//! updated record.
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ReferenceKind;
use crate::rating;
use crate::{CourseId, Curriculum, Error, FieldId, Review, ReviewId, UserId};

/// A purchasable learning offering.
///
/// `updated_at` is set once at creation. No operation in this crate refreshes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
    pub subtitle: String,
    pub description: Option<String>,
    pub field: Option<FieldId>,
    pub instructor: Option<UserId>,
    pub reviews: Vec<ReviewId>,
    pub rating: f64,
    pub students: Vec<UserId>,
    pub total_students: i64,
    pub image_1x_url: Option<String>,
    pub image_2x_url: Option<String>,
    pub image_3x_url: Option<String>,
    pub discount_price: Decimal,
    pub original_price: Decimal,
    pub num_views: i64,
    pub curriculum: Curriculum,
    pub is_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Builds a course from validated input, applying the declared defaults.
    pub fn from_new(new: NewCourse, now: DateTime<Utc>) -> Result<Self, Error> {
        new.validate()?;
        Ok(Self {
            id: CourseId::new(),
            title: new.title.trim().to_string(),
            subtitle: new.subtitle.trim().to_string(),
            description: new.description,
            field: new.field,
            instructor: new.instructor,
            reviews: Vec::new(),
            rating: 0.0,
            students: Vec::new(),
            total_students: 0,
            image_1x_url: new.image_1x_url,
            image_2x_url: new.image_2x_url,
            image_3x_url: new.image_3x_url,
            discount_price: new.discount_price.unwrap_or_default(),
            original_price: new.original_price.unwrap_or_default(),
            num_views: 0,
            curriculum: new.curriculum.unwrap_or_default(),
            is_complete: new.is_complete,
            created_at: now,
            updated_at: now,
        })
    }

    /// Recomputes `rating` from the resolved reviews and returns it.
    ///
    /// `reviews` must be the resolution of `self.reviews`: the same ids in the same
    /// order. The rating is the mean of the review ratings rounded to one decimal
    /// place, or 0 without reviews. On error the rating is left untouched.
    pub fn calculate_average_rating(&mut self, reviews: &[Review]) -> Result<f64, Error> {
        self.check_resolved(reviews)?;
        self.rating = rating::average_of_reviews(reviews)?;
        Ok(self.rating)
    }

    /// Appends `review` and recomputes the rating over `existing` plus `review`.
    ///
    /// `existing` must be the resolution of the reviews already referenced. A
    /// review without a numeric rating, or one the course already references, is
    /// rejected before the course changes.
    pub fn add_review(&mut self, review: &Review, existing: &[Review]) -> Result<f64, Error> {
        rating::rating_of(review)?;
        if self.reviews.contains(&review.id) {
            return Err(Error::DuplicateReview(review.id));
        }
        self.check_resolved(existing)?;
        let rating = rating::average_of_reviews(existing.iter().chain(Some(review)))?;
        self.reviews.push(review.id);
        self.rating = rating;
        Ok(rating)
    }

    /// Enrolls a student once. Returns false if the student was already enrolled.
    pub fn enroll_student(&mut self, student: UserId) -> bool {
        if self.students.contains(&student) {
            return false;
        }
        self.students.push(student);
        self.total_students += 1;
        true
    }

    pub fn record_view(&mut self) {
        self.num_views += 1;
    }

    fn check_resolved(&self, reviews: &[Review]) -> Result<(), Error> {
        let mut resolved = reviews.iter().map(|review| review.id);
        for id in &self.reviews {
            if resolved.next() != Some(*id) {
                return Err(Error::ReferenceNotFound {
                    kind: ReferenceKind::Review,
                    id: id.to_string(),
                });
            }
        }
        if let Some(extra) = resolved.next() {
            return Err(Error::ReferenceNotFound {
                kind: ReferenceKind::Review,
                id: extra.to_string(),
            });
        }
        Ok(())
    }
}

/// Input for creating a course.
///
/// ```
/// use coursemart::NewCourse;
///
/// let new = NewCourse::new("Rust in Practice", "Ownership without tears")
///     .with_description("A hands-on tour.");
/// assert!(new.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCourse {
    pub title: String,
    pub subtitle: String,
    pub description: Option<String>,
    pub field: Option<FieldId>,
    pub instructor: Option<UserId>,
    pub image_1x_url: Option<String>,
    pub image_2x_url: Option<String>,
    pub image_3x_url: Option<String>,
    pub discount_price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub curriculum: Option<Curriculum>,
    pub is_complete: bool,
}

impl NewCourse {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_field(mut self, field: FieldId) -> Self {
        self.field = Some(field);
        self
    }

    pub fn with_instructor(mut self, instructor: UserId) -> Self {
        self.instructor = Some(instructor);
        self
    }

    pub fn with_images(
        mut self,
        image_1x_url: impl Into<String>,
        image_2x_url: impl Into<String>,
        image_3x_url: impl Into<String>,
    ) -> Self {
        self.image_1x_url = Some(image_1x_url.into());
        self.image_2x_url = Some(image_2x_url.into());
        self.image_3x_url = Some(image_3x_url.into());
        self
    }

    pub fn with_prices(mut self, original_price: Decimal, discount_price: Decimal) -> Self {
        self.original_price = Some(original_price);
        self.discount_price = Some(discount_price);
        self
    }

    pub fn with_curriculum(mut self, curriculum: impl Into<Curriculum>) -> Self {
        self.curriculum = Some(curriculum.into());
        self
    }

    pub fn complete(mut self) -> Self {
        self.is_complete = true;
        self
    }

    /// Checks that `title` and `subtitle` are present.
    ///
    /// Surrounding whitespace does not count and is trimmed when the course is
    /// built, so `"Rust "` and `"Rust"` are the same title.
    pub fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation { field: "title" });
        }
        if self.subtitle.trim().is_empty() {
            return Err(Error::Validation { field: "subtitle" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};

    fn course() -> Course {
        Course::from_new(NewCourse::new("Rust", "Systems programming"), Utc::now()).unwrap()
    }

    fn course_with_reviews(ratings: &[f64]) -> (Course, Vec<Review>) {
        let mut course = course();
        let reviews: Vec<Review> = ratings.iter().map(|r| Review::rated(*r)).collect();
        course.reviews = reviews.iter().map(|r| r.id).collect();
        (course, reviews)
    }

    #[test]
    fn it_applies_defaults() {
        let now = Utc::now();
        let course = Course::from_new(NewCourse::new("Rust", "Systems programming"), now).unwrap();

        check!(course.rating == 0.0);
        check!(course.total_students == 0);
        check!(course.num_views == 0);
        check!(course.discount_price == Decimal::ZERO);
        check!(course.original_price == Decimal::ZERO);
        check!(!course.is_complete);
        check!(course.reviews.is_empty());
        check!(course.students.is_empty());
        check!(course.curriculum.is_empty());
        check!(course.created_at == now);
        check!(course.updated_at == now);
    }

    #[test]
    fn it_requires_a_subtitle() {
        let err = Course::from_new(NewCourse::new("Rust", "  "), Utc::now()).unwrap_err();
        let_assert!(Error::Validation { field } = err);
        check!(field == "subtitle");
    }

    #[test]
    fn it_requires_a_title() {
        let err = NewCourse::new("", "Systems programming").validate().unwrap_err();
        assert!(matches!(err, Error::Validation { field: "title" }));
    }

    #[test]
    fn it_calculates_zero_rating_without_reviews() {
        let mut course = course();
        course.rating = 3.0;
        check!(course.calculate_average_rating(&[]).unwrap() == 0.0);
        check!(course.rating == 0.0);
    }

    #[test]
    fn it_calculates_average_rating() {
        let (mut course, reviews) = course_with_reviews(&[4.0, 5.0, 3.0]);
        check!(course.calculate_average_rating(&reviews).unwrap() == 4.0);
        check!(course.rating == 4.0);
    }

    #[test]
    fn it_adds_a_review_and_recalculates() {
        let (mut course, reviews) = course_with_reviews(&[4.0, 5.0, 3.0]);
        course.calculate_average_rating(&reviews).unwrap();

        let review = Review::rated(2.0);
        check!(course.add_review(&review, &reviews).unwrap() == 3.5);
        check!(course.reviews.len() == 4);
        check!(course.reviews.last() == Some(&review.id));
    }

    #[test]
    fn it_matches_append_then_recalculate() {
        let mut added = course();
        let mut resolved = Vec::new();
        for rating in [1.0, 4.0, 4.0, 5.0, 2.5] {
            let review = Review::rated(rating);
            added.add_review(&review, &resolved).unwrap();
            resolved.push(review);
        }

        let mut recalculated = added.clone();
        recalculated.rating = 0.0;
        recalculated.calculate_average_rating(&resolved).unwrap();

        check!(added.rating == recalculated.rating);
        check!(added.rating == 3.3);
    }

    #[test]
    fn it_rejects_a_malformed_review_without_changing_the_course() {
        let (mut course, reviews) = course_with_reviews(&[4.0]);
        course.calculate_average_rating(&reviews).unwrap();
        let before = course.clone();

        let err = course.add_review(&Review::unrated(), &reviews).unwrap_err();
        assert!(matches!(err, Error::MalformedReview(_)));
        check!(course == before);
    }

    #[test]
    fn it_rejects_reviews_that_do_not_match_the_references() {
        let (mut course, mut reviews) = course_with_reviews(&[4.0, 2.0]);
        let missing = reviews.pop().unwrap();

        let err = course.calculate_average_rating(&reviews).unwrap_err();
        let_assert!(Error::ReferenceNotFound { kind, id } = err);
        check!(kind == ReferenceKind::Review);
        check!(id == missing.id.to_string());
    }

    #[test]
    fn it_rejects_a_review_it_already_references() {
        let (mut course, reviews) = course_with_reviews(&[4.0, 2.0]);
        course.calculate_average_rating(&reviews).unwrap();
        let before = course.clone();

        let err = course.add_review(&reviews[0], &reviews).unwrap_err();
        let_assert!(Error::DuplicateReview(id) = err);
        check!(id == reviews[0].id);
        check!(course == before);
        check!(course.rating == 3.0);
    }

    #[test]
    fn it_trims_title_and_subtitle() {
        let course = Course::from_new(
            NewCourse::new("  Rust ", "Systems programming\n"),
            Utc::now(),
        )
        .unwrap();
        check!(course.title == "Rust");
        check!(course.subtitle == "Systems programming");
    }

    #[test]
    fn it_enrolls_a_student_once() {
        let mut course = course();
        let student = UserId::new();

        check!(course.enroll_student(student));
        check!(!course.enroll_student(student));
        check!(course.students == vec![student]);
        check!(course.total_students == 1);
    }

    #[test]
    fn it_records_views() {
        let mut course = course();
        course.record_view();
        course.record_view();
        check!(course.num_views == 2);
    }
}
