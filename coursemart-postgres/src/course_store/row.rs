use chrono::{DateTime, Utc};
use coursemart::{Course, Curriculum, Review};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const COURSE_COLUMNS: &str = "course_id, title, subtitle, description, field_id, instructor_id, \
    review_ids, rating, student_ids, total_students, image_1x_url, image_2x_url, image_3x_url, \
    discount_price, original_price, num_views, curriculum, is_complete, created_at, updated_at";

pub const REVIEW_COLUMNS: &str = "review_id, author_id, rating, feedback, created_at";

#[derive(FromRow)]
pub struct CourseRow {
    course_id: Uuid,
    title: String,
    subtitle: String,
    description: Option<String>,
    field_id: Option<Uuid>,
    instructor_id: Option<Uuid>,
    review_ids: Vec<Uuid>,
    rating: f64,
    student_ids: Vec<Uuid>,
    total_students: i64,
    image_1x_url: Option<String>,
    image_2x_url: Option<String>,
    image_3x_url: Option<String>,
    discount_price: Decimal,
    original_price: Decimal,
    num_views: i64,
    curriculum: Json<serde_json::Value>,
    is_complete: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Course {
            id: row.course_id.into(),
            title: row.title,
            subtitle: row.subtitle,
            description: row.description,
            field: row.field_id.map(Into::into),
            instructor: row.instructor_id.map(Into::into),
            reviews: row.review_ids.into_iter().map(Into::into).collect(),
            rating: row.rating,
            students: row.student_ids.into_iter().map(Into::into).collect(),
            total_students: row.total_students,
            image_1x_url: row.image_1x_url,
            image_2x_url: row.image_2x_url,
            image_3x_url: row.image_3x_url,
            discount_price: row.discount_price,
            original_price: row.original_price,
            num_views: row.num_views,
            curriculum: Curriculum::new(row.curriculum.0),
            is_complete: row.is_complete,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
pub struct ReviewRow {
    review_id: Uuid,
    author_id: Option<Uuid>,
    rating: Option<f64>,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Review {
            id: row.review_id.into(),
            author: row.author_id.map(Into::into),
            rating: row.rating,
            feedback: row.feedback,
            created_at: row.created_at,
        }
    }
}

pub fn uuids<T: Copy + Into<Uuid>>(ids: &[T]) -> Vec<Uuid> {
    ids.iter().map(|id| (*id).into()).collect()
}
