//! PostgreSQL Course Store
//!
//! This module provides an implementation of the `CourseStore`, `ReviewStore` and
//! `Directory` traits using PostgreSQL as the underlying storage.
mod query;
mod row;

use async_stream::stream;
use async_trait::async_trait;
use coursemart::{
    Course, CourseFilter, CourseId, CourseStore, Directory, FieldId, Page, PageRequest, Review,
    ReviewId, ReviewStore, TextQuery, UserId,
};
use futures::stream::BoxStream;
use futures::StreamExt;
use query::{text_search, FilterQueryBuilder};
use row::{uuids, CourseRow, ReviewRow, COURSE_COLUMNS, REVIEW_COLUMNS};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{map_write_err, storage_err};
use crate::Error;

const DEFAULT_TEXT_SEARCH_CONFIG: &str = "english";

/// PostgreSQL course store implementation.
#[derive(Clone)]
pub struct PgCourseStore {
    pub(crate) pool: PgPool,
    text_search_config: String,
}

impl PgCourseStore {
    /// Initializes the PostgreSQL DB and returns a new instance of `PgCourseStore`.
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool.
    pub async fn try_new(pool: PgPool) -> Result<Self, Error> {
        let store = Self::new_uninitialized(pool);
        store.setup().await?;
        Ok(store)
    }

    /// Creates a new instance of `PgCourseStore`.
    ///
    /// This constructor does not create the tables. Either call `setup` or recreate
    /// the structure from the SQL files in the "course_store/sql" directory.
    pub fn new_uninitialized(pool: PgPool) -> Self {
        Self {
            pool,
            text_search_config: DEFAULT_TEXT_SEARCH_CONFIG.to_string(),
        }
    }

    /// Selects the PostgreSQL text search configuration used for title searches.
    ///
    /// Defaults to `english`. The title index is built for this configuration, so
    /// run `setup` after changing it.
    pub fn with_text_search_config(mut self, config: impl Into<String>) -> Result<Self, Error> {
        let config = config.into();
        let valid = !config.is_empty()
            && config
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(Error::InvalidTextSearchConfig(config));
        }
        self.text_search_config = config;
        Ok(self)
    }

    pub fn text_search_config(&self) -> &str {
        &self.text_search_config
    }

    /// Creates the tables and indexes if they do not exist yet.
    pub async fn setup(&self) -> Result<(), Error> {
        sqlx::query(include_str!("course_store/sql/table_course.sql"))
            .execute(&self.pool)
            .await?;
        sqlx::query(include_str!("course_store/sql/idx_course_created_at.sql"))
            .execute(&self.pool)
            .await?;
        let config = &self.text_search_config;
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_course_title_{config} ON course USING GIN (to_tsvector('{config}', title))"
        ))
        .execute(&self.pool)
        .await?;
        sqlx::query(include_str!("course_store/sql/table_review.sql"))
            .execute(&self.pool)
            .await?;
        sqlx::query(include_str!("course_store/sql/table_field.sql"))
            .execute(&self.pool)
            .await?;
        sqlx::query(include_str!("course_store/sql/table_app_user.sql"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Registers a field so references to it resolve.
    pub async fn register_field(&self, field: FieldId, name: &str) -> Result<(), Error> {
        sqlx::query("INSERT INTO field (field_id, name) VALUES ($1, $2) ON CONFLICT (field_id) DO UPDATE SET name = EXCLUDED.name")
            .bind(field.as_uuid())
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Registers a user so references to it resolve.
    pub async fn register_user(&self, user: UserId, name: &str) -> Result<(), Error> {
        sqlx::query("INSERT INTO app_user (user_id, name) VALUES ($1, $2) ON CONFLICT (user_id) DO UPDATE SET name = EXCLUDED.name")
            .bind(user.as_uuid())
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CourseStore for PgCourseStore {
    async fn insert(&self, course: &Course) -> Result<(), coursemart::Error> {
        sqlx::query(&format!(
            "INSERT INTO course ({COURSE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)"
        ))
        .bind(course.id.as_uuid())
        .bind(&course.title)
        .bind(&course.subtitle)
        .bind(&course.description)
        .bind(course.field.map(|id| id.as_uuid()))
        .bind(course.instructor.map(|id| id.as_uuid()))
        .bind(uuids(&course.reviews))
        .bind(course.rating)
        .bind(uuids(&course.students))
        .bind(course.total_students)
        .bind(&course.image_1x_url)
        .bind(&course.image_2x_url)
        .bind(&course.image_3x_url)
        .bind(course.discount_price)
        .bind(course.original_price)
        .bind(course.num_views)
        .bind(Json(&course.curriculum))
        .bind(course.is_complete)
        .bind(course.created_at)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, course))?;
        debug!(course_id = %course.id, "course inserted");
        Ok(())
    }

    async fn find(&self, id: CourseId) -> Result<Option<Course>, coursemart::Error> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COURSE_COLUMNS} FROM course WHERE course_id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(row.map(Course::from))
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Course>, coursemart::Error> {
        let row = sqlx::query_as::<_, CourseRow>(&format!(
            "SELECT {COURSE_COLUMNS} FROM course WHERE title = $1"
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(row.map(Course::from))
    }

    /// Overwrites every column but `created_at`. `updated_at` is written as given.
    async fn save(&self, course: &Course) -> Result<(), coursemart::Error> {
        let result = sqlx::query(
            r#"UPDATE course SET title = $2, subtitle = $3, description = $4, field_id = $5,
                   instructor_id = $6, review_ids = $7, rating = $8, student_ids = $9,
                   total_students = $10, image_1x_url = $11, image_2x_url = $12, image_3x_url = $13,
                   discount_price = $14, original_price = $15, num_views = $16, curriculum = $17,
                   is_complete = $18, updated_at = $19
               WHERE course_id = $1"#,
        )
        .bind(course.id.as_uuid())
        .bind(&course.title)
        .bind(&course.subtitle)
        .bind(&course.description)
        .bind(course.field.map(|id| id.as_uuid()))
        .bind(course.instructor.map(|id| id.as_uuid()))
        .bind(uuids(&course.reviews))
        .bind(course.rating)
        .bind(uuids(&course.students))
        .bind(course.total_students)
        .bind(&course.image_1x_url)
        .bind(&course.image_2x_url)
        .bind(&course.image_3x_url)
        .bind(course.discount_price)
        .bind(course.original_price)
        .bind(course.num_views)
        .bind(Json(&course.curriculum))
        .bind(course.is_complete)
        .bind(course.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_err(err, course))?;
        if result.rows_affected() == 0 {
            return Err(coursemart::Error::NotFound(course.id));
        }
        Ok(())
    }

    async fn delete(&self, id: CourseId) -> Result<bool, coursemart::Error> {
        let result = sqlx::query("DELETE FROM course WHERE course_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(result.rows_affected() > 0)
    }

    /// Streams the matching courses ordered by `ts_rank`.
    ///
    /// The query is translated term by term: bare words become alternatives,
    /// quoted phrases are required with `phraseto_tsquery` and `-` terms are
    /// negated. Terms are stemmed by the configured text search configuration.
    fn search_text<'a>(
        &'a self,
        query: &'a TextQuery,
    ) -> BoxStream<'a, Result<Course, coursemart::Error>> {
        stream! {
            if !query.is_empty() {
                let mut builder = text_search(query, &self.text_search_config);
                for await row in builder.build_query_as::<CourseRow>().fetch(&self.pool) {
                    yield row.map(Course::from).map_err(storage_err);
                }
            }
        }
        .boxed()
    }

    async fn paginate(
        &self,
        filter: &CourseFilter,
        request: PageRequest,
    ) -> Result<Page<Course>, coursemart::Error> {
        let builder = FilterQueryBuilder::new(filter, &self.text_search_config);
        let total_count: i64 = builder
            .count()
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;
        let records = builder
            .page(request)
            .build_query_as::<CourseRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?
            .into_iter()
            .map(Course::from)
            .collect();
        Ok(Page::new(records, total_count, request))
    }
}

#[async_trait]
impl ReviewStore for PgCourseStore {
    async fn insert_review(&self, review: &Review) -> Result<(), coursemart::Error> {
        sqlx::query(&format!(
            "INSERT INTO review ({REVIEW_COLUMNS}) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (review_id) DO UPDATE SET author_id = EXCLUDED.author_id, \
             rating = EXCLUDED.rating, feedback = EXCLUDED.feedback"
        ))
        .bind(review.id.as_uuid())
        .bind(review.author.map(|id| id.as_uuid()))
        .bind(review.rating)
        .bind(&review.feedback)
        .bind(review.created_at)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn reviews(&self, ids: &[ReviewId]) -> Result<Vec<Review>, coursemart::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: HashMap<ReviewId, Review> = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM review WHERE review_id = ANY($1)"
        ))
        .bind(uuids(ids))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?
        .into_iter()
        .map(|row| {
            let review = Review::from(row);
            (review.id, review)
        })
        .collect();
        Ok(ids
            .iter()
            .filter_map(|id| found.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl Directory for PgCourseStore {
    async fn field_exists(&self, id: FieldId) -> Result<bool, coursemart::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM field WHERE field_id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)
    }

    async fn user_exists(&self, id: UserId) -> Result<bool, coursemart::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM app_user WHERE user_id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)
    }
}
