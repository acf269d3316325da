//! # PostgreSQL Coursemart Backend Library
mod course_store;
mod error;

pub use crate::course_store::PgCourseStore;
pub use error::Error;

/// Initializes the PostgreSQL DB
///
/// It creates the course, review, field and user tables and their indexes, with
/// the title text index built for the `english` text search configuration.
pub async fn setup(pool: &sqlx::PgPool) -> Result<(), Error> {
    PgCourseStore::new_uninitialized(pool.clone()).setup().await
}
