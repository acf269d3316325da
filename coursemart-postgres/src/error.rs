use coursemart::Course;
use thiserror::Error;

/// Represents all the ways a method can fail within Coursemart Postgres.
#[derive(Error, Debug)]
pub enum Error {
    /// Error returned from the database.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    /// The text search configuration name is not a plain identifier.
    #[error("invalid text search configuration `{0}`")]
    InvalidTextSearchConfig(String),
}

impl From<Error> for coursemart::Error {
    fn from(err: Error) -> Self {
        coursemart::Error::storage(err)
    }
}

pub(crate) fn storage_err(err: sqlx::Error) -> coursemart::Error {
    Error::Database(err).into()
}

/// Maps a write error on `course`, reporting key collisions as domain errors.
pub(crate) fn map_write_err(err: sqlx::Error, course: &Course) -> coursemart::Error {
    if let sqlx::Error::Database(ref description) = err {
        if description.code().as_deref() == Some("23505") {
            match description.constraint() {
                Some("course_title_key") => {
                    return coursemart::Error::UniquenessViolation {
                        title: course.title.clone(),
                    }
                }
                Some("course_pkey") => return coursemart::Error::AlreadyExists(course.id),
                _ => {}
            }
        }
    }
    storage_err(err)
}
