//! Identifiers of the entities a course stores or refers to.
//!
//! Every identifier is a distinct newtype over a UUID, so a `UserId` can never be
//! passed where a `ReviewId` is expected. References are resolved explicitly
//! through the stores; an identifier carries no loaded data.
//!
//! # Examples
//!
//! ```
//! use coursemart::CourseId;
//! use std::str::FromStr;
//!
//! let id = CourseId::new();
//! let parsed = CourseId::from_str(&id.to_string()).unwrap();
//! assert_eq!(id, parsed);
//! ```
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a new random identifier.
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Deref for $name {
            type Target = Uuid;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

entity_id!(
    /// Identifies a course record.
    CourseId
);
entity_id!(
    /// Identifies a field (category/topic) a course belongs to.
    FieldId
);
entity_id!(
    /// Identifies a user: instructors and students alike.
    UserId
);
entity_id!(
    /// Identifies a review.
    ReviewId
);
