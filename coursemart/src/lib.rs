#![doc = include_str!("../README.md")]

mod course;
mod curriculum;
mod error;
mod id;
mod manager;
mod memory;
mod paginate;
pub mod rating;
mod review;
mod store;
mod text;

#[doc(inline)]
pub use crate::course::{Course, NewCourse};
#[doc(inline)]
pub use crate::curriculum::Curriculum;
#[doc(inline)]
pub use crate::error::{BoxDynError, Error, ReferenceKind, Result};
#[doc(inline)]
pub use crate::id::{CourseId, FieldId, ReviewId, UserId};
#[doc(inline)]
pub use crate::manager::{CourseManager, CourseManagerConfig, ResolvedCourse};
#[doc(inline)]
pub use crate::memory::MemoryStore;
#[doc(inline)]
pub use crate::paginate::{CourseFilter, Page, PageRequest, DEFAULT_PAGE_SIZE};
#[doc(inline)]
pub use crate::review::Review;
#[doc(inline)]
pub use crate::store::{CourseStore, Directory, ReviewStore};
#[doc(inline)]
pub use crate::text::TextQuery;
