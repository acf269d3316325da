//! Page requests, course filters and pages of records.
use serde::{Deserialize, Serialize};

use crate::{Course, Error, FieldId, TextQuery, UserId};

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// A validated, 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: i64,
    page_size: i64,
}

impl PageRequest {
    /// Fails with `Error::InvalidPage` when `page` or `page_size` is not positive.
    pub fn new(page: i64, page_size: i64) -> Result<Self, Error> {
        if page < 1 || page_size < 1 {
            return Err(Error::InvalidPage { page, page_size });
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Number of records before this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Criteria a course must satisfy to be listed. The default filter matches
/// every course.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseFilter {
    pub field: Option<FieldId>,
    pub instructor: Option<UserId>,
    pub is_complete: Option<bool>,
    pub text: Option<String>,
}

impl CourseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: FieldId) -> Self {
        self.field = Some(field);
        self
    }

    pub fn instructor(mut self, instructor: UserId) -> Self {
        self.instructor = Some(instructor);
        self
    }

    pub fn complete(mut self, is_complete: bool) -> Self {
        self.is_complete = Some(is_complete);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// The parsed text search, if any.
    pub fn text_query(&self) -> Option<TextQuery> {
        self.text.as_deref().map(TextQuery::parse)
    }

    /// Evaluates the filter in memory.
    pub fn matches(&self, course: &Course) -> bool {
        if self.field.is_some() && course.field != self.field {
            return false;
        }
        if self.instructor.is_some() && course.instructor != self.instructor {
            return false;
        }
        if let Some(is_complete) = self.is_complete {
            if course.is_complete != is_complete {
                return false;
            }
        }
        match self.text_query() {
            Some(query) => query.score(&course.title).is_some(),
            None => true,
        }
    }
}

/// A page of records together with the paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total_count: i64,
    pub page_size: i64,
    pub total_pages: i64,
    pub current_page: i64,
    /// 1-based position of the first record of this page in the whole result.
    pub paging_counter: i64,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<i64>,
    pub next_page: Option<i64>,
}

impl<T> Page<T> {
    /// Builds the page metadata for `records` out of `total_count` matches.
    ///
    /// There is always at least one page, even when nothing matched.
    pub fn new(records: Vec<T>, total_count: i64, request: PageRequest) -> Self {
        let page_size = request.page_size();
        let current_page = request.page();
        let total_pages =
            (total_count / page_size + i64::from(total_count % page_size != 0)).max(1);
        let has_prev_page = current_page > 1;
        let has_next_page = current_page < total_pages;
        Self {
            records,
            total_count,
            page_size,
            total_pages,
            current_page,
            paging_counter: request.offset().saturating_add(1),
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| current_page - 1),
            next_page: has_next_page.then(|| current_page + 1),
        }
    }

    /// Slices an already filtered and ordered result set.
    pub fn from_slice(all: &[T], request: PageRequest) -> Self
    where
        T: Clone,
    {
        let total_count = all.len() as i64;
        let start = request.offset().min(total_count) as usize;
        let end = (start as i64)
            .saturating_add(request.page_size())
            .min(total_count) as usize;
        Self::new(all[start..end].to_vec(), total_count, request)
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            records: self.records.into_iter().map(f).collect(),
            total_count: self.total_count,
            page_size: self.page_size,
            total_pages: self.total_pages,
            current_page: self.current_page,
            paging_counter: self.paging_counter,
            has_prev_page: self.has_prev_page,
            has_next_page: self.has_next_page,
            prev_page: self.prev_page,
            next_page: self.next_page,
        }
    }
}
