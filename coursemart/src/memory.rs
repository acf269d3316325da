//! In-memory storage for tests and local development.
use async_stream::stream;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::store::{CourseStore, Directory, ReviewStore};
use crate::{
    Course, CourseFilter, CourseId, Error, FieldId, Page, PageRequest, Review, ReviewId,
    TextQuery, UserId,
};

struct Entry {
    course: Course,
    seq: u64,
}

#[derive(Default)]
struct State {
    courses: HashMap<CourseId, Entry>,
    next_seq: u64,
    reviews: HashMap<ReviewId, Review>,
    fields: HashSet<FieldId>,
    users: HashSet<UserId>,
}

impl State {
    fn title_taken(&self, title: &str, except: CourseId) -> bool {
        self.courses
            .values()
            .any(|entry| entry.course.title == title && entry.course.id != except)
    }

    /// Courses ordered by creation time, then insertion order.
    fn ordered(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.courses.values().collect();
        entries.sort_by(|a, b| {
            a.course
                .created_at
                .cmp(&b.course.created_at)
                .then(a.seq.cmp(&b.seq))
        });
        entries
    }
}

/// Keeps courses, reviews and the known fields and users in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a field so references to it resolve.
    pub async fn add_field(&self, field: FieldId) {
        self.state.write().await.fields.insert(field);
    }

    /// Registers a user so references to it resolve.
    pub async fn add_user(&self, user: UserId) {
        self.state.write().await.users.insert(user);
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.courses.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CourseStore for MemoryStore {
    async fn insert(&self, course: &Course) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if state.courses.contains_key(&course.id) {
            return Err(Error::AlreadyExists(course.id));
        }
        if state.title_taken(&course.title, course.id) {
            return Err(Error::UniquenessViolation {
                title: course.title.clone(),
            });
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.courses.insert(
            course.id,
            Entry {
                course: course.clone(),
                seq,
            },
        );
        Ok(())
    }

    async fn find(&self, id: CourseId) -> Result<Option<Course>, Error> {
        let state = self.state.read().await;
        Ok(state.courses.get(&id).map(|entry| entry.course.clone()))
    }

    async fn find_by_title(&self, title: &str) -> Result<Option<Course>, Error> {
        let state = self.state.read().await;
        Ok(state
            .courses
            .values()
            .find(|entry| entry.course.title == title)
            .map(|entry| entry.course.clone()))
    }

    async fn save(&self, course: &Course) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if state.title_taken(&course.title, course.id) {
            return Err(Error::UniquenessViolation {
                title: course.title.clone(),
            });
        }
        let entry = state
            .courses
            .get_mut(&course.id)
            .ok_or(Error::NotFound(course.id))?;
        entry.course = course.clone();
        Ok(())
    }

    async fn delete(&self, id: CourseId) -> Result<bool, Error> {
        let mut state = self.state.write().await;
        Ok(state.courses.remove(&id).is_some())
    }

    fn search_text<'a>(&'a self, query: &'a TextQuery) -> BoxStream<'a, Result<Course, Error>> {
        stream! {
            let matches = {
                let state = self.state.read().await;
                let mut scored: Vec<(f64, Course)> = state
                    .ordered()
                    .into_iter()
                    .filter_map(|entry| {
                        query
                            .score(&entry.course.title)
                            .map(|score| (score, entry.course.clone()))
                    })
                    .collect();
                // stable sort keeps creation order among equal scores
                scored.sort_by(|a, b| b.0.total_cmp(&a.0));
                scored
            };
            for (_, course) in matches {
                yield Ok(course);
            }
        }
        .boxed()
    }

    async fn paginate(
        &self,
        filter: &CourseFilter,
        request: PageRequest,
    ) -> Result<Page<Course>, Error> {
        let state = self.state.read().await;
        let matching: Vec<Course> = state
            .ordered()
            .into_iter()
            .filter(|entry| filter.matches(&entry.course))
            .map(|entry| entry.course.clone())
            .collect();
        Ok(Page::from_slice(&matching, request))
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, review: &Review) -> Result<(), Error> {
        let mut state = self.state.write().await;
        state.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn reviews(&self, ids: &[ReviewId]) -> Result<Vec<Review>, Error> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.reviews.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn field_exists(&self, id: FieldId) -> Result<bool, Error> {
        Ok(self.state.read().await.fields.contains(&id))
    }

    async fn user_exists(&self, id: UserId) -> Result<bool, Error> {
        Ok(self.state.read().await.users.contains(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewCourse;
    use assert2::{check, let_assert};
    use chrono::Utc;
    use futures::TryStreamExt;

    fn course(title: &str) -> Course {
        Course::from_new(NewCourse::new(title, "subtitle"), Utc::now()).unwrap()
    }

    #[tokio::test]
    async fn it_inserts_and_finds_a_course() {
        let store = MemoryStore::new();
        let course = course("Rust");
        store.insert(&course).await.unwrap();

        check!(store.find(course.id).await.unwrap() == Some(course.clone()));
        check!(store.find_by_title("Rust").await.unwrap() == Some(course));
        check!(store.find(CourseId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn it_rejects_a_duplicate_title() {
        let store = MemoryStore::new();
        store.insert(&course("Rust")).await.unwrap();

        let_assert!(Err(Error::UniquenessViolation { title }) = store.insert(&course("Rust")).await);
        check!(title == "Rust");
        check!(store.len().await == 1);
    }

    #[tokio::test]
    async fn it_refuses_to_insert_an_existing_id() {
        let store = MemoryStore::new();
        let original = course("Rust");
        store.insert(&original).await.unwrap();

        let mut renamed = original.clone();
        renamed.title = "Go".to_string();
        let_assert!(Err(Error::AlreadyExists(id)) = store.insert(&renamed).await);
        check!(id == original.id);
        check!(store.find(original.id).await.unwrap() == Some(original));
        check!(store.len().await == 1);
    }

    #[tokio::test]
    async fn it_rejects_a_rename_onto_an_existing_title() {
        let store = MemoryStore::new();
        store.insert(&course("Rust")).await.unwrap();
        let mut go = course("Go");
        store.insert(&go).await.unwrap();

        go.title = "Rust".to_string();
        assert!(matches!(
            store.save(&go).await,
            Err(Error::UniquenessViolation { .. })
        ));
    }

    #[tokio::test]
    async fn it_overwrites_on_save() {
        let store = MemoryStore::new();
        let mut course = course("Rust");
        store.insert(&course).await.unwrap();

        course.num_views = 7;
        store.save(&course).await.unwrap();
        check!(store.find(course.id).await.unwrap().unwrap().num_views == 7);
    }

    #[tokio::test]
    async fn it_fails_to_save_an_unknown_course() {
        let store = MemoryStore::new();
        let course = course("Rust");
        let_assert!(Err(Error::NotFound(id)) = store.save(&course).await);
        check!(id == course.id);
    }

    #[tokio::test]
    async fn it_deletes_a_course() {
        let store = MemoryStore::new();
        let course = course("Rust");
        store.insert(&course).await.unwrap();

        check!(store.delete(course.id).await.unwrap());
        check!(!store.delete(course.id).await.unwrap());
        check!(store.is_empty().await);
    }

    #[tokio::test]
    async fn it_searches_titles_by_relevance() {
        let store = MemoryStore::new();
        for title in ["Rust for the web", "Async Rust", "Python basics", "Advanced async"] {
            store.insert(&course(title)).await.unwrap();
        }

        let query = TextQuery::parse("rust async");
        let titles: Vec<String> = store
            .search_text(&query)
            .map_ok(|course| course.title)
            .try_collect()
            .await
            .unwrap();

        check!(titles.len() == 3);
        check!(titles[0] == "Async Rust");
        check!(!titles.contains(&"Python basics".to_string()));
    }

    #[tokio::test]
    async fn it_restarts_a_search() {
        let store = MemoryStore::new();
        store.insert(&course("Rust")).await.unwrap();
        let query = TextQuery::parse("rust");

        let first: Vec<Course> = store.search_text(&query).try_collect().await.unwrap();
        store.insert(&course("More Rust")).await.unwrap();
        let second: Vec<Course> = store.search_text(&query).try_collect().await.unwrap();

        check!(first.len() == 1);
        check!(second.len() == 2);
    }

    #[tokio::test]
    async fn it_paginates_in_creation_order() {
        let store = MemoryStore::new();
        for n in 0..25 {
            store.insert(&course(&format!("Course {n}"))).await.unwrap();
        }

        let page = store
            .paginate(&CourseFilter::new(), PageRequest::new(1, 10).unwrap())
            .await
            .unwrap();
        check!(page.records.len() == 10);
        check!(page.total_pages == 3);
        check!(page.records[0].title == "Course 0");

        let last = store
            .paginate(&CourseFilter::new(), PageRequest::new(3, 10).unwrap())
            .await
            .unwrap();
        check!(last.records.len() == 5);
        check!(last.records[4].title == "Course 24");
    }

    #[tokio::test]
    async fn it_paginates_with_a_filter() {
        let store = MemoryStore::new();
        let instructor = UserId::new();
        for n in 0..4 {
            let mut new = NewCourse::new(format!("Course {n}"), "subtitle");
            if n % 2 == 0 {
                new = new.with_instructor(instructor);
            }
            store
                .insert(&Course::from_new(new, Utc::now()).unwrap())
                .await
                .unwrap();
        }

        let filter = CourseFilter::new().instructor(instructor);
        let page = store.paginate(&filter, PageRequest::default()).await.unwrap();
        check!(page.total_count == 2);
        check!(page.records.iter().all(|c| c.instructor == Some(instructor)));
    }

    #[tokio::test]
    async fn it_loads_reviews_in_requested_order_skipping_missing() {
        let store = MemoryStore::new();
        let first = Review::rated(1.0);
        let second = Review::rated(2.0);
        store.insert_review(&first).await.unwrap();
        store.insert_review(&second).await.unwrap();

        let loaded = store
            .reviews(&[second.id, ReviewId::new(), first.id])
            .await
            .unwrap();
        check!(loaded == vec![second, first]);
    }

    #[tokio::test]
    async fn it_knows_registered_fields_and_users() {
        let store = MemoryStore::new();
        let field = FieldId::new();
        let user = UserId::new();
        store.add_field(field).await;
        store.add_user(user).await;

        check!(store.field_exists(field).await.unwrap());
        check!(!store.field_exists(FieldId::new()).await.unwrap());
        check!(store.user_exists(user).await.unwrap());
        check!(!store.user_exists(UserId::new()).await.unwrap());
    }
}
