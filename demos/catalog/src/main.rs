use anyhow::{anyhow, Result};
use coursemart::{
    Course, CourseFilter, CourseManager, CourseManagerConfig, CourseStore, FieldId, NewCourse,
    Review, UserId,
};
use coursemart_postgres::PgCourseStore;
use futures::TryStreamExt;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{postgres::PgConnectOptions, PgPool};
use tracing::info;
use tracing_subscriber::EnvFilter;

type Manager = CourseManager<PgCourseStore>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Connection settings come from the standard PG* variables
    let pool = PgPool::connect_with(PgConnectOptions::new()).await?;
    let store = PgCourseStore::try_new(pool).await?;

    let field = FieldId::new();
    let instructor = UserId::new();
    store.register_field(field, "Programming").await?;
    store.register_user(instructor, "Grace").await?;

    let config = CourseManagerConfig {
        verify_references_on_create: true,
        ..Default::default()
    };
    let manager = CourseManager::with_config(store, config);

    let course = seed(
        &manager,
        NewCourse::new("Async Rust from scratch", "Futures, executors and pinning")
            .with_field(field)
            .with_instructor(instructor)
            .with_prices(Decimal::new(4900, 2), Decimal::new(1900, 2))
            .with_curriculum(json!({
                "sections": [
                    {"title": "Futures", "lectures": 4},
                    {"title": "Executors", "lectures": 3}
                ]
            }))
            .complete(),
    )
    .await?;
    seed(
        &manager,
        NewCourse::new("Rust for web services", "HTTP, databases and tracing").with_field(field),
    )
    .await?;
    seed(
        &manager,
        NewCourse::new("Python data wrangling", "Pandas in practice"),
    )
    .await?;

    for rating in [4.0, 5.0, 3.0] {
        manager
            .add_review(course.id, &Review::rated(rating).with_feedback("demo review"))
            .await?;
    }
    let course = manager.enroll_student(course.id, UserId::new()).await?;
    info!(
        title = %course.title,
        rating = course.rating,
        students = course.total_students,
        "course updated"
    );

    let matches: Vec<Course> = manager
        .find_by_text_query("rust -python")
        .try_collect()
        .await?;
    for course in &matches {
        println!("match: {} ({:.1})", course.title, course.rating);
    }

    let page = manager
        .paginate(&CourseFilter::new().field(field), 1, 2)
        .await?;
    println!(
        "page {}/{} of {} courses in the field",
        page.current_page, page.total_pages, page.total_count
    );
    for course in &page.records {
        println!("  {}", course.title);
    }

    let resolved = manager.resolve(course.id).await?;
    if !resolved.is_consistent() {
        return Err(anyhow!("course {} has dangling references", course.id));
    }
    Ok(())
}

/// Creates a course, or loads it when a previous run already created it.
async fn seed(manager: &Manager, new: NewCourse) -> Result<Course> {
    let title = new.title.clone();
    match manager.create(new).await {
        Ok(course) => Ok(course),
        Err(coursemart::Error::UniquenessViolation { .. }) => manager
            .store()
            .find_by_title(&title)
            .await?
            .ok_or_else(|| anyhow!("course `{title}` vanished")),
        Err(err) => Err(err.into()),
    }
}
