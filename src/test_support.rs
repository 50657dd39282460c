use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use sqlx::PgPool;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::core::{config::Settings, state::AppState, time::primitive_now_utc};
use crate::db::models::{Annotation, Score};
use crate::repositories;

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    _guard: OwnedMutexGuard<()>,
}

/// Ids of one submission and one problem in a course where the grader is
/// enrolled as a course assistant.
#[derive(Debug, Clone)]
pub(crate) struct GradingFixture {
    pub(crate) course_id: i64,
    pub(crate) assessment_id: i64,
    pub(crate) problem_id: i64,
    pub(crate) problem_name: String,
    pub(crate) submission_id: i64,
    pub(crate) grader_email: String,
    pub(crate) grader_enrollment_id: i64,
    pub(crate) student_enrollment_id: i64,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

fn test_database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("TEST_DATABASE_URL").ok().filter(|url| !url.trim().is_empty())
}

pub(crate) fn set_test_env(database_url: &str) {
    std::env::set_var("GRADEBOOK_ENV", "test");
    std::env::set_var("GRADEBOOK_STRICT_CONFIG", "0");
    std::env::set_var("DATABASE_URL", database_url);
    std::env::set_var("DB_MAX_CONNECTIONS", "4");
}

/// Fresh schema on the database named by `TEST_DATABASE_URL`. Returns `None`
/// when no test database is configured.
pub(crate) async fn setup_test_context() -> Option<TestContext> {
    let Some(database_url) = test_database_url() else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return None;
    };

    let guard = env_lock().await;
    set_test_env(&database_url);

    let settings = Settings::load().expect("settings");
    let db = prepare_db(&settings).await;
    let state = AppState::new(settings, db);

    Some(TestContext { state, _guard: guard })
}

async fn prepare_db(settings: &Settings) -> PgPool {
    let db = crate::db::init_pool(settings).await.expect("db pool");
    let current_db: String = sqlx::query_scalar("SELECT current_database()")
        .fetch_one(&db)
        .await
        .expect("current database");
    assert!(current_db.ends_with("_test"), "refusing to reset non-test database {current_db}");

    reset_public_schema(&db).await.expect("reset schema");
    crate::db::run_migrations(&db).await.expect("migrations");
    db
}

async fn reset_public_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("DROP SCHEMA IF EXISTS public CASCADE").execute(pool).await?;
    sqlx::query("CREATE SCHEMA public").execute(pool).await?;
    Ok(())
}

fn unique_suffix() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

async fn insert_user(pool: &PgPool, email: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (email, first_name, last_name) VALUES ($1, 'Test', 'User') RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("insert user")
}

async fn enroll(pool: &PgPool, user_id: i64, course_id: i64, course_assistant: bool) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO course_user_data (user_id, course_id, course_assistant)
         VALUES ($1, $2, $3)
         RETURNING id",
    )
    .bind(user_id)
    .bind(course_id)
    .bind(course_assistant)
    .fetch_one(pool)
    .await
    .expect("insert course user")
}

async fn insert_problem(
    pool: &PgPool,
    assessment_id: i64,
    name: &str,
    max_score: Option<f64>,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO problems (assessment_id, name, max_score) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(assessment_id)
    .bind(name)
    .bind(max_score)
    .fetch_one(pool)
    .await
    .expect("insert problem")
}

async fn insert_submission(pool: &PgPool, assessment_id: i64, enrollment_id: i64) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO submissions (assessment_id, course_user_datum_id)
         VALUES ($1, $2)
         RETURNING id",
    )
    .bind(assessment_id)
    .bind(enrollment_id)
    .fetch_one(pool)
    .await
    .expect("insert submission")
}

pub(crate) async fn grading_fixture(pool: &PgPool, max_score: Option<f64>) -> GradingFixture {
    let suffix = unique_suffix();

    let course_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO courses (name) VALUES ($1) RETURNING id",
    )
    .bind(format!("course-{suffix}"))
    .fetch_one(pool)
    .await
    .expect("insert course");

    let assessment_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO assessments (course_id, name) VALUES ($1, $2) RETURNING id",
    )
    .bind(course_id)
    .bind(format!("lab-{suffix}"))
    .fetch_one(pool)
    .await
    .expect("insert assessment");

    let grader_email = format!("ta{suffix}@example.edu");
    let grader_id = insert_user(pool, &grader_email).await;
    let grader_enrollment_id = enroll(pool, grader_id, course_id, true).await;

    let student_id = insert_user(pool, &format!("student{suffix}@example.edu")).await;
    let student_enrollment_id = enroll(pool, student_id, course_id, false).await;

    let problem_name = format!("P{suffix}");
    let problem_id = insert_problem(pool, assessment_id, &problem_name, max_score).await;
    let submission_id = insert_submission(pool, assessment_id, student_enrollment_id).await;

    GradingFixture {
        course_id,
        assessment_id,
        problem_id,
        problem_name,
        submission_id,
        grader_email,
        grader_enrollment_id,
        student_enrollment_id,
    }
}

/// Same submission, another problem of the assessment.
pub(crate) async fn second_problem(
    pool: &PgPool,
    fixture: &GradingFixture,
    max_score: Option<f64>,
) -> GradingFixture {
    let problem_name = format!("P{}", unique_suffix());
    let problem_id = insert_problem(pool, fixture.assessment_id, &problem_name, max_score).await;
    GradingFixture { problem_id, problem_name, ..fixture.clone() }
}

/// Submission of another student in the fixture's course and assessment.
pub(crate) async fn partner_submission(pool: &PgPool, fixture: &GradingFixture) -> i64 {
    let user_id = insert_user(pool, &format!("partner{}@example.edu", unique_suffix())).await;
    let enrollment_id = enroll(pool, user_id, fixture.course_id, false).await;
    insert_submission(pool, fixture.assessment_id, enrollment_id).await
}

/// Email of a registered user with no enrollment in any course.
pub(crate) async fn unenrolled_user_email(pool: &PgPool) -> String {
    let email = format!("outsider{}@example.edu", unique_suffix());
    insert_user(pool, &email).await;
    email
}

pub(crate) async fn insert_annotation(
    pool: &PgPool,
    fixture: &GradingFixture,
    value: Option<f64>,
    group_key: Option<&str>,
) -> Annotation {
    repositories::annotations::create(
        pool,
        repositories::annotations::CreateAnnotation {
            submission_id: fixture.submission_id,
            problem_id: fixture.problem_id,
            filename: "handin.c",
            comment: "See line",
            value,
            line: Some(1),
            position: None,
            submitted_by: &fixture.grader_email,
            shared_comment: false,
            global_comment: false,
            group_key,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .expect("insert annotation")
}

pub(crate) async fn insert_score(
    pool: &PgPool,
    submission_id: i64,
    problem_id: i64,
    score: Option<f64>,
    grader_id: Option<i64>,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO scores (submission_id, problem_id, score, grader_id)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(submission_id)
    .bind(problem_id)
    .bind(score)
    .bind(grader_id)
    .fetch_one(pool)
    .await
    .expect("insert score")
}

pub(crate) async fn find_score(
    pool: &PgPool,
    submission_id: i64,
    problem_id: i64,
) -> Option<Score> {
    sqlx::query_as::<_, Score>(&format!(
        "SELECT {} FROM scores WHERE submission_id = $1 AND problem_id = $2",
        repositories::scores::COLUMNS
    ))
    .bind(submission_id)
    .bind(problem_id)
    .fetch_optional(pool)
    .await
    .expect("find score")
}
