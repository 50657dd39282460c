use sqlx::PgExecutor;

use crate::db::models::CourseUserDatum;

pub(crate) const COLUMNS: &str = "\
    id, user_id, course_id, instructor, course_assistant, created_at, updated_at";

pub(crate) async fn find_for_user_course<'e, E>(
    executor: E,
    user_id: i64,
    course_id: i64,
) -> Result<Option<CourseUserDatum>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, CourseUserDatum>(&format!(
        "SELECT {COLUMNS}
         FROM course_user_data
         WHERE user_id = $1 AND course_id = $2"
    ))
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn exists<'e, E>(executor: E, id: i64) -> Result<bool, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM course_user_data WHERE id = $1)")
        .bind(id)
        .fetch_one(executor)
        .await
}
