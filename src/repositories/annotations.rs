use sqlx::PgExecutor;
use time::PrimitiveDateTime;

use crate::db::models::Annotation;

pub(crate) const COLUMNS: &str = "\
    id, submission_id, problem_id, filename, comment, value, line, position, \
    submitted_by, shared_comment, global_comment, group_key, created_at, updated_at";

/// One (submission, problem) pair that carries annotations, with the author
/// of its newest annotation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ScoreTarget {
    pub(crate) submission_id: i64,
    pub(crate) problem_id: i64,
    pub(crate) submitted_by: String,
}

pub(crate) struct CreateAnnotation<'a> {
    pub(crate) submission_id: i64,
    pub(crate) problem_id: i64,
    pub(crate) filename: &'a str,
    pub(crate) comment: &'a str,
    pub(crate) value: Option<f64>,
    pub(crate) line: Option<i32>,
    pub(crate) position: Option<i32>,
    pub(crate) submitted_by: &'a str,
    pub(crate) shared_comment: bool,
    pub(crate) global_comment: bool,
    pub(crate) group_key: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create<'e, E>(
    executor: E,
    params: CreateAnnotation<'_>,
) -> Result<Annotation, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Annotation>(&format!(
        "INSERT INTO annotations (
            submission_id, problem_id, filename, comment, value, line, position,
            submitted_by, shared_comment, global_comment, group_key, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$12)
        RETURNING {COLUMNS}",
    ))
    .bind(params.submission_id)
    .bind(params.problem_id)
    .bind(params.filename)
    .bind(params.comment)
    .bind(params.value)
    .bind(params.line)
    .bind(params.position)
    .bind(params.submitted_by)
    .bind(params.shared_comment)
    .bind(params.global_comment)
    .bind(params.group_key)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id<'e, E>(
    executor: E,
    id: i64,
) -> Result<Option<Annotation>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Annotation>(&format!("SELECT {COLUMNS} FROM annotations WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub(crate) async fn list_by_submission<'e, E>(
    executor: E,
    submission_id: i64,
) -> Result<Vec<Annotation>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Annotation>(&format!(
        "SELECT {COLUMNS}
         FROM annotations
         WHERE submission_id = $1
         ORDER BY filename, line NULLS FIRST, id"
    ))
    .bind(submission_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_by_group_key_excluding<'e, E>(
    executor: E,
    group_key: &str,
    excluded_id: i64,
) -> Result<Vec<Annotation>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Annotation>(&format!(
        "SELECT {COLUMNS}
         FROM annotations
         WHERE group_key = $1 AND id <> $2"
    ))
    .bind(group_key)
    .bind(excluded_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_values_for_score<'e, E>(
    executor: E,
    submission_id: i64,
    problem_id: i64,
) -> Result<Vec<Option<f64>>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, Option<f64>>(
        "SELECT value
         FROM annotations
         WHERE submission_id = $1 AND problem_id = $2",
    )
    .bind(submission_id)
    .bind(problem_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn list_score_targets<'e, E>(
    executor: E,
    assessment_id: Option<i64>,
) -> Result<Vec<ScoreTarget>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, ScoreTarget>(
        "SELECT DISTINCT ON (a.submission_id, a.problem_id)
                a.submission_id, a.problem_id, a.submitted_by
         FROM annotations a
         JOIN submissions s ON s.id = a.submission_id
         WHERE $1::BIGINT IS NULL OR s.assessment_id = $1
         ORDER BY a.submission_id, a.problem_id, a.updated_at DESC, a.id DESC",
    )
    .bind(assessment_id)
    .fetch_all(executor)
    .await
}

/// Field patch. `value: Some(None)` clears the adjustment.
pub(crate) struct UpdateAnnotation<'a> {
    pub(crate) comment: Option<&'a str>,
    pub(crate) value: Option<Option<f64>>,
    pub(crate) line: Option<i32>,
    pub(crate) position: Option<i32>,
    pub(crate) shared_comment: Option<bool>,
    pub(crate) global_comment: Option<bool>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update<'e, E>(
    executor: E,
    id: i64,
    params: UpdateAnnotation<'_>,
) -> Result<Option<Annotation>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let (value_set, value) = match params.value {
        Some(value) => (true, value),
        None => (false, None),
    };

    sqlx::query_as::<_, Annotation>(&format!(
        "UPDATE annotations SET
            comment = COALESCE($1, comment),
            value = CASE WHEN $2 THEN $3 ELSE value END,
            line = COALESCE($4, line),
            position = COALESCE($5, position),
            shared_comment = COALESCE($6, shared_comment),
            global_comment = COALESCE($7, global_comment),
            updated_at = $8
         WHERE id = $9
         RETURNING {COLUMNS}"
    ))
    .bind(params.comment)
    .bind(value_set)
    .bind(value)
    .bind(params.line)
    .bind(params.position)
    .bind(params.shared_comment)
    .bind(params.global_comment)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn delete<'e, E>(executor: E, id: i64) -> Result<Option<Annotation>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Annotation>(&format!(
        "DELETE FROM annotations WHERE id = $1 RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(executor)
    .await
}
