use sqlx::PgConnection;
use time::PrimitiveDateTime;

use crate::db::models::Score;

pub(crate) const COLUMNS: &str = "\
    id, submission_id, problem_id, score, grader_id, feedback, released, created_at, updated_at";

/// Finds the score for a (submission, problem) pair, creating an empty one if
/// absent, and locks the row until the surrounding transaction ends.
///
/// The insert is only visible once the transaction commits, so a rollback
/// leaves no trace of the created row.
pub(crate) async fn lock_or_insert(
    conn: &mut PgConnection,
    submission_id: i64,
    problem_id: i64,
    now: PrimitiveDateTime,
) -> Result<Score, sqlx::Error> {
    sqlx::query(
        "INSERT INTO scores (submission_id, problem_id, created_at, updated_at)
         VALUES ($1, $2, $3, $3)
         ON CONFLICT (submission_id, problem_id) DO NOTHING",
    )
    .bind(submission_id)
    .bind(problem_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, Score>(&format!(
        "SELECT {COLUMNS}
         FROM scores
         WHERE submission_id = $1 AND problem_id = $2
         FOR UPDATE"
    ))
    .bind(submission_id)
    .bind(problem_id)
    .fetch_one(&mut *conn)
    .await
}

pub(crate) async fn update_total(
    conn: &mut PgConnection,
    id: i64,
    score: f64,
    grader_id: i64,
    now: PrimitiveDateTime,
) -> Result<Score, sqlx::Error> {
    sqlx::query_as::<_, Score>(&format!(
        "UPDATE scores
         SET score = $1,
             grader_id = $2,
             updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(score)
    .bind(grader_id)
    .bind(now)
    .bind(id)
    .fetch_one(&mut *conn)
    .await
}
