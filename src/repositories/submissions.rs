use sqlx::PgExecutor;

/// Course owning the submission's assessment.
pub(crate) async fn find_course_id<'e, E>(
    executor: E,
    submission_id: i64,
) -> Result<Option<i64>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT a.course_id
         FROM submissions s
         JOIN assessments a ON a.id = s.assessment_id
         WHERE s.id = $1",
    )
    .bind(submission_id)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn count_existing<'e, E>(
    executor: E,
    submission_ids: &[i64],
) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    if submission_ids.is_empty() {
        return Ok(0);
    }

    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM submissions WHERE id = ANY($1)")
        .bind(submission_ids)
        .fetch_one(executor)
        .await
}

/// How many of `submission_ids` belong to the assessment that owns the problem.
pub(crate) async fn count_in_problem_assessment<'e, E>(
    executor: E,
    submission_ids: &[i64],
    problem_id: i64,
) -> Result<i64, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*)
         FROM submissions s
         JOIN problems p ON p.assessment_id = s.assessment_id
         WHERE s.id = ANY($1) AND p.id = $2",
    )
    .bind(submission_ids)
    .bind(problem_id)
    .fetch_one(executor)
    .await
}
