use sqlx::{PgConnection, PgPool};

use crate::core::time::primitive_now_utc;
use crate::db::models::Annotation;
use crate::db::types::ScoreGrader;
use crate::repositories;
use crate::services::errors::ServiceError;

/// Result of recomputing the score behind an annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreUpdate {
    /// Autograded scores are left untouched.
    Autograded { score_id: i64 },
    Updated { score_id: i64, grader_id: i64, score: f64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescoreSummary {
    pub updated: usize,
    pub autograded: usize,
    pub failed: usize,
}

/// Sum of annotation values, with missing values counting as zero.
pub fn annotation_delta(values: &[Option<f64>]) -> f64 {
    values.iter().map(|value| value.unwrap_or(0.0)).sum()
}

/// Sets the annotation's score to `max_score + sum(annotation values)` unless
/// the score belongs to the autograder.
///
/// The score row is created on first use and locked for the duration of the
/// recompute, so concurrent edits on the same (submission, problem) apply one
/// after another. A score without a grader is assigned the course enrollment
/// of the annotation's author.
pub async fn update_non_autograded_score(
    pool: &PgPool,
    annotation: &Annotation,
) -> Result<ScoreUpdate, ServiceError> {
    let mut tx = pool.begin().await?;
    let update = recompute_score(
        &mut *tx,
        annotation.submission_id,
        annotation.problem_id,
        &annotation.submitted_by,
    )
    .await?;
    tx.commit().await?;
    Ok(update)
}

/// Recomputes every score that has annotations, optionally limited to one
/// assessment. Failures are logged and counted; the walk continues.
pub async fn rescore_all(
    pool: &PgPool,
    assessment_id: Option<i64>,
) -> Result<RescoreSummary, ServiceError> {
    let targets = repositories::annotations::list_score_targets(pool, assessment_id).await?;
    let mut summary = RescoreSummary::default();

    for target in &targets {
        let result = async {
            let mut tx = pool.begin().await?;
            let update = recompute_score(
                &mut *tx,
                target.submission_id,
                target.problem_id,
                &target.submitted_by,
            )
            .await?;
            tx.commit().await?;
            Ok::<_, ServiceError>(update)
        }
        .await;

        match result {
            Ok(ScoreUpdate::Updated { .. }) => summary.updated += 1,
            Ok(ScoreUpdate::Autograded { .. }) => summary.autograded += 1,
            Err(err) => {
                summary.failed += 1;
                tracing::warn!(
                    error = %err,
                    submission_id = target.submission_id,
                    problem_id = target.problem_id,
                    "Failed to recompute score"
                );
            }
        }
    }

    tracing::info!(
        targets = targets.len(),
        updated = summary.updated,
        autograded = summary.autograded,
        failed = summary.failed,
        "Rescored annotated problems"
    );

    Ok(summary)
}

pub(crate) async fn recompute_score(
    conn: &mut PgConnection,
    submission_id: i64,
    problem_id: i64,
    submitted_by: &str,
) -> Result<ScoreUpdate, ServiceError> {
    let now = primitive_now_utc();
    let score =
        repositories::scores::lock_or_insert(&mut *conn, submission_id, problem_id, now).await?;

    let assigned = match score.grader() {
        ScoreGrader::Autograder => {
            tracing::debug!(
                score_id = score.id,
                submission_id,
                problem_id,
                "Skipping autograded score"
            );
            metrics::counter!("annotation_score_updates_total", "outcome" => "autograded")
                .increment(1);
            return Ok(ScoreUpdate::Autograded { score_id: score.id });
        }
        ScoreGrader::CourseUser(id) => {
            repositories::course_user_data::exists(&mut *conn, id).await?.then_some(id)
        }
        ScoreGrader::Unassigned => None,
    };

    let grader_id = match assigned {
        Some(id) => id,
        None => resolve_grader(conn, submission_id, submitted_by).await?,
    };

    let values =
        repositories::annotations::list_values_for_score(&mut *conn, submission_id, problem_id)
            .await?;
    let delta = annotation_delta(&values);

    let problem = repositories::problems::find_by_id(&mut *conn, problem_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("problem {problem_id}")))?;
    let max_score = problem.max_score.unwrap_or(0.0);
    let total = max_score + delta;

    repositories::scores::update_total(conn, score.id, total, grader_id, now).await?;

    tracing::info!(
        score_id = score.id,
        submission_id,
        problem_id,
        grader_id,
        annotations = values.len(),
        score = total,
        "Recomputed score from annotations"
    );
    metrics::counter!("annotation_score_updates_total", "outcome" => "updated").increment(1);

    Ok(ScoreUpdate::Updated { score_id: score.id, grader_id, score: total })
}

async fn resolve_grader(
    conn: &mut PgConnection,
    submission_id: i64,
    submitted_by: &str,
) -> Result<i64, ServiceError> {
    let user = repositories::users::find_by_email(&mut *conn, submitted_by)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("user {submitted_by}")))?;

    let course_id = repositories::submissions::find_course_id(&mut *conn, submission_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("submission {submission_id}")))?;

    let enrollment =
        repositories::course_user_data::find_for_user_course(&mut *conn, user.id, course_id)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(format!(
                    "course enrollment of {submitted_by} in course {course_id}"
                ))
            })?;

    Ok(enrollment.id)
}
