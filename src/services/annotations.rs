use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::core::time::primitive_now_utc;
use crate::db::models::Annotation;
use crate::repositories;
use crate::repositories::annotations::{CreateAnnotation, UpdateAnnotation};
use crate::schemas::annotation::{AnnotationUpdate, NewAnnotation};
use crate::services::errors::ServiceError;
use crate::services::scoring::{self, ScoreUpdate};

/// Stores a validated annotation and recomputes the score it contributes to,
/// both in one transaction.
pub async fn create_annotation(
    pool: &PgPool,
    input: &NewAnnotation,
) -> Result<(Annotation, ScoreUpdate), ServiceError> {
    input.validate()?;

    let mut tx = pool.begin().await?;
    let annotation =
        repositories::annotations::create(&mut *tx, create_params(input, input.submission_id, None))
            .await?;
    let update = scoring::recompute_score(
        &mut *tx,
        annotation.submission_id,
        annotation.problem_id,
        &annotation.submitted_by,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        annotation_id = annotation.id,
        submission_id = annotation.submission_id,
        problem_id = annotation.problem_id,
        "Created annotation"
    );
    metrics::counter!("annotations_created_total").increment(1);

    Ok((annotation, update))
}

/// Creates the same annotation on every submission of a group, tied together
/// by a fresh group key. `input.submission_id` is always part of the group.
/// The result is ordered by submission id.
pub async fn create_group_annotations(
    pool: &PgPool,
    input: &NewAnnotation,
    group_submission_ids: &[i64],
) -> Result<Vec<(Annotation, ScoreUpdate)>, ServiceError> {
    input.validate()?;

    let mut submission_ids = vec![input.submission_id];
    for id in group_submission_ids {
        if !submission_ids.contains(id) {
            submission_ids.push(*id);
        }
    }

    if submission_ids.len() < 2 {
        return Err(ServiceError::InvalidGroup(
            "a group annotation needs at least two submissions".to_string(),
        ));
    }

    let existing = repositories::submissions::count_existing(pool, &submission_ids).await?;
    if existing != submission_ids.len() as i64 {
        return Err(ServiceError::not_found("group submission"));
    }

    let in_assessment = repositories::submissions::count_in_problem_assessment(
        pool,
        &submission_ids,
        input.problem_id,
    )
    .await?;
    if in_assessment != submission_ids.len() as i64 {
        return Err(ServiceError::InvalidGroup(
            "every group submission must belong to the problem's assessment".to_string(),
        ));
    }

    // Score rows are locked in ascending submission order.
    submission_ids.sort_unstable();

    let group_key = Uuid::new_v4().to_string();
    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(submission_ids.len());

    for submission_id in submission_ids {
        let annotation = repositories::annotations::create(
            &mut *tx,
            create_params(input, submission_id, Some(group_key.as_str())),
        )
        .await?;
        let update = scoring::recompute_score(
            &mut *tx,
            annotation.submission_id,
            annotation.problem_id,
            &annotation.submitted_by,
        )
        .await?;
        created.push((annotation, update));
    }

    tx.commit().await?;

    tracing::info!(
        group_key = %group_key,
        annotations = created.len(),
        problem_id = input.problem_id,
        "Created group annotations"
    );
    metrics::counter!("annotations_created_total").increment(created.len() as u64);

    Ok(created)
}

/// Applies a partial edit and recomputes the owning score.
pub async fn update_annotation(
    pool: &PgPool,
    id: i64,
    changes: &AnnotationUpdate,
) -> Result<(Annotation, ScoreUpdate), ServiceError> {
    changes.validate()?;

    let mut tx = pool.begin().await?;
    let annotation = repositories::annotations::update(
        &mut *tx,
        id,
        UpdateAnnotation {
            comment: changes.comment.as_deref(),
            value: changes.value,
            line: changes.line,
            position: changes.position,
            shared_comment: changes.shared_comment,
            global_comment: changes.global_comment,
            updated_at: primitive_now_utc(),
        },
    )
    .await?
    .ok_or_else(|| ServiceError::not_found(format!("annotation {id}")))?;

    let update = scoring::recompute_score(
        &mut *tx,
        annotation.submission_id,
        annotation.problem_id,
        &annotation.submitted_by,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(annotation_id = id, "Updated annotation");
    metrics::counter!("annotations_updated_total").increment(1);

    Ok((annotation, update))
}

/// Removes an annotation and recomputes the score without its value.
pub async fn delete_annotation(
    pool: &PgPool,
    id: i64,
) -> Result<(Annotation, ScoreUpdate), ServiceError> {
    let mut tx = pool.begin().await?;
    let annotation = repositories::annotations::delete(&mut *tx, id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("annotation {id}")))?;

    let update = scoring::recompute_score(
        &mut *tx,
        annotation.submission_id,
        annotation.problem_id,
        &annotation.submitted_by,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(annotation_id = id, "Deleted annotation");
    metrics::counter!("annotations_deleted_total").increment(1);

    Ok((annotation, update))
}

/// Other annotations of the same group submission iteration, excluding this
/// one. Fails for annotations that do not belong to a group.
pub async fn group_associated_annotations(
    pool: &PgPool,
    annotation: &Annotation,
) -> Result<Vec<Annotation>, ServiceError> {
    let group_key = annotation.group_key().ok_or(ServiceError::NotGroupSubmission)?;

    let siblings =
        repositories::annotations::list_by_group_key_excluding(pool, group_key, annotation.id)
            .await?;
    Ok(siblings)
}

/// Display text of an annotation, with its problem looked up by id.
pub async fn annotation_text(
    pool: &PgPool,
    annotation: &Annotation,
) -> Result<String, ServiceError> {
    let problem = repositories::problems::find_by_id(pool, annotation.problem_id).await?;
    Ok(annotation.as_text(problem.as_ref()))
}

pub async fn list_for_submission(
    pool: &PgPool,
    submission_id: i64,
) -> Result<Vec<Annotation>, ServiceError> {
    let annotations = repositories::annotations::list_by_submission(pool, submission_id).await?;
    Ok(annotations)
}

pub async fn find_annotation(pool: &PgPool, id: i64) -> Result<Annotation, ServiceError> {
    repositories::annotations::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ServiceError::not_found(format!("annotation {id}")))
}

fn create_params<'a>(
    input: &'a NewAnnotation,
    submission_id: i64,
    group_key: Option<&'a str>,
) -> CreateAnnotation<'a> {
    CreateAnnotation {
        submission_id,
        problem_id: input.problem_id,
        filename: input.filename.trim(),
        comment: &input.comment,
        value: input.value,
        line: input.line,
        position: input.position,
        submitted_by: input.submitted_by.trim(),
        shared_comment: input.shared_comment,
        global_comment: input.global_comment,
        group_key,
        created_at: primitive_now_utc(),
    }
}
