use sqlx::PgExecutor;

use crate::db::models::Problem;

pub(crate) const COLUMNS: &str = "\
    id, assessment_id, name, description, max_score, optional, created_at, updated_at";

pub(crate) async fn find_by_id<'e, E>(executor: E, id: i64) -> Result<Option<Problem>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Problem>(&format!("SELECT {COLUMNS} FROM problems WHERE id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await
}
