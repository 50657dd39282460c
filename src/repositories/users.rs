use sqlx::PgExecutor;

use crate::db::models::User;

pub(crate) const COLUMNS: &str = "id, email, first_name, last_name, created_at, updated_at";

pub(crate) async fn find_by_email<'e, E>(
    executor: E,
    email: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(executor)
        .await
}
