pub(crate) mod core;
pub mod db;
pub(crate) mod repositories;
pub mod schemas;
pub mod services;

#[cfg(test)]
mod test_support;

use anyhow::Context;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::services::scoring::{self, RescoreSummary};

/// Recomputes every annotation-derived score, optionally for one assessment.
pub async fn run_rescore(assessment_id: Option<i64>) -> anyhow::Result<RescoreSummary> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    let db_pool = db::init_pool(&settings).await.context("Failed to connect to database")?;
    db::run_migrations(&db_pool).await.context("Failed to run migrations")?;

    let state = AppState::new(settings, db_pool);

    tracing::info!(
        environment = %state.settings().runtime().environment.as_str(),
        assessment_id = ?assessment_id,
        "Starting annotation rescore"
    );

    let summary = scoring::rescore_all(state.db(), assessment_id)
        .await
        .context("Failed to list annotated scores")?;

    state.db().close().await;
    Ok(summary)
}
