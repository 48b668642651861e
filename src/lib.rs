pub mod adapters;
pub mod cache;
pub mod catalog;
pub mod classifier;
mod composer;
pub mod db;
pub mod engine;
pub mod errors;
pub mod matcher;
pub mod models;
pub mod server;
pub mod suggest;
mod synthesizer;
pub mod tools;
mod validation;

#[cfg(test)]
mod test_support;

pub use crate::adapters::{DashboardStore, QueryExecutor, ReportStore};
pub use crate::engine::DashboardEngine;
pub use crate::errors::{AppError, AppResult};

use crate::adapters::sqlite::SqliteQueryExecutor;
use crate::db::Database;
use std::path::Path;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// Opens the state and source databases and serves tool calls on stdin
/// until it closes.
pub async fn run(state_dir: &Path, source_db: &Path) -> AppResult<()> {
    std::fs::create_dir_all(state_dir)?;
    init_tracing(state_dir).map_err(AppError::Internal)?;

    let database = Arc::new(Database::new(&state_dir.join("dashboard-synth.sqlite"))?);
    let settings = database.get_settings()?;
    let executor = Arc::new(SqliteQueryExecutor::open(
        database.clone(),
        source_db,
        settings.max_result_rows,
    )?);
    tracing::info!(
        state_db = %database.path().display(),
        source_db = %source_db.display(),
        "dashboard engine starting"
    );

    let engine = DashboardEngine::new(database.clone(), database, executor, settings);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    server::serve(&engine, stdin, tokio::io::stdout()).await?;

    tracing::info!("input closed; dashboard engine stopping");
    Ok(())
}

fn init_tracing(state_dir: &Path) -> Result<(), String> {
    let log_dir = state_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "dashboard-synth.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}

pub(crate) fn to_client_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}
