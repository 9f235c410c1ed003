//! Hound retention sweeper.
//!
//! Trims every entity's action history to the process-wide default limit. Runs once, or
//! periodically when `HOUND_SWEEP_INTERVAL_SECONDS` is set. `hound-sweeper migrate`
//! applies the action store schema and exits.

#![forbid(unsafe_code)]

mod sweep_runner;
mod sweeper_config;

use std::sync::Arc;

use hound_application::RetentionEnforcer;
use hound_core::{AppError, AppResult};
use hound_infrastructure::{MIGRATOR, PostgresActionRepository};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::sweep_runner::run_sweep_pass;
use crate::sweeper_config::SweeperConfig;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = SweeperConfig::load()?;
    let pool = connect_pool(config.database_url.as_str()).await?;

    if config.migrate_only {
        MIGRATOR
            .run(&pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;
        info!("action store migrations applied");
        return Ok(());
    }

    let limit = config.sweep_limit()?;
    let enforcer = RetentionEnforcer::new(Arc::new(PostgresActionRepository::new(pool)));

    info!(
        limit = limit.get(),
        interval_seconds = config.interval.map(|interval| interval.as_secs()),
        "hound-sweeper started"
    );

    loop {
        run_sweep_pass(&enforcer, limit, config.interval).await?;

        let Some(interval) = config.interval else {
            return Ok(());
        };
        tokio::time::sleep(interval).await;
    }
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
