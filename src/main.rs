//! # SCOURT Sync Entry Point
//!
//! Loads configuration, prepares the database and serves the sync API.

use anyhow::Context;
use migration::{Migrator, MigratorTrait};
use scourt_sync::{config::ConfigLoader, db, server::run_server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::new().load().context("loading configuration")?;

    telemetry::init_tracing(&config).context("initializing tracing")?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    Migrator::up(&db, None).await.context("running migrations")?;

    run_server(config, db).await
}
