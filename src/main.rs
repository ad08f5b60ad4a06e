//! # Dispatch Service Entry Point
//!
//! Loads configuration, runs migrations, starts the retention scheduler,
//! and serves the API.

use dispatch::retention::RetentionScheduler;
use dispatch::{config::ConfigLoader, db, server::run_server, telemetry};
use migration::Migrator;
use sea_orm_migration::MigratorTrait;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::new().load()?;
    telemetry::init_tracing(&config)?;
    tracing::info!(profile = %config.profile, "configuration loaded");

    let db = db::init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    let shutdown = CancellationToken::new();

    let scheduler = RetentionScheduler::new(db.clone(), config.retention.clone());
    let scheduler_handle = {
        let token = shutdown.clone();
        tokio::spawn(async move { scheduler.run(token).await })
    };

    {
        let token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown signal received");
                token.cancel();
            }
        });
    }

    let result = run_server(config, db).await;

    shutdown.cancel();
    let _ = scheduler_handle.await;

    result
}
