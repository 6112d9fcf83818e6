//! Applies the permission store schema migrations and exits.

#![forbid(unsafe_code)]

use scopegate_core::AppError;
use scopegate_infrastructure::{MIGRATOR, StoreConfig, connect_and_migrate};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = StoreConfig::from_env()?;
    let pool = connect_and_migrate(&config).await?;

    info!(
        migrations = MIGRATOR.iter().count(),
        "scopegate-migrate finished"
    );
    pool.close().await;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
