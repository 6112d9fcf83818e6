use std::env;

use scopegate_core::{AppError, AppResult};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Embedded schema migrations for the permission store.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connection settings for the PostgreSQL permission store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Connection string.
    pub database_url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
}

impl StoreConfig {
    /// Loads settings from `DATABASE_URL` and `DATABASE_MAX_CONNECTIONS`.
    pub fn from_env() -> AppResult<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Validation("DATABASE_URL is required".to_owned()))?;
        if database_url.trim().is_empty() {
            return Err(AppError::Validation(
                "DATABASE_URL must not be empty".to_owned(),
            ));
        }

        let max_connections = parse_max_connections(env::var("DATABASE_MAX_CONNECTIONS").ok())?;

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

fn parse_max_connections(value: Option<String>) -> AppResult<u32> {
    let Some(value) = value.filter(|value| !value.trim().is_empty()) else {
        return Ok(DEFAULT_MAX_CONNECTIONS);
    };

    match value.trim().parse::<u32>() {
        Ok(0) => Err(AppError::Validation(
            "DATABASE_MAX_CONNECTIONS must be greater than zero".to_owned(),
        )),
        Ok(max_connections) => Ok(max_connections),
        Err(error) => Err(AppError::Validation(format!(
            "invalid DATABASE_MAX_CONNECTIONS: {error}"
        ))),
    }
}

/// Opens a connection pool and applies pending migrations.
pub async fn connect_and_migrate(config: &StoreConfig) -> AppResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Storage(format!("failed to connect to database: {error}")))?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to run migrations: {error}")))?;

    info!(
        max_connections = config.max_connections,
        "permission store migrations applied"
    );

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use scopegate_core::AppError;

    use super::{DEFAULT_MAX_CONNECTIONS, parse_max_connections};

    #[test]
    fn max_connections_defaults_when_unset_or_blank() {
        assert_eq!(parse_max_connections(None).ok(), Some(DEFAULT_MAX_CONNECTIONS));
        assert_eq!(
            parse_max_connections(Some("  ".to_owned())).ok(),
            Some(DEFAULT_MAX_CONNECTIONS)
        );
    }

    #[test]
    fn max_connections_parses_positive_values() {
        assert_eq!(parse_max_connections(Some(" 4 ".to_owned())).ok(), Some(4));
    }

    #[test]
    fn max_connections_rejects_zero_and_garbage() {
        assert!(matches!(
            parse_max_connections(Some("0".to_owned())),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_max_connections(Some("many".to_owned())),
            Err(AppError::Validation(_))
        ));
    }
}
