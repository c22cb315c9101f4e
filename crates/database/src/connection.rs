use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;
use std::time::Duration;
use tracing::info;

/// Establishes a connection pool to the PostgreSQL database.
///
/// The connection string is read from `DATABASE_URL`, which may come from a
/// `.env` file. Pool sizing comes from the `[database]` config section.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    // A missing .env file is fine as long as the variable is set some other way.
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .map_err(|_e| DbError::ConnectionConfigError("DATABASE_URL must be set.".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect(&database_url)
        .await?;

    info!(max_connections = settings.max_connections, "Connected to PostgreSQL.");
    Ok(pool)
}

/// Applies any pending migrations from `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations are up to date.");
    Ok(())
}
