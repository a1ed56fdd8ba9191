//! Connection pool and embedded migrations

use std::time::Duration;

use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

use crate::{
    config::DatabaseConfig,
    error::{AppResult, DbResultExt},
};

/// Schema migrations shipped with the crate
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Create the PostgreSQL connection pool
pub async fn connect(config: &DatabaseConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
        .op("connect to database")
}
