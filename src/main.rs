//! Hydro Admin - database bootstrap
//!
//! Connects to PostgreSQL and applies the schema migrations.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hydro_admin::{config::AppConfig, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("hydro_admin={},sqlx=warn", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Hydro Admin v{}", env!("CARGO_PKG_VERSION"));

    let pool = db::connect(&config.database).await?;
    tracing::info!("Connected to database");

    db::MIGRATOR.run(&pool).await?;
    tracing::info!("Database migrations completed");

    pool.close().await;
    Ok(())
}
