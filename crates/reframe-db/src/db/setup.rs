//! Connection pool and schema bootstrap

use anyhow::{Context, Result};
use reframe_core::Config;
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::path::Path;
use std::time::Duration;

/// Open the pool and bring the conversion tables up to date.
///
/// Fails before any bucket access when the database is unreachable or a migration does not apply.
pub async fn setup_database(config: &Config) -> Result<PgPool> {
    let options: PgConnectOptions = config
        .database_url
        .parse()
        .context("DATABASE_URL is not a valid PostgreSQL connection string")?;

    tracing::info!(
        db.host = options.get_host(),
        db.port = options.get_port(),
        db.name = options.get_database().unwrap_or_default(),
        "Connecting to conversion settings database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_timeout_seconds))
        .connect_with(options)
        .await
        .with_context(|| {
            format!(
                "Could not open a connection within {}s",
                config.db_timeout_seconds
            )
        })?;

    apply_migrations(&pool).await?;
    Ok(pool)
}

async fn apply_migrations(pool: &PgPool) -> Result<()> {
    let migrations_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../migrations");
    let migrator = Migrator::new(migrations_dir.clone())
        .await
        .with_context(|| format!("Could not read migrations from {}", migrations_dir.display()))?;

    migrator
        .run(pool)
        .await
        .context("Could not create the conversion settings and provenance tables")?;

    tracing::info!(migrations = migrator.iter().count(), "Conversion tables ready");
    Ok(())
}
