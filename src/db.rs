use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{error, info};

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// Applies pending migrations. Startup must not continue past a failure here.
pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    if let Err(e) = sqlx::migrate!("./migrations").run(db).await {
        error!(error = %e, "migration failed");
        return Err(e).context("run migrations");
    }
    info!("migrations applied");
    Ok(())
}
