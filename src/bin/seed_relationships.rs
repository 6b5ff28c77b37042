use anyhow::Context;
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;

use friends_management::config::{self, AppConfig};
use friends_management::database::{schema, SqliteRelationshipStore};
use friends_management::services::seed_service;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    config::init_tracing();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("cannot connect to {}", config.database_url))?;
    schema::ensure_schema(&pool).await?;

    let store = SqliteRelationshipStore::new(pool);
    let report = seed_service::seed_demo_relationships(&store)
        .await
        .context("seeding failed")?;

    println!(
        "seed: inserted={}, skipped={}",
        report.inserted, report.skipped
    );
    Ok(())
}
