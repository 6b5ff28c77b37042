use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, warn};

use friends_management::config::{self, AppConfig};
use friends_management::database::{schema, SqliteRelationshipStore};
use friends_management::services::RelationshipService;
use friends_management::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // 1. Logging and configuration
    config::init_tracing();
    let config = AppConfig::from_env().context("invalid configuration")?;

    // 2. Database
    info!("Connecting to database: {}", config.database_url);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .with_context(|| format!("cannot connect to {}", config.database_url))?;
    schema::ensure_schema(&pool)
        .await
        .context("cannot create user_relationships schema")?;

    // 3. Rules and routes
    let store = SqliteRelationshipStore::new(pool);
    let service = RelationshipService::with_policy(store, config.policy);
    info!(policy = ?config.policy, "relationship rules ready");
    let app = web::build_router(service);

    // 4. Serve, falling back to the next port if the configured one is taken
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("cannot parse HOST/PORT")?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback = SocketAddr::new(addr.ip(), addr.port().saturating_add(1));
            warn!("Cannot bind {}: {}. Trying fallback {}", addr, e, fallback);
            tokio::net::TcpListener::bind(fallback)
                .await
                .with_context(|| format!("cannot bind fallback {}", fallback))?
        }
    };

    info!("🚀 Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
