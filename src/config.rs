use std::env;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::services::policy::{
    FriendshipPolicy, ReblockPolicy, RelationshipPolicy, UnknownReblockPolicy,
};

const DEFAULT_DATABASE_URL: &str = "sqlite://friends_management.db?mode=rwc";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("REBLOCK_POLICY: {0}")]
    ReblockPolicy(#[from] UnknownReblockPolicy),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub policy: RelationshipPolicy,
}

impl AppConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = lookup("PORT")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let db_max_connections = lookup("DB_MAX_CONNECTIONS")
            .and_then(|v| v.trim().parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);

        let promotes = lookup("FRIENDSHIP_PROMOTES_SUBSCRIPTION").is_some_and(|v| {
            let v = v.trim();
            v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
        });
        let friendship = if promotes {
            FriendshipPolicy::PromoteSubscription
        } else {
            FriendshipPolicy::Insert
        };
        let reblock = match lookup("REBLOCK_POLICY") {
            Some(raw) => raw.parse()?,
            None => ReblockPolicy::default(),
        };

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections,
            policy: RelationshipPolicy {
                friendship,
                reblock,
            },
        })
    }
}

/// Installs the global `tracing` subscriber; `RUST_LOG` overrides the
/// default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
