use sqlx::SqlitePool;
use tracing::debug;

const SQL_CREATE_USER_RELATIONSHIPS: &str = r#"
CREATE TABLE IF NOT EXISTS user_relationships (
    id              TEXT PRIMARY KEY NOT NULL,
    requestor_email TEXT NOT NULL,
    target_email    TEXT NOT NULL,
    type            TEXT NOT NULL CHECK (type IN ('FRIEND', 'BLOCK', 'SUBSCRIBER')),
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
)
"#;

// Rejects a racing duplicate insert instead of double-inserting.
const SQL_CREATE_PAIR_TYPE_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_user_relationships_pair_type
    ON user_relationships (requestor_email, target_email, type)
"#;

const SQL_CREATE_TARGET_TYPE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_user_relationships_target_type
    ON user_relationships (target_email, type)
"#;

pub async fn ensure_schema(pool: &SqlitePool) -> sqlx::Result<()> {
    for statement in [
        SQL_CREATE_USER_RELATIONSHIPS,
        SQL_CREATE_PAIR_TYPE_INDEX,
        SQL_CREATE_TARGET_TYPE_INDEX,
    ] {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("user_relationships schema ready");
    Ok(())
}
