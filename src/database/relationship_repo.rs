use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use crate::models::{NewRelationship, RelationshipFilter, RelationshipKind, RelationshipRow};

const SQL_INSERT_RELATIONSHIP: &str = r#"
INSERT INTO user_relationships (
  id,
  requestor_email,
  target_email,
  type,
  created_at,
  updated_at
) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
"#;

pub const SQL_FIND_RELATIONSHIPS: &str = r#"
SELECT
    id,
    requestor_email,
    target_email,
    type AS kind,
    created_at,
    updated_at
FROM user_relationships
WHERE (?1 IS NULL OR requestor_email = ?1)
  AND (?2 IS NULL OR target_email = ?2)
  AND (?3 IS NULL OR type = ?3)
ORDER BY created_at, rowid
"#;

const SQL_DELETE_RELATIONSHIPS: &str = r#"
DELETE FROM user_relationships
WHERE requestor_email = ?1
  AND target_email = ?2
"#;

const SQL_DELETE_RELATIONSHIP_KIND: &str = r#"
DELETE FROM user_relationships
WHERE requestor_email = ?1
  AND target_email = ?2
  AND type = ?3
"#;

pub async fn insert_relationship<'e, E>(
    executor: E,
    id: &str,
    new: NewRelationship<'_>,
    now: DateTime<Utc>,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_INSERT_RELATIONSHIP)
        .bind(id)
        .bind(new.requestor_email)
        .bind(new.target_email)
        .bind(new.kind.as_str())
        .bind(now)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

pub async fn find_relationships<'e, E>(
    executor: E,
    filter: RelationshipFilter<'_>,
) -> sqlx::Result<Vec<RelationshipRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, RelationshipRow>(SQL_FIND_RELATIONSHIPS)
        .bind(filter.requestor)
        .bind(filter.target)
        .bind(filter.kind.map(RelationshipKind::as_str))
        .fetch_all(executor)
        .await
}

pub async fn delete_relationships<'e, E>(
    executor: E,
    requestor_email: &str,
    target_email: &str,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_DELETE_RELATIONSHIPS)
        .bind(requestor_email)
        .bind(target_email)
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}

pub async fn delete_relationship_kind<'e, E>(
    executor: E,
    requestor_email: &str,
    target_email: &str,
    kind: RelationshipKind,
) -> sqlx::Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let res = sqlx::query(SQL_DELETE_RELATIONSHIP_KIND)
        .bind(requestor_email)
        .bind(target_email)
        .bind(kind.as_str())
        .execute(executor)
        .await?;
    Ok(res.rows_affected())
}
