use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;
use uuid::Uuid;

use crate::database::relationship_repo;
use crate::database::store::{AtomicUnit, RelationshipStore};
use crate::database::StoreError;
use crate::models::{NewRelationship, Relationship, RelationshipFilter, RelationshipKind};

/// [`RelationshipStore`] over the `user_relationships` table.
#[derive(Debug, Clone)]
pub struct SqliteRelationshipStore {
    pool: SqlitePool,
}

impl SqliteRelationshipStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Open transaction; rolled back by sqlx when dropped uncommitted.
pub struct SqliteUnit {
    tx: Transaction<'static, Sqlite>,
}

fn insert_error(err: sqlx::Error, new: NewRelationship<'_>) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict {
            requestor: new.requestor_email.to_string(),
            target: new.target_email.to_string(),
            kind: new.kind,
        },
        _ => StoreError::Database(err),
    }
}

impl AtomicUnit for SqliteUnit {
    async fn insert_relationship(&mut self, new: NewRelationship<'_>) -> Result<(), StoreError> {
        let id = Uuid::new_v4().to_string();
        relationship_repo::insert_relationship(&mut *self.tx, &id, new, Utc::now())
            .await
            .map_err(|e| insert_error(e, new))?;
        Ok(())
    }

    async fn delete_relationships(&mut self, requestor: &str, target: &str) -> Result<u64, StoreError> {
        Ok(relationship_repo::delete_relationships(&mut *self.tx, requestor, target).await?)
    }

    async fn delete_relationship_kind(
        &mut self,
        requestor: &str,
        target: &str,
        kind: RelationshipKind,
    ) -> Result<u64, StoreError> {
        Ok(
            relationship_repo::delete_relationship_kind(&mut *self.tx, requestor, target, kind)
                .await?,
        )
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

impl RelationshipStore for SqliteRelationshipStore {
    type Unit = SqliteUnit;

    async fn begin(&self) -> Result<SqliteUnit, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(SqliteUnit { tx })
    }

    async fn find_relationships(
        &self,
        filter: RelationshipFilter<'_>,
    ) -> Result<Vec<Relationship>, StoreError> {
        debug!(?filter, "find_relationships");
        let rows = relationship_repo::find_relationships(&self.pool, filter).await?;
        rows.into_iter()
            .map(|row| Relationship::try_from(row).map_err(StoreError::from))
            .collect()
    }

    async fn insert_relationship(&self, new: NewRelationship<'_>) -> Result<(), StoreError> {
        let id = Uuid::new_v4().to_string();
        relationship_repo::insert_relationship(&self.pool, &id, new, Utc::now())
            .await
            .map_err(|e| insert_error(e, new))?;
        Ok(())
    }

    async fn delete_relationships(&self, requestor: &str, target: &str) -> Result<u64, StoreError> {
        Ok(relationship_repo::delete_relationships(&self.pool, requestor, target).await?)
    }
}
