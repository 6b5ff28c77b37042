//! Persistence contract consumed by the relationship rules.
//!
//! Multi-step mutations go through an [`AtomicUnit`]: everything staged on a
//! unit becomes visible together on [`AtomicUnit::commit`], and a unit that is
//! dropped without committing leaves the store untouched. Early returns via
//! `?` are therefore the rollback path.

use std::future::Future;

use crate::database::StoreError;
use crate::models::{NewRelationship, Relationship, RelationshipFilter, RelationshipKind};

pub trait AtomicUnit: Send {
    fn insert_relationship(
        &mut self,
        new: NewRelationship<'_>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes every row for the exact ordered pair, whatever its kind.
    fn delete_relationships(
        &mut self,
        requestor: &str,
        target: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn delete_relationship_kind(
        &mut self,
        requestor: &str,
        target: &str,
        kind: RelationshipKind,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

pub trait RelationshipStore: Clone + Send + Sync + 'static {
    type Unit: AtomicUnit;

    fn begin(&self) -> impl Future<Output = Result<Self::Unit, StoreError>> + Send;

    /// Rows matching `filter`, oldest first; ties keep insertion order.
    fn find_relationships(
        &self,
        filter: RelationshipFilter<'_>,
    ) -> impl Future<Output = Result<Vec<Relationship>, StoreError>> + Send;

    fn insert_relationship(
        &self,
        new: NewRelationship<'_>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete_relationships(
        &self,
        requestor: &str,
        target: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// All-or-nothing insert of several rows.
    fn insert_relationships_atomic(
        &self,
        rows: &[NewRelationship<'_>],
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        async move {
            let mut unit = self.begin().await?;
            for new in rows {
                unit.insert_relationship(*new).await?;
            }
            unit.commit().await
        }
    }

    fn exists(
        &self,
        filter: RelationshipFilter<'_>,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        async move { Ok(!self.find_relationships(filter).await?.is_empty()) }
    }
}
