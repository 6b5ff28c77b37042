//! In-memory [`RelationshipStore`]: an arena of rows in insertion order with
//! a unique index on `(requestor, target, kind)`.
//!
//! Units stage their operations against a private copy of the arena and
//! replay them onto the shared arena at commit time, so a failed or dropped
//! unit never leaks partial writes. Faults can be injected per ordered pair
//! to exercise the failure paths of the rules.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use uuid::Uuid;

use crate::database::store::{AtomicUnit, RelationshipStore};
use crate::database::StoreError;
use crate::models::{NewRelationship, Relationship, RelationshipFilter, RelationshipKind};

type RelationshipKey = (String, String, RelationshipKind);
type PairKey = (String, String);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Default)]
struct Arena {
    rows: BTreeMap<u64, Relationship>,
    index: HashMap<RelationshipKey, u64>,
    next_slot: u64,
}

impl Arena {
    fn insert(&mut self, rel: Relationship) -> Result<(), StoreError> {
        let key = (
            rel.requestor_email.clone(),
            rel.target_email.clone(),
            rel.kind,
        );
        if self.index.contains_key(&key) {
            return Err(StoreError::Conflict {
                requestor: rel.requestor_email,
                target: rel.target_email,
                kind: rel.kind,
            });
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.index.insert(key, slot);
        self.rows.insert(slot, rel);
        Ok(())
    }

    fn delete(&mut self, requestor: &str, target: &str, kind: Option<RelationshipKind>) -> u64 {
        let kinds = match kind {
            Some(k) => vec![k],
            None => vec![
                RelationshipKind::Friend,
                RelationshipKind::Block,
                RelationshipKind::Subscriber,
            ],
        };
        let mut deleted = 0;
        for kind in kinds {
            let key = (requestor.to_string(), target.to_string(), kind);
            if let Some(slot) = self.index.remove(&key) {
                self.rows.remove(&slot);
                deleted += 1;
            }
        }
        deleted
    }

    fn find(&self, filter: &RelationshipFilter<'_>) -> Vec<Relationship> {
        self.rows
            .values()
            .filter(|rel| filter.matches(rel))
            .cloned()
            .collect()
    }

    fn apply(&mut self, op: &StagedOp) -> Result<u64, StoreError> {
        match op {
            StagedOp::Insert(rel) => self.insert(rel.clone()).map(|()| 1),
            StagedOp::Delete {
                requestor,
                target,
                kind,
            } => Ok(self.delete(requestor, target, *kind)),
        }
    }
}

#[derive(Debug, Clone)]
enum StagedOp {
    Insert(Relationship),
    Delete {
        requestor: String,
        target: String,
        kind: Option<RelationshipKind>,
    },
}

#[derive(Debug, Default)]
struct Faults {
    inserts: HashSet<PairKey>,
    deletes: HashSet<PairKey>,
}

impl Faults {
    fn check_insert(&self, requestor: &str, target: &str) -> Result<(), StoreError> {
        if self
            .inserts
            .contains(&(requestor.to_string(), target.to_string()))
        {
            return Err(StoreError::Unavailable(format!(
                "insert {requestor} -> {target} rejected"
            )));
        }
        Ok(())
    }

    fn check_delete(&self, requestor: &str, target: &str) -> Result<(), StoreError> {
        if self
            .deletes
            .contains(&(requestor.to_string(), target.to_string()))
        {
            return Err(StoreError::Unavailable(format!(
                "delete {requestor} -> {target} rejected"
            )));
        }
        Ok(())
    }
}

fn new_row(new: NewRelationship<'_>) -> Relationship {
    let now = Utc::now();
    Relationship {
        id: Uuid::new_v4().to_string(),
        requestor_email: new.requestor_email.to_string(),
        target_email: new.target_email.to_string(),
        kind: new.kind,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRelationshipStore {
    arena: Arc<Mutex<Arena>>,
    faults: Arc<Mutex<Faults>>,
}

impl MemoryRelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every insert for the ordered pair fail with [`StoreError::Unavailable`].
    pub fn fail_inserts_for(&self, requestor: &str, target: &str) {
        lock(&self.faults)
            .inserts
            .insert((requestor.to_string(), target.to_string()));
    }

    /// Makes every delete for the ordered pair fail with [`StoreError::Unavailable`].
    pub fn fail_deletes_for(&self, requestor: &str, target: &str) {
        lock(&self.faults)
            .deletes
            .insert((requestor.to_string(), target.to_string()));
    }

    pub fn clear_faults(&self) {
        let mut faults = lock(&self.faults);
        faults.inserts.clear();
        faults.deletes.clear();
    }

    /// Number of committed rows.
    pub fn len(&self) -> usize {
        lock(&self.arena).rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every committed row, in insertion order.
    pub fn snapshot(&self) -> Vec<Relationship> {
        lock(&self.arena).rows.values().cloned().collect()
    }
}

pub struct MemoryUnit {
    arena: Arc<Mutex<Arena>>,
    faults: Arc<Mutex<Faults>>,
    working: Arena,
    staged: Vec<StagedOp>,
}

impl MemoryUnit {
    fn stage(&mut self, op: StagedOp) -> Result<u64, StoreError> {
        let affected = self.working.apply(&op)?;
        self.staged.push(op);
        Ok(affected)
    }
}

impl AtomicUnit for MemoryUnit {
    async fn insert_relationship(&mut self, new: NewRelationship<'_>) -> Result<(), StoreError> {
        lock(&self.faults).check_insert(new.requestor_email, new.target_email)?;
        self.stage(StagedOp::Insert(new_row(new)))?;
        Ok(())
    }

    async fn delete_relationships(&mut self, requestor: &str, target: &str) -> Result<u64, StoreError> {
        lock(&self.faults).check_delete(requestor, target)?;
        self.stage(StagedOp::Delete {
            requestor: requestor.to_string(),
            target: target.to_string(),
            kind: None,
        })
    }

    async fn delete_relationship_kind(
        &mut self,
        requestor: &str,
        target: &str,
        kind: RelationshipKind,
    ) -> Result<u64, StoreError> {
        lock(&self.faults).check_delete(requestor, target)?;
        self.stage(StagedOp::Delete {
            requestor: requestor.to_string(),
            target: target.to_string(),
            kind: Some(kind),
        })
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut shared = lock(&self.arena);
        // Replay onto the latest committed state; another unit may have
        // committed since this one began.
        let mut next = shared.clone();
        for op in &self.staged {
            next.apply(op)?;
        }
        *shared = next;
        Ok(())
    }
}

impl RelationshipStore for MemoryRelationshipStore {
    type Unit = MemoryUnit;

    async fn begin(&self) -> Result<MemoryUnit, StoreError> {
        let working = lock(&self.arena).clone();
        Ok(MemoryUnit {
            arena: Arc::clone(&self.arena),
            faults: Arc::clone(&self.faults),
            working,
            staged: Vec::new(),
        })
    }

    async fn find_relationships(
        &self,
        filter: RelationshipFilter<'_>,
    ) -> Result<Vec<Relationship>, StoreError> {
        Ok(lock(&self.arena).find(&filter))
    }

    async fn insert_relationship(&self, new: NewRelationship<'_>) -> Result<(), StoreError> {
        lock(&self.faults).check_insert(new.requestor_email, new.target_email)?;
        lock(&self.arena).insert(new_row(new))
    }

    async fn delete_relationships(&self, requestor: &str, target: &str) -> Result<u64, StoreError> {
        lock(&self.faults).check_delete(requestor, target)?;
        Ok(lock(&self.arena).delete(requestor, target, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_key_is_a_conflict() {
        let store = MemoryRelationshipStore::new();
        store
            .insert_relationship(NewRelationship::subscriber("a@x.com", "b@x.com"))
            .await
            .unwrap();

        let err = store
            .insert_relationship(NewRelationship::subscriber("a@x.com", "b@x.com"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        // Same pair, other kind, is a different key.
        store
            .insert_relationship(NewRelationship::friend("a@x.com", "b@x.com"))
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn staged_work_is_invisible_until_commit() {
        let store = MemoryRelationshipStore::new();
        let mut unit = store.begin().await.unwrap();
        unit.insert_relationship(NewRelationship::friend("a@x.com", "b@x.com"))
            .await
            .unwrap();
        assert!(store.is_empty());

        unit.commit().await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn dropped_unit_rolls_back() {
        let store = MemoryRelationshipStore::new();
        store
            .insert_relationship(NewRelationship::friend("a@x.com", "b@x.com"))
            .await
            .unwrap();

        {
            let mut unit = store.begin().await.unwrap();
            assert_eq!(unit.delete_relationships("a@x.com", "b@x.com").await.unwrap(), 1);
            unit.insert_relationship(NewRelationship::block("a@x.com", "b@x.com"))
                .await
                .unwrap();
        }

        let rows = store.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, RelationshipKind::Friend);
    }

    #[tokio::test]
    async fn commit_detects_conflict_from_a_concurrent_unit() {
        let store = MemoryRelationshipStore::new();
        let mut first = store.begin().await.unwrap();
        let mut second = store.begin().await.unwrap();

        first
            .insert_relationship(NewRelationship::friend("a@x.com", "b@x.com"))
            .await
            .unwrap();
        second
            .insert_relationship(NewRelationship::friend("a@x.com", "b@x.com"))
            .await
            .unwrap();

        first.commit().await.unwrap();
        assert!(second.commit().await.unwrap_err().is_conflict());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn injected_faults_fail_matching_pairs_only() {
        let store = MemoryRelationshipStore::new();
        store.fail_inserts_for("a@x.com", "b@x.com");

        let err = store
            .insert_relationship(NewRelationship::friend("a@x.com", "b@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        store
            .insert_relationship(NewRelationship::friend("b@x.com", "a@x.com"))
            .await
            .unwrap();

        store.clear_faults();
        store
            .insert_relationship(NewRelationship::friend("a@x.com", "b@x.com"))
            .await
            .unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn find_keeps_insertion_order() {
        let store = MemoryRelationshipStore::new();
        for target in ["c@x.com", "a@x.com", "b@x.com"] {
            store
                .insert_relationship(NewRelationship::friend("u@x.com", target))
                .await
                .unwrap();
        }

        let targets: Vec<_> = store
            .find_relationships(RelationshipFilter::from_requestor("u@x.com"))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.target_email)
            .collect();
        assert_eq!(targets, ["c@x.com", "a@x.com", "b@x.com"]);
    }
}
