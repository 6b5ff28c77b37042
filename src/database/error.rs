use thiserror::Error;

use crate::models::{RelationshipKind, UnknownRelationshipKind};

/// Failure of the persistence layer, independent of which rule triggered it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("relationship {requestor} -> {target} ({kind}) already exists")]
    Conflict {
        requestor: String,
        target: String,
        kind: RelationshipKind,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    InvalidKind(#[from] UnknownRelationshipKind),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
