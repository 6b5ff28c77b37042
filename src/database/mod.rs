pub mod error;
pub mod memory_store;
pub mod relationship_repo;
pub mod schema;
pub mod sqlite_store;
pub mod store;

pub use error::StoreError;
pub use memory_store::MemoryRelationshipStore;
pub use sqlite_store::SqliteRelationshipStore;
pub use store::{AtomicUnit, RelationshipStore};
