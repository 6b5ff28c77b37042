pub mod mentions;
pub mod policy;
pub mod relationship_error;
pub mod relationship_service;
pub mod seed_service;

pub use policy::{FriendshipPolicy, ReblockPolicy, RelationshipPolicy};
pub use relationship_error::{RelationshipError, Step};
pub use relationship_service::{FriendList, RelationshipService};
