pub mod relationship;

pub use relationship::{
    NewRelationship, Relationship, RelationshipFilter, RelationshipKind, RelationshipRow,
    UnknownRelationshipKind,
};
