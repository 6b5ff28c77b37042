use std::str::FromStr;

use thiserror::Error;

/// What befriending does with an existing subscription between the pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FriendshipPolicy {
    /// Insert the two FRIEND rows and leave any SUBSCRIBER row in place.
    #[default]
    Insert,
    /// Replace SUBSCRIBER rows in both directions with the friendship.
    PromoteSubscription,
}

/// What blocking an already-blocked pair does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReblockPolicy {
    /// Redo the cleanup and insert the BLOCK row again.
    #[default]
    Idempotent,
    /// Fail with `ALREADY_BEEN_BLOCKED`.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown reblock policy {0:?}, expected \"idempotent\" or \"reject\"")]
pub struct UnknownReblockPolicy(pub String);

impl FromStr for ReblockPolicy {
    type Err = UnknownReblockPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idempotent" => Ok(Self::Idempotent),
            "reject" => Ok(Self::Reject),
            _ => Err(UnknownReblockPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationshipPolicy {
    pub friendship: FriendshipPolicy,
    pub reblock: ReblockPolicy,
}
