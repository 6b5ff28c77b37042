use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    Friend,
    Block,
    Subscriber,
}

impl RelationshipKind {
    /// Text stored in the `type` column.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Friend => "FRIEND",
            Self::Block => "BLOCK",
            Self::Subscriber => "SUBSCRIBER",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown relationship type: {0:?}")]
pub struct UnknownRelationshipKind(pub String);

impl FromStr for RelationshipKind {
    type Err = UnknownRelationshipKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FRIEND" => Ok(Self::Friend),
            "BLOCK" => Ok(Self::Block),
            "SUBSCRIBER" => Ok(Self::Subscriber),
            other => Err(UnknownRelationshipKind(other.to_string())),
        }
    }
}

/// Raw `user_relationships` row as SQLite hands it back.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RelationshipRow {
    pub id: String,
    pub requestor_email: String,
    pub target_email: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One directed relationship fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub id: String,
    pub requestor_email: String,
    pub target_email: String,
    pub kind: RelationshipKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RelationshipRow> for Relationship {
    type Error = UnknownRelationshipKind;

    fn try_from(row: RelationshipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: row.kind.parse()?,
            id: row.id,
            requestor_email: row.requestor_email,
            target_email: row.target_email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewRelationship<'a> {
    pub requestor_email: &'a str,
    pub target_email: &'a str,
    pub kind: RelationshipKind,
}

impl<'a> NewRelationship<'a> {
    pub const fn new(requestor_email: &'a str, target_email: &'a str, kind: RelationshipKind) -> Self {
        Self {
            requestor_email,
            target_email,
            kind,
        }
    }

    pub const fn friend(requestor_email: &'a str, target_email: &'a str) -> Self {
        Self::new(requestor_email, target_email, RelationshipKind::Friend)
    }

    pub const fn block(requestor_email: &'a str, target_email: &'a str) -> Self {
        Self::new(requestor_email, target_email, RelationshipKind::Block)
    }

    pub const fn subscriber(requestor_email: &'a str, target_email: &'a str) -> Self {
        Self::new(requestor_email, target_email, RelationshipKind::Subscriber)
    }
}

/// Conjunction of optional constraints; `None` matches anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationshipFilter<'a> {
    pub requestor: Option<&'a str>,
    pub target: Option<&'a str>,
    pub kind: Option<RelationshipKind>,
}

impl<'a> RelationshipFilter<'a> {
    pub const fn from_requestor(requestor: &'a str) -> Self {
        Self {
            requestor: Some(requestor),
            target: None,
            kind: None,
        }
    }

    pub const fn to_target(target: &'a str) -> Self {
        Self {
            requestor: None,
            target: Some(target),
            kind: None,
        }
    }

    pub const fn between(requestor: &'a str, target: &'a str) -> Self {
        Self {
            requestor: Some(requestor),
            target: Some(target),
            kind: None,
        }
    }

    pub const fn of_kind(mut self, kind: RelationshipKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn matches(&self, rel: &Relationship) -> bool {
        self.requestor.map_or(true, |r| rel.requestor_email == r)
            && self.target.map_or(true, |t| rel.target_email == t)
            && self.kind.map_or(true, |k| rel.kind == k)
    }
}
