use thiserror::Error;

use crate::database::StoreError;

/// Store round-trip inside a rule, used to tag store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CheckBlocked,
    CheckFriends,
    CheckSubscribed,
    BeginTransaction,
    DeleteSubscription,
    CreateFirstFriendship,
    CreateSecondFriendship,
    CreateSubscription,
    DeleteTargetRelationships,
    DeleteRequestorRelationships,
    CreateBlock,
    CommitTransaction,
    ListFriendships,
    ListFirstFriendships,
    ListSecondFriendships,
    ListRecipientFriendships,
    ListSubscribers,
}

impl Step {
    pub const fn code(self) -> &'static str {
        match self {
            Self::CheckBlocked => "CHECK_TWO_USERS_BLOCK_EACH_OTHER_FAIL",
            Self::CheckFriends => "CHECK_TWO_USERS_ARE_FRIENDS_FAIL",
            Self::CheckSubscribed => "CHECK_IF_THE_REQUESTOR_ALREADY_SUBSCRIBE_FAIL",
            Self::BeginTransaction => "BEGIN_TRANSACTION_FAIL",
            Self::DeleteSubscription => "DELETE_SUBSCRIPTION_RELATIONSHIP_FAIL",
            Self::CreateFirstFriendship => "CREATE_FIRST_FRIENDSHIP_RELATION_FAILED",
            Self::CreateSecondFriendship => "CREATE_SECOND_FRIENDSHIP_RELATION_FAILED",
            Self::CreateSubscription => "CREATE_SUBSCRIPTION_FAILED",
            Self::DeleteTargetRelationships => "DELETE_TARGET_RELATIONSHIP_FAIL",
            Self::DeleteRequestorRelationships => "DELETE_REQUESTOR_RELATIONSHIP_FAIL",
            Self::CreateBlock => "CREATE_BLOCK_RELATIONSHIP_FAILED",
            Self::CommitTransaction => "COMMIT_TRANSACTION_FAIL",
            Self::ListFriendships => "GET_LIST_FRIENDSHIP_FAIL",
            Self::ListFirstFriendships => "GET_LIST_FRIENDSHIP_FOR_FIRST_EMAIL_FAIL",
            Self::ListSecondFriendships => "GET_LIST_FRIENDSHIP_FOR_SECOND_EMAIL_FAIL",
            Self::ListRecipientFriendships => "GET_LIST_FRIENDSHIP_EMAIL_FAIL",
            Self::ListSubscribers => "GET_LIST_SUBSCRIBER_EMAIL_FAIL",
        }
    }
}

#[derive(Debug, Error)]
pub enum RelationshipError {
    #[error("ONE_OF_YOU_BLOCK_EACH_OTHER")]
    Blocked,

    #[error("YOU_ALREADY_FRIENDS")]
    AlreadyFriends,

    #[error("YOU_ALREADY_SUBSCRIBED")]
    AlreadySubscribed,

    #[error("ALREADY_BEEN_BLOCKED")]
    AlreadyBlocked,

    #[error("{}: {}", .step.code(), .source)]
    Store {
        step: Step,
        #[source]
        source: StoreError,
    },
}

impl RelationshipError {
    /// Stable code callers can branch on; never includes the store detail.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Blocked => "ONE_OF_YOU_BLOCK_EACH_OTHER",
            Self::AlreadyFriends => "YOU_ALREADY_FRIENDS",
            Self::AlreadySubscribed => "YOU_ALREADY_SUBSCRIBED",
            Self::AlreadyBlocked => "ALREADY_BEEN_BLOCKED",
            Self::Store { step, .. } => step.code(),
        }
    }

    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Store { step, .. } => Some(*step),
            _ => None,
        }
    }
}

pub(crate) trait AtStep<T> {
    fn at(self, step: Step) -> Result<T, RelationshipError>;
}

impl<T> AtStep<T> for Result<T, StoreError> {
    fn at(self, step: Step) -> Result<T, RelationshipError> {
        self.map_err(|source| RelationshipError::Store { step, source })
    }
}
