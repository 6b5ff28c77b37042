//! Rules deciding which relationship transitions are legal and which rows
//! they create or remove.
//!
//! Preconditions are checked in a fixed order and the first failing one
//! determines the error. Mutations touching more than one row run inside a
//! single [`AtomicUnit`]; any store failure aborts the unit and is reported
//! with the [`Step`] that produced it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::store::{AtomicUnit, RelationshipStore};
use crate::database::StoreError;
use crate::models::{NewRelationship, RelationshipFilter, RelationshipKind};
use crate::services::mentions;
use crate::services::policy::{FriendshipPolicy, ReblockPolicy, RelationshipPolicy};
use crate::services::relationship_error::{AtStep, RelationshipError, Step};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendList {
    pub friends: Vec<String>,
    pub count: usize,
}

impl From<Vec<String>> for FriendList {
    fn from(friends: Vec<String>) -> Self {
        Self {
            count: friends.len(),
            friends,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelationshipService<S> {
    store: S,
    policy: RelationshipPolicy,
}

impl<S: RelationshipStore> RelationshipService<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, RelationshipPolicy::default())
    }

    pub fn with_policy(store: S, policy: RelationshipPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Makes `a` and `b` friends in both directions.
    pub async fn add_friendship(&self, a: &str, b: &str) -> Result<(), RelationshipError> {
        if self.blocked_either_way(a, b).await.at(Step::CheckBlocked)? {
            return Err(RelationshipError::Blocked);
        }

        let friends_filter = RelationshipFilter::between(a, b).of_kind(RelationshipKind::Friend);
        if self.store.exists(friends_filter).await.at(Step::CheckFriends)? {
            return Err(RelationshipError::AlreadyFriends);
        }

        let mut unit = self.store.begin().await.at(Step::BeginTransaction)?;
        if self.policy.friendship == FriendshipPolicy::PromoteSubscription {
            for (requestor, target) in [(a, b), (b, a)] {
                unit.delete_relationship_kind(requestor, target, RelationshipKind::Subscriber)
                    .await
                    .at(Step::DeleteSubscription)?;
            }
        }
        unit.insert_relationship(NewRelationship::friend(a, b))
            .await
            .at(Step::CreateFirstFriendship)?;
        unit.insert_relationship(NewRelationship::friend(b, a))
            .await
            .at(Step::CreateSecondFriendship)?;
        unit.commit().await.at(Step::CommitTransaction)?;

        info!(a, b, "friendship created");
        Ok(())
    }

    pub async fn list_friendships(&self, email: &str) -> Result<FriendList, RelationshipError> {
        let friends = self.friends_of(email).await.at(Step::ListFriendships)?;
        Ok(friends.into())
    }

    /// Friends shared by `a` and `b`, in `b`'s friend order.
    pub async fn list_common_friends(
        &self,
        a: &str,
        b: &str,
    ) -> Result<FriendList, RelationshipError> {
        if self.blocked_either_way(a, b).await.at(Step::CheckBlocked)? {
            return Err(RelationshipError::Blocked);
        }

        let first = self.friends_of(a).await.at(Step::ListFirstFriendships)?;
        let second = self.friends_of(b).await.at(Step::ListSecondFriendships)?;

        let lookup: HashSet<&str> = first.iter().map(String::as_str).collect();
        let mut seen = HashSet::new();
        let common: Vec<String> = second
            .into_iter()
            .filter(|email| lookup.contains(email.as_str()) && seen.insert(email.clone()))
            .collect();
        Ok(common.into())
    }

    pub async fn add_subscriber(
        &self,
        requestor: &str,
        target: &str,
    ) -> Result<(), RelationshipError> {
        let subscribed =
            RelationshipFilter::between(requestor, target).of_kind(RelationshipKind::Subscriber);
        if self.store.exists(subscribed).await.at(Step::CheckSubscribed)? {
            return Err(RelationshipError::AlreadySubscribed);
        }

        if self
            .blocked_either_way(requestor, target)
            .await
            .at(Step::CheckBlocked)?
        {
            return Err(RelationshipError::Blocked);
        }

        self.store
            .insert_relationship(NewRelationship::subscriber(requestor, target))
            .await
            .at(Step::CreateSubscription)?;

        info!(requestor, target, "subscription created");
        Ok(())
    }

    /// Clears every relationship between the pair, both directions, then
    /// records `requestor` blocking `target`.
    pub async fn add_block(&self, requestor: &str, target: &str) -> Result<(), RelationshipError> {
        // Under Reject a block in either direction stands.
        if self.policy.reblock == ReblockPolicy::Reject
            && self
                .blocked_either_way(requestor, target)
                .await
                .at(Step::CheckBlocked)?
        {
            return Err(RelationshipError::AlreadyBlocked);
        }

        let mut unit = self.store.begin().await.at(Step::BeginTransaction)?;
        let reverse = unit
            .delete_relationships(target, requestor)
            .await
            .at(Step::DeleteTargetRelationships)?;
        let forward = unit
            .delete_relationships(requestor, target)
            .await
            .at(Step::DeleteRequestorRelationships)?;
        unit.insert_relationship(NewRelationship::block(requestor, target))
            .await
            .at(Step::CreateBlock)?;
        unit.commit().await.at(Step::CommitTransaction)?;

        info!(
            requestor,
            target,
            removed = reverse + forward,
            "block created"
        );
        Ok(())
    }

    /// Everyone who should receive an update from `sender`: friends, then
    /// subscribers, then addresses mentioned in `text`. Plain concatenation;
    /// an address reachable through several sources appears several times.
    pub async fn recipients(&self, sender: &str, text: &str) -> Result<Vec<String>, RelationshipError> {
        let mut recipients = self
            .friends_of(sender)
            .await
            .at(Step::ListRecipientFriendships)?;

        let subscribers = self
            .store
            .find_relationships(
                RelationshipFilter::to_target(sender).of_kind(RelationshipKind::Subscriber),
            )
            .await
            .at(Step::ListSubscribers)?;
        recipients.extend(subscribers.into_iter().map(|rel| rel.requestor_email));

        if !text.is_empty() {
            recipients.extend(mentions::extract_mentions(text));
        }
        Ok(recipients)
    }

    async fn friends_of(&self, email: &str) -> Result<Vec<String>, StoreError> {
        let rows = self
            .store
            .find_relationships(
                RelationshipFilter::from_requestor(email).of_kind(RelationshipKind::Friend),
            )
            .await?;
        Ok(rows.into_iter().map(|rel| rel.target_email).collect())
    }

    async fn blocked_either_way(
        &self,
        a: &str,
        b: &str,
    ) -> Result<bool, StoreError> {
        for (requestor, target) in [(a, b), (b, a)] {
            let filter =
                RelationshipFilter::between(requestor, target).of_kind(RelationshipKind::Block);
            if self.store.exists(filter).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
