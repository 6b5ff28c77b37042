use friends_management::database::{
    schema, AtomicUnit, RelationshipStore, SqliteRelationshipStore, StoreError,
};
use friends_management::models::{NewRelationship, RelationshipFilter, RelationshipKind};
use friends_management::services::{RelationshipError, RelationshipService, Step};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

const A: &str = "a@x.com";
const B: &str = "b@x.com";
const C: &str = "c@x.com";

// `sqlite::memory:` is per connection, so the pool must hold exactly one.
async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    schema::ensure_schema(&pool).await.unwrap();
    pool
}

async fn sqlite_service() -> RelationshipService<SqliteRelationshipStore> {
    RelationshipService::new(SqliteRelationshipStore::new(memory_pool().await))
}

async fn count_rows(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM user_relationships")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn schema_creation_is_idempotent() {
    let pool = memory_pool().await;
    schema::ensure_schema(&pool).await.unwrap();
    assert_eq!(count_rows(&pool).await, 0);
}

#[tokio::test]
async fn rows_round_trip_with_kind_and_timestamps() {
    let store = SqliteRelationshipStore::new(memory_pool().await);
    store
        .insert_relationship(NewRelationship::subscriber(A, B))
        .await
        .unwrap();

    let rows = store
        .find_relationships(RelationshipFilter::to_target(B))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].requestor_email, A);
    assert_eq!(rows[0].kind, RelationshipKind::Subscriber);
    assert_eq!(rows[0].created_at, rows[0].updated_at);
    assert!(!rows[0].id.is_empty());
}

#[tokio::test]
async fn unique_index_reports_conflicts() {
    let store = SqliteRelationshipStore::new(memory_pool().await);
    store
        .insert_relationship(NewRelationship::friend(A, B))
        .await
        .unwrap();

    let err = store
        .insert_relationship(NewRelationship::friend(A, B))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Conflict { kind: RelationshipKind::Friend, .. }
    ));
}

#[tokio::test]
async fn delete_removes_every_kind_for_the_ordered_pair() {
    let store = SqliteRelationshipStore::new(memory_pool().await);
    store
        .insert_relationships_atomic(&[
            NewRelationship::friend(A, B),
            NewRelationship::subscriber(A, B),
            NewRelationship::friend(B, A),
        ])
        .await
        .unwrap();

    assert_eq!(store.delete_relationships(A, B).await.unwrap(), 2);
    let left = store
        .find_relationships(RelationshipFilter::default())
        .await
        .unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].requestor_email, B);
}

#[tokio::test]
async fn atomic_insert_is_all_or_nothing() {
    let store = SqliteRelationshipStore::new(memory_pool().await);
    store
        .insert_relationship(NewRelationship::block(B, C))
        .await
        .unwrap();

    let err = store
        .insert_relationships_atomic(&[
            NewRelationship::friend(A, B),
            NewRelationship::block(B, C),
        ])
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(count_rows(store.pool()).await, 1);
}

#[tokio::test]
async fn uncommitted_unit_rolls_back_on_drop() {
    let store = SqliteRelationshipStore::new(memory_pool().await);
    {
        let mut unit = store.begin().await.unwrap();
        unit.insert_relationship(NewRelationship::friend(A, B))
            .await
            .unwrap();
    }
    assert_eq!(count_rows(store.pool()).await, 0);
}

#[tokio::test]
async fn friend_list_follows_insertion_order() {
    let service = sqlite_service().await;
    for friend in [C, B, "d@x.com"] {
        service.add_friendship(A, friend).await.unwrap();
    }

    let list = service.list_friendships(A).await.unwrap();
    assert_eq!(list.friends, [C, B, "d@x.com"]);
    assert_eq!(list.count, 3);
}

#[tokio::test]
async fn rules_hold_against_sqlite() {
    let service = sqlite_service().await;

    service.add_friendship(A, B).await.unwrap();
    assert!(matches!(
        service.add_friendship(A, B).await,
        Err(RelationshipError::AlreadyFriends)
    ));

    service.add_subscriber(C, A).await.unwrap();
    assert!(matches!(
        service.add_subscriber(C, A).await,
        Err(RelationshipError::AlreadySubscribed)
    ));
    assert_eq!(
        service
            .recipients(A, "cc mention@example.com")
            .await
            .unwrap(),
        [B, C, "mention@example.com"]
    );

    service.add_block(A, B).await.unwrap();
    assert!(service.list_friendships(A).await.unwrap().friends.is_empty());
    assert!(service.list_friendships(B).await.unwrap().friends.is_empty());
    assert!(matches!(
        service.add_friendship(B, A).await,
        Err(RelationshipError::Blocked)
    ));
    assert!(matches!(
        service.list_common_friends(A, B).await,
        Err(RelationshipError::Blocked)
    ));
}

#[tokio::test]
async fn failing_second_insert_rolls_back_the_friendship() {
    let pool = memory_pool().await;
    sqlx::query(
        r#"
CREATE TRIGGER reject_second_friend_row
BEFORE INSERT ON user_relationships
WHEN NEW.requestor_email = 'b@x.com' AND NEW.type = 'FRIEND'
BEGIN
    SELECT RAISE(ABORT, 'simulated store fault');
END
"#,
    )
    .execute(&pool)
    .await
    .unwrap();
    let service = RelationshipService::new(SqliteRelationshipStore::new(pool.clone()));

    let err = service.add_friendship(A, B).await.unwrap_err();
    assert_eq!(err.step(), Some(Step::CreateSecondFriendship));
    assert!(matches!(
        err,
        RelationshipError::Store {
            source: StoreError::Database(_),
            ..
        }
    ));

    assert!(service.list_friendships(A).await.unwrap().friends.is_empty());
    assert!(service.list_friendships(B).await.unwrap().friends.is_empty());
    assert_eq!(count_rows(&pool).await, 0);
}

#[tokio::test]
async fn failing_block_insert_keeps_prior_rows() {
    let pool = memory_pool().await;
    let service = RelationshipService::new(SqliteRelationshipStore::new(pool.clone()));
    service.add_friendship(A, B).await.unwrap();

    sqlx::query(
        r#"
CREATE TRIGGER reject_block_row
BEFORE INSERT ON user_relationships
WHEN NEW.type = 'BLOCK'
BEGIN
    SELECT RAISE(ABORT, 'simulated store fault');
END
"#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let err = service.add_block(A, B).await.unwrap_err();
    assert_eq!(err.step(), Some(Step::CreateBlock));
    assert_eq!(service.list_friendships(A).await.unwrap().friends, [B]);
    assert_eq!(service.list_friendships(B).await.unwrap().friends, [A]);
    assert_eq!(count_rows(&pool).await, 2);
}

#[tokio::test]
async fn concurrent_befriends_on_a_shared_file_succeed_once() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("relationships.db").display()
    );
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .unwrap();
    schema::ensure_schema(&pool).await.unwrap();
    let service = RelationshipService::new(SqliteRelationshipStore::new(pool.clone()));

    let (first, second) = tokio::join!(service.add_friendship(A, B), service.add_friendship(A, B));
    let outcomes = [first, second];

    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    for err in outcomes.iter().filter_map(|r| r.as_ref().err()) {
        let conflict = matches!(
            err,
            RelationshipError::Store { source, .. } if source.is_conflict()
        );
        assert!(conflict || matches!(err, RelationshipError::AlreadyFriends));
    }
    assert_eq!(count_rows(&pool).await, 2);
}

#[tokio::test]
async fn recipient_lookup_failures_carry_their_own_code() {
    let pool = memory_pool().await;
    let service = RelationshipService::new(SqliteRelationshipStore::new(pool.clone()));
    sqlx::query("DROP TABLE user_relationships")
        .execute(&pool)
        .await
        .unwrap();

    let err = service.recipients(A, "").await.unwrap_err();
    assert_eq!(err.step(), Some(Step::ListRecipientFriendships));
    assert_eq!(err.code(), "GET_LIST_FRIENDSHIP_EMAIL_FAIL");

    let err = service.list_friendships(A).await.unwrap_err();
    assert_eq!(err.code(), "GET_LIST_FRIENDSHIP_FAIL");
}
