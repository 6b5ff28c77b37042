use tracing::info;

use crate::database::store::RelationshipStore;
use crate::database::StoreError;
use crate::models::{NewRelationship, RelationshipFilter};

const DEMO_RELATIONSHIPS: &[NewRelationship<'static>] = &[
    NewRelationship::friend("mandy@example.com", "trendy@example.com"),
    NewRelationship::friend("trendy@example.com", "mandy@example.com"),
    NewRelationship::friend("trendy@example.com", "alameda@example.com"),
    NewRelationship::friend("alameda@example.com", "trendy@example.com"),
    NewRelationship::friend("alameda@example.com", "bingo@example.com"),
    NewRelationship::friend("bingo@example.com", "alameda@example.com"),
    NewRelationship::friend("bingo@example.com", "trendy@example.com"),
    NewRelationship::friend("trendy@example.com", "bingo@example.com"),
    NewRelationship::block("leo@example.com", "trendy@example.com"),
    NewRelationship::subscriber("adison@example.com", "trendy@example.com"),
    NewRelationship::subscriber("lucas@example.com", "trendy@example.com"),
];

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Loads the demo data set atomically. Rows already present are skipped,
/// so running it twice is harmless.
pub async fn seed_demo_relationships<S: RelationshipStore>(
    store: &S,
) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();
    let mut missing = Vec::new();
    for new in DEMO_RELATIONSHIPS {
        let filter = RelationshipFilter::between(new.requestor_email, new.target_email)
            .of_kind(new.kind);
        if store.exists(filter).await? {
            report.skipped += 1;
        } else {
            missing.push(*new);
        }
    }

    store.insert_relationships_atomic(&missing).await?;
    report.inserted = missing.len();
    info!(
        "🌱 Demo relationships seeded: inserted={}, skipped={}",
        report.inserted, report.skipped
    );
    Ok(report)
}
