use super::*;
use crate::testing::memory_db;
use strata_core::{TableName, TenantContext, VersionedEntityDef};
use uuid::Uuid;

fn plans_def() -> VersionedEntityDef {
    VersionedEntityDef {
        table: TableName::new("plans"),
        tenant_column: "tenant_id".to_string(),
        data_columns: vec!["title".to_string(), "body".to_string()],
    }
}

async fn plans_table(db: &dyn strata_db::Database) {
    db.execute_batch(
        "CREATE TABLE plans (
            id VARCHAR PRIMARY KEY,
            root_id VARCHAR NOT NULL,
            version BIGINT NOT NULL,
            status VARCHAR NOT NULL,
            tenant_id VARCHAR NOT NULL,
            title VARCHAR,
            body VARCHAR
         );
         CREATE UNIQUE INDEX plans_root_version ON plans (root_id, version);",
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn create_starts_a_chain_at_version_one() {
    let db = memory_db();
    plans_table(&db).await;
    let def = plans_def();
    let mgr = VersionedEntityManager::new(&db, &def);
    let ctx = TenantContext::for_tenant(Uuid::new_v4());

    let row = mgr.create(&ctx, &[("title", "launch plan")]).await.unwrap();
    assert_eq!(row.version, 1);
    assert_eq!(row.root_id, row.id);
    assert_eq!(row.status, VersionStatus::Draft);

    let fetched = mgr.fetch(&ctx, row.id).await.unwrap();
    assert_eq!(fetched, row);
}

#[tokio::test]
async fn rows_are_invisible_to_other_tenants() {
    let db = memory_db();
    plans_table(&db).await;
    let def = plans_def();
    let mgr = VersionedEntityManager::new(&db, &def);
    let ctx = TenantContext::for_tenant(Uuid::new_v4());
    let other = TenantContext::for_tenant(Uuid::new_v4());

    let row = mgr.create(&ctx, &[("title", "mine")]).await.unwrap();
    let err = mgr.fetch(&other, row.id).await.unwrap_err();
    assert!(matches!(err, EngineError::EntityNotFound { .. }));
}

#[tokio::test]
async fn create_requires_a_tenant_context() {
    let db = memory_db();
    plans_table(&db).await;
    let def = plans_def();
    let mgr = VersionedEntityManager::new(&db, &def);

    let err = mgr.create(&TenantContext::none(), &[]).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidEntityState { .. }));
}

#[tokio::test]
async fn undeclared_data_columns_are_rejected() {
    let db = memory_db();
    plans_table(&db).await;
    let def = plans_def();
    let mgr = VersionedEntityManager::new(&db, &def);
    let ctx = TenantContext::for_tenant(Uuid::new_v4());

    let err = mgr.create(&ctx, &[("owner", "bob")]).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidEntityState { .. }));
}

#[tokio::test]
async fn drafts_update_in_place_and_locked_versions_reject_edits() {
    let db = memory_db();
    plans_table(&db).await;
    let def = plans_def();
    let mgr = VersionedEntityManager::new(&db, &def);
    let ctx = TenantContext::for_tenant(Uuid::new_v4());

    let row = mgr.create(&ctx, &[("title", "v1")]).await.unwrap();
    mgr.update_draft(&ctx, row.id, &[("title", "v1 revised")])
        .await
        .unwrap();

    mgr.lock(&ctx, row.id).await.unwrap();
    // Locking again is a no-op.
    mgr.lock(&ctx, row.id).await.unwrap();

    let err = mgr
        .update_draft(&ctx, row.id, &[("title", "too late")])
        .await
        .unwrap_err();
    match err {
        EngineError::ImmutableVersion { version, .. } => assert_eq!(version, 1),
        other => panic!("expected ImmutableVersion, got {other}"),
    }

    let title = db
        .query_rows(&format!(
            "SELECT title FROM plans WHERE id = '{}'",
            row.id
        ))
        .await
        .unwrap();
    assert_eq!(title[0][0].as_deref(), Some("v1 revised"));
}

#[tokio::test]
async fn fork_creates_the_next_draft_and_leaves_the_head_untouched() {
    let db = memory_db();
    plans_table(&db).await;
    let def = plans_def();
    let mgr = VersionedEntityManager::new(&db, &def);
    let ctx = TenantContext::for_tenant(Uuid::new_v4());

    let v1 = mgr.create(&ctx, &[("title", "plan"), ("body", "a")]).await.unwrap();
    mgr.lock(&ctx, v1.id).await.unwrap();

    let v2 = mgr.fork(&ctx, v1.id).await.unwrap();
    assert_eq!(v2.version, 2);
    assert_eq!(v2.root_id, v1.root_id);
    assert_eq!(v2.status, VersionStatus::Draft);
    assert_ne!(v2.id, v1.id);

    // Data columns are carried over; the old row is unchanged.
    let rows = db
        .query_rows(&format!(
            "SELECT status, title, body FROM plans WHERE id = '{}'",
            v2.id
        ))
        .await
        .unwrap();
    assert_eq!(rows[0][1].as_deref(), Some("plan"));
    assert_eq!(rows[0][2].as_deref(), Some("a"));

    let old = mgr.fetch(&ctx, v1.id).await.unwrap();
    assert_eq!(old.status, VersionStatus::Locked);
    assert_eq!(old.version, 1);

    let head = mgr.head(&ctx, v1.root_id).await.unwrap();
    assert_eq!(head.id, v2.id);
}

#[tokio::test]
async fn forking_a_draft_is_rejected() {
    let db = memory_db();
    plans_table(&db).await;
    let def = plans_def();
    let mgr = VersionedEntityManager::new(&db, &def);
    let ctx = TenantContext::for_tenant(Uuid::new_v4());

    let v1 = mgr.create(&ctx, &[("title", "plan")]).await.unwrap();
    let err = mgr.fork(&ctx, v1.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidEntityState { .. }));
}

#[tokio::test]
async fn forking_a_stale_head_is_a_version_conflict() {
    let db = memory_db();
    plans_table(&db).await;
    let def = plans_def();
    let mgr = VersionedEntityManager::new(&db, &def);
    let ctx = TenantContext::for_tenant(Uuid::new_v4());

    let v1 = mgr.create(&ctx, &[("title", "plan")]).await.unwrap();
    mgr.lock(&ctx, v1.id).await.unwrap();
    let v2 = mgr.fork(&ctx, v1.id).await.unwrap();
    mgr.lock(&ctx, v2.id).await.unwrap();

    // v1 is no longer the head of the chain.
    let err = mgr.fork(&ctx, v1.id).await.unwrap_err();
    match err {
        EngineError::VersionConflict { version, .. } => assert_eq!(version, 1),
        other => panic!("expected VersionConflict, got {other}"),
    }

    // The loser retries against the refreshed head and succeeds.
    let head = mgr.head(&ctx, v1.root_id).await.unwrap();
    let v3 = mgr.fork(&ctx, head.id).await.unwrap();
    assert_eq!(v3.version, 3);
}
