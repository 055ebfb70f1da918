use super::*;

async fn backend_with_widgets() -> DuckDbBackend {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE widgets (id INTEGER PRIMARY KEY, tenant_id VARCHAR NOT NULL, note VARCHAR)",
    )
    .await
    .unwrap();
    db
}

#[tokio::test]
async fn test_table_exists() {
    let db = backend_with_widgets().await;
    assert!(db.table_exists("widgets").await.unwrap());
    assert!(!db.table_exists("gadgets").await.unwrap());
}

#[tokio::test]
async fn test_schema_qualified_table_exists() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.create_schema_if_not_exists("strata_meta").await.unwrap();
    db.execute_batch("CREATE TABLE strata_meta.run_lock (lock_id INTEGER PRIMARY KEY)")
        .await
        .unwrap();
    assert!(db.table_exists("strata_meta.run_lock").await.unwrap());
    assert!(!db.table_exists("strata_meta.missing").await.unwrap());
}

#[tokio::test]
async fn test_column_exists_and_nullability() {
    let db = backend_with_widgets().await;
    assert!(db.column_exists("widgets", "tenant_id").await.unwrap());
    assert!(!db.column_exists("widgets", "color").await.unwrap());
    assert!(!db.column_is_nullable("widgets", "tenant_id").await.unwrap());
    assert!(db.column_is_nullable("widgets", "note").await.unwrap());
}

#[tokio::test]
async fn test_index_exists() {
    let db = backend_with_widgets().await;
    db.execute("CREATE INDEX idx_widgets_tenant ON widgets (tenant_id)")
        .await
        .unwrap();
    assert!(db.index_exists("idx_widgets_tenant").await.unwrap());
    assert!(!db.index_exists("idx_missing").await.unwrap());
}

#[tokio::test]
async fn test_constraint_probe_by_fragment() {
    let db = backend_with_widgets().await;
    assert!(db
        .constraint_exists("widgets", "PRIMARY KEY")
        .await
        .unwrap());
    assert!(!db
        .constraint_exists("widgets", "CHECK (amount >= 0)")
        .await
        .unwrap());
}

#[tokio::test]
async fn test_transaction_rollback() {
    let db = backend_with_widgets().await;
    db.begin().await.unwrap();
    db.execute("INSERT INTO widgets VALUES (1, 't1', NULL)")
        .await
        .unwrap();
    db.rollback().await.unwrap();
    assert_eq!(db.query_count("SELECT * FROM widgets").await.unwrap(), 0);
}

#[tokio::test]
async fn test_query_rows_renders_nulls() {
    let db = backend_with_widgets().await;
    db.execute("INSERT INTO widgets VALUES (1, 't1', NULL)")
        .await
        .unwrap();
    let rows = db
        .query_rows("SELECT id, tenant_id, note FROM widgets")
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], Some("1".to_string()));
    assert_eq!(rows[0][1], Some("t1".to_string()));
    assert_eq!(rows[0][2], None);
}

#[tokio::test]
async fn test_not_null_violation_classified() {
    let db = backend_with_widgets().await;
    let err = db
        .execute("INSERT INTO widgets (id) VALUES (2)")
        .await
        .unwrap_err();
    assert!(err.is_constraint_violation(), "got: {}", err);
}

#[tokio::test]
async fn test_file_backend_creates_parent_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/strata.duckdb");
    let db = DuckDbBackend::new(path.to_str().unwrap()).unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER)").await.unwrap();
    assert!(path.exists());
}
