//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;

/// Storage engine contract consumed by the migration engine.
///
/// Beyond plain execution, implementations provide the catalog introspection
/// the idempotent executor's precondition probes and the tenant isolation
/// verifier depend on, plus transactional boundaries for unit application.
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute SQL that modifies data, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute query returning row count
    async fn query_count(&self, sql: &str) -> DbResult<usize>;

    /// Execute a query returning all rows, each value rendered as an
    /// optional string (`None` for SQL NULL)
    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<Option<String>>>>;

    /// Begin a transaction
    async fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    async fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    async fn rollback(&self) -> DbResult<()>;

    /// Check if a table or view exists
    async fn table_exists(&self, name: &str) -> DbResult<bool>;

    /// Check if a column exists on a table
    async fn column_exists(&self, table: &str, column: &str) -> DbResult<bool>;

    /// Check if a column accepts NULL values
    async fn column_is_nullable(&self, table: &str, column: &str) -> DbResult<bool>;

    /// Check if an index with the given name exists
    async fn index_exists(&self, name: &str) -> DbResult<bool>;

    /// Check if any constraint on `table` matches the definition fragment.
    ///
    /// Engines with named constraints may probe by name instead; DuckDB only
    /// exposes constraint text, so the fragment match is the portable form.
    async fn constraint_exists(&self, table: &str, fragment: &str) -> DbResult<bool>;

    /// Create a schema if it does not exist
    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()>;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}
