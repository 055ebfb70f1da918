//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use duckdb::types::Value;
use duckdb::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| DbError::ConnectionError(e.to_string()))?;
                }
            }
            Self::from_path(Path::new(path))
        }
    }

    /// Run a closure against the connection on the blocking pool.
    ///
    /// DuckDB's API is synchronous. Calling it inline would complete the
    /// future on its first poll, which never yields to the timer and leaves
    /// a hung statement unkillable by the caller's timeout.
    async fn with_conn<T, F>(&self, f: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> DbResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap();
            f(&conn)
        })
        .await
        .map_err(|e| DbError::Internal(format!("database task aborted: {}", e)))?
    }

    /// Execute batch SQL on the blocking pool
    async fn batch(&self, sql: String) -> DbResult<()> {
        self.with_conn(move |conn| conn.execute_batch(&sql).map_err(|e| classify(e, &sql)))
            .await
    }

    /// Scalar existence query on the blocking pool
    async fn exists(&self, sql: String) -> DbResult<bool> {
        self.with_conn(move |conn| {
            let count: i64 = conn
                .query_row(&sql, [], |row| row.get(0))
                .map_err(|e| DbError::ExecutionError(e.to_string()))?;
            Ok(count > 0)
        })
        .await
    }
}

/// Attach the failing statement to execution errors for diagnosability.
fn classify(err: duckdb::Error, sql: &str) -> DbError {
    match DbError::from(err) {
        DbError::ExecutionError(msg) => DbError::ExecutionError(format!("{}: {}", msg, sql)),
        other => other,
    }
}

/// Query rows, rendering every value as an optional string.
fn fetch_rows(conn: &Connection, sql: &str) -> DbResult<Vec<Vec<Option<String>>>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| DbError::ExecutionError(e.to_string()))?;
    let mut rows = stmt
        .query([])
        .map_err(|e| DbError::ExecutionError(e.to_string()))?;

    let mut out = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| DbError::ExecutionError(e.to_string()))?
    {
        let column_count = row.as_ref().column_count();
        let mut record = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let value: Value = row
                .get(i)
                .map_err(|e| DbError::ExecutionError(e.to_string()))?;
            record.push(value_to_string(value));
        }
        out.push(record);
    }
    Ok(out)
}

/// Render a DuckDB value as an optional string (`None` for NULL).
fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Boolean(b) => Some(b.to_string()),
        Value::TinyInt(i) => Some(i.to_string()),
        Value::SmallInt(i) => Some(i.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::BigInt(i) => Some(i.to_string()),
        Value::HugeInt(i) => Some(i.to_string()),
        Value::UTinyInt(i) => Some(i.to_string()),
        Value::USmallInt(i) => Some(i.to_string()),
        Value::UInt(i) => Some(i.to_string()),
        Value::UBigInt(i) => Some(i.to_string()),
        Value::Float(f) => Some(f.to_string()),
        Value::Double(f) => Some(f.to_string()),
        Value::Text(s) => Some(s),
        other => Some(format!("{:?}", other)),
    }
}

/// Split a possibly schema-qualified name into (schema, table).
fn split_qualified(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("main", name),
    }
}

/// Quote a string as a SQL literal for introspection queries.
fn lit(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        let sql = sql.to_owned();
        self.with_conn(move |conn| conn.execute(&sql, []).map_err(|e| classify(e, &sql)))
            .await
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.batch(sql.to_owned()).await
    }

    async fn query_count(&self, sql: &str) -> DbResult<usize> {
        let sql = format!("SELECT COUNT(*) FROM ({})", sql);
        self.with_conn(move |conn| {
            let count: i64 = conn
                .query_row(&sql, [], |row| row.get(0))
                .map_err(|e| DbError::ExecutionError(e.to_string()))?;
            Ok(count as usize)
        })
        .await
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<Option<String>>>> {
        let sql = sql.to_owned();
        self.with_conn(move |conn| fetch_rows(conn, &sql)).await
    }

    async fn begin(&self) -> DbResult<()> {
        self.batch("BEGIN TRANSACTION".to_string())
            .await
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {}", e)))
    }

    async fn commit(&self) -> DbResult<()> {
        self.batch("COMMIT".to_string())
            .await
            .map_err(|e| DbError::TransactionError(format!("COMMIT failed: {}", e)))
    }

    async fn rollback(&self) -> DbResult<()> {
        self.batch("ROLLBACK".to_string())
            .await
            .map_err(|e| DbError::TransactionError(format!("ROLLBACK failed: {}", e)))
    }

    async fn table_exists(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified(name);
        self.exists(format!(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = {} AND table_name = {}",
            lit(schema),
            lit(table)
        ))
        .await
    }

    async fn column_exists(&self, table: &str, column: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified(table);
        self.exists(format!(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_schema = {} AND table_name = {} AND column_name = {}",
            lit(schema),
            lit(table),
            lit(column)
        ))
        .await
    }

    async fn column_is_nullable(&self, table: &str, column: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified(table);
        self.exists(format!(
            "SELECT COUNT(*) FROM information_schema.columns \
             WHERE table_schema = {} AND table_name = {} AND column_name = {} \
             AND is_nullable = 'YES'",
            lit(schema),
            lit(table),
            lit(column)
        ))
        .await
    }

    async fn index_exists(&self, name: &str) -> DbResult<bool> {
        self.exists(format!(
            "SELECT COUNT(*) FROM duckdb_indexes() WHERE index_name = {}",
            lit(name)
        ))
        .await
    }

    async fn constraint_exists(&self, table: &str, fragment: &str) -> DbResult<bool> {
        let (_, table) = split_qualified(table);
        // duckdb_constraints() exposes constraint text but not names.
        self.exists(format!(
            "SELECT COUNT(*) FROM duckdb_constraints() \
             WHERE table_name = {} AND constraint_text LIKE {}",
            lit(table),
            lit(&format!("%{}%", fragment))
        ))
        .await
    }

    async fn create_schema_if_not_exists(&self, schema: &str) -> DbResult<()> {
        self.batch(format!("CREATE SCHEMA IF NOT EXISTS {}", schema))
            .await
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
