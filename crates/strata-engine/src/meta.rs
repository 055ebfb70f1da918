//! Bootstrap of strata's own metadata schema.
//!
//! The `strata_meta` schema carries the applied-migration records, the
//! tenant policy registry, and the advisory run lock. The bootstrap DDL is
//! embedded and uses `CREATE ... IF NOT EXISTS` throughout, so running it
//! on every open is safe.

use crate::error::EngineResult;
use strata_db::Database;

/// Embedded bootstrap DDL for the meta schema.
const BOOTSTRAP_SQL: &str = include_str!("ddl/bootstrap.sql");

/// Ensure the `strata_meta` schema and its tables exist.
pub async fn bootstrap(db: &dyn Database) -> EngineResult<()> {
    log::debug!("bootstrapping strata_meta schema");
    db.execute_batch(BOOTSTRAP_SQL).await?;
    Ok(())
}
