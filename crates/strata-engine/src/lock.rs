//! Advisory run lock: one migration run per database at a time.
//!
//! The lock is a single row in `strata_meta.run_lock` with a fixed key; the
//! primary key makes a second INSERT fail, which is how a second runner
//! learns the lock is held. Callers must release explicitly; `Drop` only
//! logs if they forget, since an abandoned row from a crashed process has
//! to be cleared by hand (or by `strata up --force-unlock` one day).

use crate::error::{EngineError, EngineResult};
use strata_core::sql_utils::quote_literal;
use strata_core::META_SCHEMA;
use strata_db::Database;

const LOCK_ID: i64 = 1;

/// Holder of the advisory run lock.
pub struct RunLock<'a> {
    db: &'a dyn Database,
    owner: String,
    held: bool,
}

impl<'a> RunLock<'a> {
    /// Try to take the lock. Fails with [`EngineError::LockHeld`] if another
    /// runner holds it.
    pub async fn acquire(db: &'a dyn Database, owner: &str) -> EngineResult<RunLock<'a>> {
        let insert = format!(
            "INSERT INTO {META_SCHEMA}.run_lock (lock_id, owner) VALUES ({LOCK_ID}, {})",
            quote_literal(owner)
        );
        match db.execute(&insert).await {
            Ok(_) => {
                log::debug!("acquired run lock as '{owner}'");
                Ok(RunLock {
                    db,
                    owner: owner.to_string(),
                    held: true,
                })
            }
            Err(e) if e.is_constraint_violation() => {
                let holder = current_holder(db).await.unwrap_or_default();
                Err(EngineError::LockHeld {
                    owner: if holder.is_empty() {
                        "unknown".to_string()
                    } else {
                        holder
                    },
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Release the lock. Safe to call once; further calls are no-ops.
    pub async fn release(&mut self) -> EngineResult<()> {
        if !self.held {
            return Ok(());
        }
        self.db
            .execute(&format!(
                "DELETE FROM {META_SCHEMA}.run_lock WHERE lock_id = {LOCK_ID}"
            ))
            .await?;
        self.held = false;
        log::debug!("released run lock held by '{}'", self.owner);
        Ok(())
    }
}

impl Drop for RunLock<'_> {
    fn drop(&mut self) {
        if self.held {
            log::warn!(
                "run lock held by '{}' dropped without release; clear {}.run_lock manually",
                self.owner,
                META_SCHEMA
            );
        }
    }
}

async fn current_holder(db: &dyn Database) -> EngineResult<String> {
    let rows = db
        .query_rows(&format!(
            "SELECT owner FROM {META_SCHEMA}.run_lock WHERE lock_id = {LOCK_ID}"
        ))
        .await?;
    Ok(rows
        .into_iter()
        .next()
        .and_then(|r| r.into_iter().next().flatten())
        .unwrap_or_default())
}

#[cfg(test)]
#[path = "lock_test.rs"]
mod tests;
