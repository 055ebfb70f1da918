//! Idempotent operation executor: applies one unit inside one transaction.

use crate::error::{EngineError, EngineResult};
use crate::tracker::{AppliedSet, Outcome};
use std::time::Duration;
use strata_core::sql_utils::quote_literal;
use strata_core::{MigrationUnit, Operation, Precondition, META_SCHEMA};
use strata_db::{Database, DbError};

/// Applies migration units with precondition guards, a per-operation
/// statement timeout, and an all-or-nothing transactional boundary.
///
/// The Success applied-record is written inside the same transaction as the
/// unit's operations, so a crash between them is impossible: either the unit
/// committed together with its record, or neither exists and the unit stays
/// pending.
pub struct Executor<'a> {
    db: &'a dyn Database,
    timeout: Duration,
}

impl<'a> Executor<'a> {
    pub fn new(db: &'a dyn Database, timeout_ms: u64) -> Self {
        Self {
            db,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Apply one unit. On failure the transaction is rolled back, a Failed
    /// record is written, and the error is returned so the caller can halt
    /// the run.
    pub async fn apply_unit(&self, unit: &MigrationUnit) -> EngineResult<()> {
        let checksum = unit.checksum()?;
        let tracker = AppliedSet::new(self.db);

        log::info!("applying unit {}", unit.name);
        self.db.begin().await?;

        match self.apply_operations(unit).await {
            Ok(executed) => {
                if let Err(e) = tracker.record(&unit.name, &checksum, Outcome::Success).await {
                    let _ = self.db.rollback().await;
                    return Err(e);
                }
                self.db.commit().await?;
                log::info!(
                    "unit {} applied ({} operations, {} skipped)",
                    unit.name,
                    executed,
                    unit.operations.len() - executed
                );
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = self.db.rollback().await {
                    log::warn!("rollback after failed unit {}: {}", unit.name, rollback_err);
                }
                let e = self.enrich_constraint_error(unit, e).await;
                // Best-effort failure record, outside the aborted transaction.
                if let Err(record_err) =
                    tracker.record(&unit.name, &checksum, Outcome::Failed).await
                {
                    log::warn!(
                        "could not record failure for unit {}: {}",
                        unit.name,
                        record_err
                    );
                }
                Err(e)
            }
        }
    }

    /// Run the unit's operations in order, returning how many actually
    /// executed (as opposed to being skipped by their precondition).
    async fn apply_operations(&self, unit: &MigrationUnit) -> EngineResult<usize> {
        let mut executed = 0;
        for op in &unit.operations {
            let satisfied = self
                .probe(&op.precondition())
                .await
                .map_err(|e| EngineError::PreconditionAmbiguous {
                    unit: unit.name.to_string(),
                    operation: op.describe(),
                    source: e,
                })?;

            if satisfied {
                log::debug!("skipping {} (already satisfied)", op.describe());
                continue;
            }

            self.run_operation(unit, op).await?;
            executed += 1;
        }
        Ok(executed)
    }

    /// Execute a single operation under the statement timeout.
    async fn run_operation(&self, unit: &MigrationUnit, op: &Operation) -> EngineResult<()> {
        let sql = op.sql();
        log::debug!("executing {}: {}", op.describe(), sql);

        let result = tokio::time::timeout(self.timeout, self.db.execute_batch(&sql)).await;
        match result {
            Err(_) => Err(EngineError::TimeoutExceeded {
                unit: unit.name.to_string(),
                operation: op.describe(),
                timeout_ms: self.timeout.as_millis() as u64,
            }),
            // The row count is filled in after rollback: the aborted
            // transaction rejects further statements.
            Ok(Err(e)) if e.is_constraint_violation() => Err(EngineError::ConstraintViolation {
                unit: unit.name.to_string(),
                operation: op.describe(),
                message: e.to_string(),
                violating_rows: None,
            }),
            Ok(Err(e)) => Err(EngineError::UnitFailed {
                unit: unit.name.to_string(),
                operation: op.describe(),
                source: e,
            }),
            Ok(Ok(())) => Ok(()),
        }
    }

    /// Decide whether a precondition is already satisfied (operation can be
    /// skipped). A probe error is *ambiguous*, not a skip.
    async fn probe(&self, pre: &Precondition) -> Result<bool, DbError> {
        match pre {
            Precondition::TableAbsent(table) => self.db.table_exists(table.as_str()).await,
            Precondition::TableExists(table) => {
                Ok(!self.db.table_exists(table.as_str()).await?)
            }
            Precondition::ColumnAbsent { table, column } => {
                self.db.column_exists(table.as_str(), column).await
            }
            Precondition::ColumnExists { table, column } => {
                Ok(!self.db.column_exists(table.as_str(), column).await?)
            }
            Precondition::ConstraintAbsent { table, fragment } => {
                self.db.constraint_exists(table.as_str(), fragment).await
            }
            Precondition::IndexAbsent { name } => self.db.index_exists(name).await,
            Precondition::IndexExists { name } => Ok(!self.db.index_exists(name).await?),
            Precondition::PolicyExists(table) => {
                let count = self
                    .db
                    .query_count(&format!(
                        "SELECT * FROM {}.tenant_policies WHERE table_name = {}",
                        META_SCHEMA,
                        quote_literal(table.as_str())
                    ))
                    .await?;
                Ok(count == 0)
            }
            Precondition::RowsMatch {
                table,
                where_clause,
            } => {
                // A backfill against rows already filled is a no-op.
                if !self.db.table_exists(table.as_str()).await? {
                    return Ok(true);
                }
                let sql = match where_clause {
                    Some(filter) => format!("SELECT * FROM {} WHERE {}", table, filter),
                    None => format!("SELECT * FROM {}", table),
                };
                Ok(self.db.query_count(&sql).await? == 0)
            }
            Precondition::None => Ok(false),
        }
    }

    /// Re-attach a violating-row count to a constraint violation once the
    /// transaction has been rolled back.
    async fn enrich_constraint_error(
        &self,
        unit: &MigrationUnit,
        e: EngineError,
    ) -> EngineError {
        match e {
            EngineError::ConstraintViolation {
                unit: unit_id,
                operation,
                message,
                violating_rows: None,
            } => {
                let violating_rows = match unit.operations.iter().find(|op| op.describe() == operation) {
                    Some(op) => self.violating_rows(op).await,
                    None => None,
                };
                EngineError::ConstraintViolation {
                    unit: unit_id,
                    operation,
                    message,
                    violating_rows,
                }
            }
            other => other,
        }
    }

    /// Best-effort count of rows violating the constraint a failed operation
    /// tried to introduce. Probe errors degrade to `None`.
    async fn violating_rows(&self, op: &Operation) -> Option<usize> {
        match op {
            // A NOT NULL add without a default fails against every existing row.
            Operation::AddColumn { table, column } if !column.nullable && column.default.is_none() => {
                self.db
                    .query_count(&format!("SELECT * FROM {}", table))
                    .await
                    .ok()
            }
            Operation::DataBackfill {
                table,
                where_clause: Some(filter),
                ..
            } => self
                .db
                .query_count(&format!("SELECT * FROM {} WHERE {}", table, filter))
                .await
                .ok(),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
