//! Applied-set tracker: which units have run, with checksum drift detection.

use crate::error::{EngineError, EngineResult};
use strata_core::sql_utils::quote_literal;
use strata_core::{Catalog, UnitDag, UnitName, META_SCHEMA};
use strata_db::Database;

/// Outcome of a recorded unit application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Outcome::Success),
            "failed" => Some(Outcome::Failed),
            _ => None,
        }
    }
}

/// One row of `strata_meta.applied_migrations`.
#[derive(Debug, Clone)]
pub struct AppliedRecord {
    pub unit_id: UnitName,
    pub checksum: String,
    pub applied_at: String,
    pub outcome: Outcome,
}

/// Tracker over the persisted applied set.
pub struct AppliedSet<'a> {
    db: &'a dyn Database,
}

impl<'a> AppliedSet<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    /// Whether a unit has a Success record.
    pub async fn is_applied(&self, unit: &str) -> EngineResult<bool> {
        let count = self
            .db
            .query_count(&format!(
                "SELECT * FROM {}.applied_migrations WHERE unit_id = {} AND outcome = 'success'",
                META_SCHEMA,
                quote_literal(unit)
            ))
            .await?;
        Ok(count > 0)
    }

    /// All records, oldest first.
    pub async fn records(&self) -> EngineResult<Vec<AppliedRecord>> {
        let rows = self
            .db
            .query_rows(&format!(
                "SELECT unit_id, checksum, CAST(applied_at AS VARCHAR), outcome \
                 FROM {}.applied_migrations ORDER BY applied_at, unit_id",
                META_SCHEMA
            ))
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let field = |i: usize| -> EngineResult<String> {
                row.get(i).cloned().flatten().ok_or_else(|| {
                    EngineError::Db(strata_db::DbError::Internal(
                        "unexpected NULL in applied_migrations".to_string(),
                    ))
                })
            };
            let outcome_raw = field(3)?;
            let outcome = Outcome::parse(&outcome_raw).ok_or_else(|| {
                EngineError::Db(strata_db::DbError::Internal(format!(
                    "unknown outcome '{}' in applied_migrations",
                    outcome_raw
                )))
            })?;
            records.push(AppliedRecord {
                unit_id: UnitName::new(field(0)?),
                checksum: field(1)?,
                applied_at: field(2)?,
                outcome,
            });
        }
        Ok(records)
    }

    /// Record an outcome for a unit.
    ///
    /// Upserts so a retried unit's Success replaces its earlier Failed row.
    /// A Success record is final: re-recording over one is a programming
    /// error and is rejected.
    pub async fn record(
        &self,
        unit: &UnitName,
        checksum: &str,
        outcome: Outcome,
    ) -> EngineResult<()> {
        if self.is_applied(unit).await? {
            return Err(EngineError::Db(strata_db::DbError::Internal(format!(
                "unit '{}' already has a success record",
                unit
            ))));
        }
        self.db
            .execute(&format!(
                "INSERT OR REPLACE INTO {}.applied_migrations \
                 (unit_id, checksum, applied_at, outcome) VALUES ({}, {}, now(), {})",
                META_SCHEMA,
                quote_literal(unit.as_str()),
                quote_literal(checksum),
                quote_literal(outcome.as_str())
            ))
            .await?;
        Ok(())
    }

    /// Detect drift: any successfully applied unit whose current checksum
    /// differs from the recorded one halts the run.
    pub async fn check_drift(&self, catalog: &Catalog) -> EngineResult<()> {
        for record in self.records().await? {
            if record.outcome != Outcome::Success {
                continue;
            }
            if let Some(unit) = catalog.get(&record.unit_id) {
                let current = unit.checksum()?;
                if current != record.checksum {
                    return Err(EngineError::ChecksumMismatch {
                        unit: record.unit_id.to_string(),
                        recorded: record.checksum,
                        current,
                    });
                }
            }
        }
        Ok(())
    }

    /// Pending units in resolver order: everything without a Success record.
    pub async fn pending(&self, dag: &UnitDag) -> EngineResult<Vec<UnitName>> {
        let order = dag.application_order()?;
        let mut pending = Vec::new();
        for name in order {
            if !self.is_applied(&name).await? {
                pending.push(name);
            }
        }
        Ok(pending)
    }
}

#[cfg(test)]
#[path = "tracker_test.rs"]
mod tests;
