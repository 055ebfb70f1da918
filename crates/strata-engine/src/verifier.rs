//! Tenant isolation verifier.
//!
//! Confirms that every declared tenant-scoped table that exists in the
//! schema carries a registered isolation policy logically equivalent to
//! "tenant key equals the caller's tenant" (extended to accept null for
//! shared-global tables), and that the tenant column's nullability agrees
//! with the declared mode. Any gap is a security regression and fails the
//! migration run.

use crate::error::{EngineError, EngineResult};
use strata_core::sql_utils::quote_literal;
use strata_core::{predicates_equivalent, TenantTable, META_SCHEMA};
use strata_db::Database;

/// A registered policy row from `strata_meta.tenant_policies`.
#[derive(Debug, Clone)]
struct PolicyRow {
    tenant_column: String,
    predicate: String,
    allow_null: bool,
}

/// One verification failure, kept as data so `verify` can list all gaps.
#[derive(Debug, Clone)]
pub struct IsolationFinding {
    pub table: String,
    pub reason: String,
}

impl IsolationFinding {
    fn new(table: &TenantTable, reason: impl Into<String>) -> Self {
        Self {
            table: table.table.to_string(),
            reason: reason.into(),
        }
    }
}

/// Verifier over the policy registry and the live schema catalog.
pub struct IsolationVerifier<'a> {
    db: &'a dyn Database,
}

impl<'a> IsolationVerifier<'a> {
    pub fn new(db: &'a dyn Database) -> Self {
        Self { db }
    }

    async fn load_policy(&self, table: &str) -> EngineResult<Option<PolicyRow>> {
        let rows = self
            .db
            .query_rows(&format!(
                "SELECT tenant_column, predicate, allow_null \
                 FROM {}.tenant_policies WHERE table_name = {}",
                META_SCHEMA,
                quote_literal(table)
            ))
            .await?;
        Ok(rows.into_iter().next().map(|row| PolicyRow {
            tenant_column: row[0].clone().unwrap_or_default(),
            predicate: row[1].clone().unwrap_or_default(),
            allow_null: row[2].as_deref() == Some("true"),
        }))
    }

    /// Check one declared table; `None` means it passes (or does not exist
    /// yet, which is not a gap — nothing can query it).
    async fn check_table(&self, decl: &TenantTable) -> EngineResult<Option<IsolationFinding>> {
        let table = decl.table.as_str();
        if !self.db.table_exists(table).await? {
            return Ok(None);
        }

        if !self.db.column_exists(table, &decl.tenant_column).await? {
            return Ok(Some(IsolationFinding::new(
                decl,
                format!("tenant column '{}' does not exist", decl.tenant_column),
            )));
        }

        let policy = match self.load_policy(table).await? {
            Some(p) => p,
            None => {
                return Ok(Some(IsolationFinding::new(
                    decl,
                    "no isolation policy registered",
                )));
            }
        };

        if policy.tenant_column != decl.tenant_column {
            return Ok(Some(IsolationFinding::new(
                decl,
                format!(
                    "policy guards column '{}' but the declared tenant column is '{}'",
                    policy.tenant_column, decl.tenant_column
                ),
            )));
        }

        let expected = decl.expected_predicate();
        if !predicates_equivalent(&policy.predicate, &expected) {
            return Ok(Some(IsolationFinding::new(
                decl,
                format!(
                    "policy predicate '{}' is not equivalent to '{}'",
                    policy.predicate, expected
                ),
            )));
        }

        if policy.allow_null != decl.allows_null() {
            return Ok(Some(IsolationFinding::new(
                decl,
                format!(
                    "policy allow_null={} disagrees with declared mode",
                    policy.allow_null
                ),
            )));
        }

        let nullable = self
            .db
            .column_is_nullable(table, &decl.tenant_column)
            .await?;
        if nullable && !decl.allows_null() {
            return Ok(Some(IsolationFinding::new(
                decl,
                "tenant column is nullable but the table is declared strict",
            )));
        }
        if nullable && !policy.allow_null {
            // Null-tenant rows would be invisible to every tenant context.
            return Ok(Some(IsolationFinding::new(
                decl,
                "tenant column is nullable but the policy does not accept null",
            )));
        }

        Ok(None)
    }

    /// Collect findings for all declared tables (for `strata verify`).
    pub async fn findings(&self, tables: &[TenantTable]) -> EngineResult<Vec<IsolationFinding>> {
        let mut findings = Vec::new();
        for decl in tables {
            if let Some(finding) = self.check_table(decl).await? {
                log::warn!("isolation gap on {}: {}", finding.table, finding.reason);
                findings.push(finding);
            }
        }
        Ok(findings)
    }

    /// Verify all declared tables, failing on the first gap.
    pub async fn verify(&self, tables: &[TenantTable]) -> EngineResult<()> {
        for decl in tables {
            if let Some(finding) = self.check_table(decl).await? {
                return Err(EngineError::IsolationGap {
                    table: finding.table,
                    reason: finding.reason,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "verifier_test.rs"]
mod tests;
