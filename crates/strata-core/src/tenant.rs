//! Tenant scoping model: declared tenant tables, isolation predicates, and
//! the explicit tenant context threaded through runtime reads.
//!
//! Row security is modeled as a verifiable predicate per table rather than
//! an engine-specific policy object, so the verifier and the runtime access
//! path work against any storage engine with an equivalent filtering hook.

use crate::operation::render_policy_predicate;
use crate::sql_utils::quote_literal;
use crate::table_name::TableName;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Nullability mode of a tenant-scoped table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantMode {
    /// Every row must carry a tenant key
    #[default]
    Strict,
    /// Rows with a null tenant key are globally visible (system/shared data)
    SharedGlobal,
}

/// A table declared as tenant-scoped in `strata.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantTable {
    /// Table name
    pub table: TableName,

    /// Tenant-key column (default `tenant_id`)
    #[serde(default = "default_tenant_column")]
    pub tenant_column: String,

    /// Nullability mode (default strict)
    #[serde(default)]
    pub mode: TenantMode,
}

fn default_tenant_column() -> String {
    "tenant_id".to_string()
}

impl TenantTable {
    /// Whether rows with a null tenant key are permitted.
    pub fn allows_null(&self) -> bool {
        self.mode == TenantMode::SharedGlobal
    }

    /// The isolation predicate this table's policy must be equivalent to.
    pub fn expected_predicate(&self) -> String {
        render_policy_predicate(&self.tenant_column, self.allows_null())
    }
}

/// Normalize a predicate for logical-equivalence comparison: lowercase,
/// whitespace collapsed, redundant outer parentheses stripped.
pub fn normalize_predicate(predicate: &str) -> String {
    let mut s = predicate
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    while s.starts_with('(') && s.ends_with(')') {
        let inner = s[1..s.len() - 1].trim();
        // Only strip when the parens actually wrap the whole expression.
        let mut depth = 0i32;
        let balanced = inner.chars().all(|c| {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            depth >= 0
        }) && depth == 0;
        if !balanced {
            break;
        }
        s = inner.to_string();
    }
    s
}

/// Whether two isolation predicates are logically equivalent under
/// normalization.
pub fn predicates_equivalent(a: &str, b: &str) -> bool {
    normalize_predicate(a) == normalize_predicate(b)
}

/// The caller's tenant context for a request or session.
///
/// Threaded explicitly through scoped reads and the versioned entity
/// manager; `tenant: None` means no tenant context (system callers see only
/// globally shared rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext {
    /// Current tenant, or `None` for a context-free (system) caller
    pub tenant: Option<Uuid>,
}

impl TenantContext {
    /// Context for a specific tenant.
    pub fn for_tenant(tenant: Uuid) -> Self {
        Self {
            tenant: Some(tenant),
        }
    }

    /// Context-free caller (sees only shared-global rows).
    pub fn none() -> Self {
        Self { tenant: None }
    }

    /// Render the WHERE filter enforcing this context against a table.
    ///
    /// A context-free caller on a strict table matches nothing: strict
    /// tables have no globally visible rows.
    pub fn scope_filter(&self, table: &TenantTable) -> String {
        match (self.tenant, table.allows_null()) {
            (Some(id), false) => {
                format!("{} = {}", table.tenant_column, quote_literal(&id.to_string()))
            }
            (Some(id), true) => format!(
                "({col} = {id} OR {col} IS NULL)",
                col = table.tenant_column,
                id = quote_literal(&id.to_string())
            ),
            (None, true) => format!("{} IS NULL", table.tenant_column),
            (None, false) => "FALSE".to_string(),
        }
    }
}

#[cfg(test)]
#[path = "tenant_test.rs"]
mod tests;
