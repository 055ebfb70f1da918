//! Schema operations and their idempotency preconditions.
//!
//! A migration unit is an ordered list of [`Operation`]s. Each operation
//! knows three things: the catalog probe that makes re-issuing it safe
//! ([`Operation::precondition`]), the SQL it renders ([`Operation::sql`]),
//! and the tables it creates or references, which the resolver uses for
//! referential dependency inference.
//!
//! Conditional DDL (`IF NOT EXISTS`, procedural guard blocks) is deliberately
//! not used here: the precondition is an explicit probe evaluated by the
//! executor, so the same unit files work against engines without conditional
//! syntax.

use crate::sql_utils::{column_list, quote_literal};
use crate::table_name::TableName;
use serde::{Deserialize, Serialize};

/// Schema name for strata's own metadata tables.
pub const META_SCHEMA: &str = "strata_meta";

/// Column definition used by `create_table` and `add_column`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDef {
    /// Column name
    pub name: String,

    /// SQL type, passed through verbatim (e.g. `UUID`, `DECIMAL(18,2)`)
    #[serde(rename = "type")]
    pub data_type: String,

    /// Whether NULL values are allowed (default true)
    #[serde(default = "default_true")]
    pub nullable: bool,

    /// Default expression, passed through verbatim
    #[serde(default)]
    pub default: Option<String>,

    /// Table referenced by a column-level foreign key
    #[serde(default)]
    pub references: Option<TableName>,

    /// Referenced column; omitted means the referenced table's primary key
    #[serde(default)]
    pub references_column: Option<String>,
}

impl ColumnDef {
    /// Render this column as a fragment of a CREATE TABLE / ADD COLUMN statement.
    pub fn render(&self) -> String {
        let mut out = format!("{} {}", self.name, self.data_type);
        if !self.nullable {
            out.push_str(" NOT NULL");
        }
        if let Some(default) = &self.default {
            out.push_str(" DEFAULT ");
            out.push_str(default);
        }
        if let Some(table) = &self.references {
            out.push_str(" REFERENCES ");
            out.push_str(table.as_str());
            if let Some(col) = &self.references_column {
                out.push_str(&format!("({})", col));
            }
        }
        out
    }
}

fn default_true() -> bool {
    true
}

/// ON DELETE action for table-level foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDeleteAction {
    Cascade,
    SetNull,
}

impl OnDeleteAction {
    fn render(self) -> &'static str {
        match self {
            OnDeleteAction::Cascade => "ON DELETE CASCADE",
            OnDeleteAction::SetNull => "ON DELETE SET NULL",
        }
    }
}

/// Table-level foreign key declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ForeignKey {
    /// Referencing columns
    pub columns: Vec<String>,

    /// Referenced table
    pub references: TableName,

    /// Referenced columns; empty means the referenced table's primary key
    #[serde(default)]
    pub referenced_columns: Vec<String>,

    /// Delete action, omitted means RESTRICT (engine default)
    #[serde(default)]
    pub on_delete: Option<OnDeleteAction>,
}

impl ForeignKey {
    fn render(&self) -> String {
        let mut out = format!(
            "FOREIGN KEY ({}) REFERENCES {}",
            column_list(&self.columns),
            self.references
        );
        if !self.referenced_columns.is_empty() {
            out.push_str(&format!("({})", column_list(&self.referenced_columns)));
        }
        if let Some(action) = self.on_delete {
            out.push(' ');
            out.push_str(action.render());
        }
        out
    }
}

/// Kind of object named by a `drop_object` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Table,
    Index,
    Policy,
}

/// Declared guard for a `raw_statement` operation.
///
/// Raw statements have no structure to derive a probe from, so the author
/// states one. A raw statement without a guard always executes (the unit
/// transaction still makes it all-or-nothing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum RawGuard {
    TableAbsent { table: TableName },
    TableExists { table: TableName },
    ColumnAbsent { table: TableName, column: String },
    ColumnExists { table: TableName, column: String },
}

/// Catalog probe that decides whether an operation may be skipped.
///
/// The executor evaluates the probe first; if the operation's effect already
/// exists the operation is a no-op, reproducing existence-guarded DDL without
/// engine-specific conditional syntax.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// Run only if the table does not exist yet
    TableAbsent(TableName),
    /// Run only if the table still exists
    TableExists(TableName),
    /// Run only if the column does not exist yet
    ColumnAbsent { table: TableName, column: String },
    /// Run only if the column still exists
    ColumnExists { table: TableName, column: String },
    /// Run only if no constraint on the table matches the definition fragment
    ConstraintAbsent { table: TableName, fragment: String },
    /// Run only if no index with this name exists
    IndexAbsent { name: String },
    /// Run only if an index with this name still exists
    IndexExists { name: String },
    /// Run only if the policy registry still carries a row for the table
    PolicyExists(TableName),
    /// Run only if the table has rows matching the optional filter
    RowsMatch {
        table: TableName,
        where_clause: Option<String>,
    },
    /// Always run
    None,
}

/// One schema operation inside a migration unit.
///
/// The YAML form is internally tagged on `op`:
///
/// ```yaml
/// - op: add_column
///   table: contracts
///   column:
///     name: locked_at
///     type: TIMESTAMP
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Operation {
    /// Create a table with columns, primary key, checks, and foreign keys
    CreateTable {
        table: TableName,
        columns: Vec<ColumnDef>,
        #[serde(default)]
        primary_key: Vec<String>,
        #[serde(default)]
        checks: Vec<String>,
        #[serde(default)]
        foreign_keys: Vec<ForeignKey>,
    },

    /// Add a column to an existing table
    AddColumn { table: TableName, column: ColumnDef },

    /// Add a named table constraint with a verbatim definition
    AddConstraint {
        table: TableName,
        name: String,
        definition: String,
    },

    /// Create an index
    CreateIndex {
        table: TableName,
        name: String,
        columns: Vec<String>,
        #[serde(default)]
        unique: bool,
    },

    /// Register (or update) the tenant isolation policy for a table
    CreatePolicy {
        table: TableName,
        #[serde(default = "default_tenant_column")]
        tenant_column: String,
        #[serde(default)]
        allow_null: bool,
    },

    /// Drop a table, index, or policy
    DropObject {
        kind: ObjectKind,
        name: String,
    },

    /// Update existing rows, guarded so re-runs only touch rows still needing it
    DataBackfill {
        table: TableName,
        set: String,
        #[serde(default)]
        where_clause: Option<String>,
    },

    /// Verbatim SQL with an author-declared guard
    RawStatement {
        sql: String,
        #[serde(default)]
        guard: Option<RawGuard>,
    },
}

fn default_tenant_column() -> String {
    "tenant_id".to_string()
}

impl Operation {
    /// The probe that makes this operation safe to re-issue.
    pub fn precondition(&self) -> Precondition {
        match self {
            Operation::CreateTable { table, .. } => Precondition::TableAbsent(table.clone()),
            Operation::AddColumn { table, column } => Precondition::ColumnAbsent {
                table: table.clone(),
                column: column.name.clone(),
            },
            Operation::AddConstraint {
                table, definition, ..
            } => Precondition::ConstraintAbsent {
                table: table.clone(),
                fragment: definition.clone(),
            },
            Operation::CreateIndex { name, .. } => Precondition::IndexAbsent { name: name.clone() },
            // Policy registration renders as an upsert, idempotent by itself.
            Operation::CreatePolicy { .. } => Precondition::None,
            Operation::DropObject { kind, name } => match kind {
                ObjectKind::Table => Precondition::TableExists(TableName::new(name.clone())),
                ObjectKind::Index => Precondition::IndexExists { name: name.clone() },
                ObjectKind::Policy => Precondition::PolicyExists(TableName::new(name.clone())),
            },
            Operation::DataBackfill {
                table,
                where_clause,
                ..
            } => Precondition::RowsMatch {
                table: table.clone(),
                where_clause: where_clause.clone(),
            },
            Operation::RawStatement { guard, .. } => match guard {
                Some(RawGuard::TableAbsent { table }) => Precondition::TableAbsent(table.clone()),
                Some(RawGuard::TableExists { table }) => Precondition::TableExists(table.clone()),
                Some(RawGuard::ColumnAbsent { table, column }) => Precondition::ColumnAbsent {
                    table: table.clone(),
                    column: column.clone(),
                },
                Some(RawGuard::ColumnExists { table, column }) => Precondition::ColumnExists {
                    table: table.clone(),
                    column: column.clone(),
                },
                None => Precondition::None,
            },
        }
    }

    /// Render the SQL statement this operation issues.
    ///
    /// `create_policy` and `drop_object: policy` write through the policy
    /// registry in the meta schema rather than issuing DDL.
    pub fn sql(&self) -> String {
        match self {
            Operation::CreateTable {
                table,
                columns,
                primary_key,
                checks,
                foreign_keys,
            } => {
                let mut parts: Vec<String> = columns.iter().map(ColumnDef::render).collect();
                if !primary_key.is_empty() {
                    parts.push(format!("PRIMARY KEY ({})", column_list(primary_key)));
                }
                for check in checks {
                    parts.push(format!("CHECK ({})", check));
                }
                for fk in foreign_keys {
                    parts.push(fk.render());
                }
                format!("CREATE TABLE {} ({})", table, parts.join(", "))
            }
            Operation::AddColumn { table, column } => {
                format!("ALTER TABLE {} ADD COLUMN {}", table, column.render())
            }
            Operation::AddConstraint {
                table,
                name,
                definition,
            } => format!("ALTER TABLE {} ADD CONSTRAINT {} {}", table, name, definition),
            Operation::CreateIndex {
                table,
                name,
                columns,
                unique,
            } => {
                let uniq = if *unique { "UNIQUE " } else { "" };
                format!(
                    "CREATE {}INDEX {} ON {} ({})",
                    uniq,
                    name,
                    table,
                    column_list(columns)
                )
            }
            Operation::CreatePolicy {
                table,
                tenant_column,
                allow_null,
            } => {
                let predicate = render_policy_predicate(tenant_column, *allow_null);
                format!(
                    "INSERT OR REPLACE INTO {}.tenant_policies \
                     (table_name, tenant_column, predicate, allow_null) \
                     VALUES ({}, {}, {}, {})",
                    META_SCHEMA,
                    quote_literal(table.as_str()),
                    quote_literal(tenant_column),
                    quote_literal(&predicate),
                    allow_null
                )
            }
            Operation::DropObject { kind, name } => match kind {
                ObjectKind::Table => format!("DROP TABLE {}", name),
                ObjectKind::Index => format!("DROP INDEX {}", name),
                ObjectKind::Policy => format!(
                    "DELETE FROM {}.tenant_policies WHERE table_name = {}",
                    META_SCHEMA,
                    quote_literal(name)
                ),
            },
            Operation::DataBackfill {
                table,
                set,
                where_clause,
            } => match where_clause {
                Some(filter) => format!("UPDATE {} SET {} WHERE {}", table, set, filter),
                None => format!("UPDATE {} SET {}", table, set),
            },
            Operation::RawStatement { sql, .. } => sql.clone(),
        }
    }

    /// Table this operation creates, if any. Used for dependency inference.
    pub fn creates_table(&self) -> Option<&TableName> {
        match self {
            Operation::CreateTable { table, .. } => Some(table),
            _ => None,
        }
    }

    /// Tables this operation requires to already exist.
    ///
    /// The resolver orders a unit after any unit creating one of these.
    pub fn referenced_tables(&self) -> Vec<TableName> {
        let mut tables = Vec::new();
        match self {
            Operation::CreateTable {
                columns,
                foreign_keys,
                ..
            } => {
                for col in columns {
                    if let Some(t) = &col.references {
                        tables.push(t.clone());
                    }
                }
                for fk in foreign_keys {
                    tables.push(fk.references.clone());
                }
            }
            Operation::AddColumn { table, column } => {
                tables.push(table.clone());
                if let Some(t) = &column.references {
                    tables.push(t.clone());
                }
            }
            Operation::AddConstraint { table, .. }
            | Operation::CreateIndex { table, .. }
            | Operation::CreatePolicy { table, .. }
            | Operation::DataBackfill { table, .. } => tables.push(table.clone()),
            Operation::DropObject { kind, name } => {
                // A drop must come after whatever created the object.
                if matches!(kind, ObjectKind::Table | ObjectKind::Policy) {
                    tables.push(TableName::new(name.clone()));
                }
            }
            Operation::RawStatement { guard, .. } => match guard {
                Some(RawGuard::TableExists { table })
                | Some(RawGuard::ColumnAbsent { table, .. })
                | Some(RawGuard::ColumnExists { table, .. }) => tables.push(table.clone()),
                _ => {}
            },
        }
        tables
    }

    /// Whether a unit containing this operation needs a tenant isolation
    /// re-verification after it commits.
    pub fn affects_isolation(&self) -> bool {
        matches!(
            self,
            Operation::CreateTable { .. }
                | Operation::AddColumn { .. }
                | Operation::CreatePolicy { .. }
                | Operation::DropObject { .. }
                | Operation::RawStatement { .. }
        )
    }

    /// Short human-readable description for logs and error messages.
    pub fn describe(&self) -> String {
        match self {
            Operation::CreateTable { table, .. } => format!("create_table {}", table),
            Operation::AddColumn { table, column } => {
                format!("add_column {}.{}", table, column.name)
            }
            Operation::AddConstraint { table, name, .. } => {
                format!("add_constraint {} on {}", name, table)
            }
            Operation::CreateIndex { name, table, .. } => {
                format!("create_index {} on {}", name, table)
            }
            Operation::CreatePolicy { table, .. } => format!("create_policy on {}", table),
            Operation::DropObject { kind, name } => {
                let kind = match kind {
                    ObjectKind::Table => "table",
                    ObjectKind::Index => "index",
                    ObjectKind::Policy => "policy",
                };
                format!("drop_{} {}", kind, name)
            }
            Operation::DataBackfill { table, .. } => format!("data_backfill {}", table),
            Operation::RawStatement { .. } => "raw_statement".to_string(),
        }
    }
}

/// Canonical isolation predicate for a tenant column.
///
/// `current_tenant()` stands for the session's tenant context; the verifier
/// compares registered predicates against this rendering after whitespace
/// normalization.
pub fn render_policy_predicate(tenant_column: &str, allow_null: bool) -> String {
    if allow_null {
        format!(
            "{col} = current_tenant() OR {col} IS NULL",
            col = tenant_column
        )
    } else {
        format!("{} = current_tenant()", tenant_column)
    }
}

#[cfg(test)]
#[path = "operation_test.rs"]
mod tests;
