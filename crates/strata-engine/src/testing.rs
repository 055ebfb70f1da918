//! Helpers shared by the engine's unit and integration tests.

use strata_core::{ColumnDef, ForeignKey, MigrationUnit, ObjectKind, Operation, TableName, UnitName};
use strata_db::DuckDbBackend;
use std::path::PathBuf;

/// Fresh in-memory DuckDB backend.
pub fn memory_db() -> DuckDbBackend {
    DuckDbBackend::in_memory().expect("in-memory duckdb")
}

/// Build a unit from parts without touching the filesystem.
pub fn unit(name: &str, depends_on: &[&str], operations: Vec<Operation>) -> MigrationUnit {
    MigrationUnit {
        name: UnitName::new(name),
        description: None,
        depends_on: depends_on.iter().map(|d| UnitName::new(*d)).collect(),
        operations,
        path: PathBuf::new(),
    }
}

/// Simple column definition.
pub fn column(name: &str, data_type: &str, nullable: bool) -> ColumnDef {
    ColumnDef {
        name: name.to_string(),
        data_type: data_type.to_string(),
        nullable,
        default: None,
        references: None,
        references_column: None,
    }
}

/// `create_table` operation with an `id` primary key and a tenant column.
pub fn create_tenant_table(table: &str) -> Operation {
    Operation::CreateTable {
        table: TableName::new(table),
        columns: vec![
            column("id", "VARCHAR", false),
            column("tenant_id", "VARCHAR", false),
        ],
        primary_key: vec!["id".to_string()],
        checks: vec![],
        foreign_keys: vec![],
    }
}

/// `create_policy` operation with the default tenant column.
pub fn create_policy(table: &str, allow_null: bool) -> Operation {
    Operation::CreatePolicy {
        table: TableName::new(table),
        tenant_column: "tenant_id".to_string(),
        allow_null,
    }
}

/// `create_table` with a foreign key to another table.
pub fn create_table_with_fk(table: &str, referenced: &str) -> Operation {
    Operation::CreateTable {
        table: TableName::new(table),
        columns: vec![column("id", "VARCHAR", false), column("parent_id", "VARCHAR", true)],
        primary_key: vec!["id".to_string()],
        checks: vec![],
        foreign_keys: vec![ForeignKey {
            columns: vec!["parent_id".to_string()],
            references: TableName::new(referenced),
            referenced_columns: vec!["id".to_string()],
            on_delete: None,
        }],
    }
}

/// `drop_object` for a table.
pub fn drop_table(table: &str) -> Operation {
    Operation::DropObject {
        kind: ObjectKind::Table,
        name: table.to_string(),
    }
}
