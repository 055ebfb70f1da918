use super::*;

fn uuid_col(name: &str, nullable: bool) -> ColumnDef {
    ColumnDef {
        name: name.to_string(),
        data_type: "UUID".to_string(),
        nullable,
        default: None,
        references: None,
        references_column: None,
    }
}

#[test]
fn test_create_table_sql() {
    let op = Operation::CreateTable {
        table: TableName::new("widgets"),
        columns: vec![uuid_col("id", false), uuid_col("tenant_id", false)],
        primary_key: vec!["id".to_string()],
        checks: vec![],
        foreign_keys: vec![ForeignKey {
            columns: vec!["tenant_id".to_string()],
            references: TableName::new("tenants"),
            referenced_columns: vec!["id".to_string()],
            on_delete: Some(OnDeleteAction::Cascade),
        }],
    };
    assert_eq!(
        op.sql(),
        "CREATE TABLE widgets (id UUID NOT NULL, tenant_id UUID NOT NULL, \
         PRIMARY KEY (id), FOREIGN KEY (tenant_id) REFERENCES tenants(id) ON DELETE CASCADE)"
    );
}

#[test]
fn test_add_column_sql_and_precondition() {
    let op = Operation::AddColumn {
        table: TableName::new("contracts"),
        column: ColumnDef {
            name: "locked_at".to_string(),
            data_type: "TIMESTAMP".to_string(),
            nullable: true,
            default: None,
            references: None,
            references_column: None,
        },
    };
    assert_eq!(op.sql(), "ALTER TABLE contracts ADD COLUMN locked_at TIMESTAMP");
    assert_eq!(
        op.precondition(),
        Precondition::ColumnAbsent {
            table: TableName::new("contracts"),
            column: "locked_at".to_string(),
        }
    );
}

#[test]
fn test_create_index_sql() {
    let op = Operation::CreateIndex {
        table: TableName::new("plans"),
        name: "uq_plans_root_version".to_string(),
        columns: vec!["root_id".to_string(), "version".to_string()],
        unique: true,
    };
    assert_eq!(
        op.sql(),
        "CREATE UNIQUE INDEX uq_plans_root_version ON plans (root_id, version)"
    );
}

#[test]
fn test_create_policy_renders_registry_upsert() {
    let op = Operation::CreatePolicy {
        table: TableName::new("widgets"),
        tenant_column: "tenant_id".to_string(),
        allow_null: false,
    };
    let sql = op.sql();
    assert!(sql.starts_with("INSERT OR REPLACE INTO strata_meta.tenant_policies"));
    assert!(sql.contains("'tenant_id = current_tenant()'"));
    assert_eq!(op.precondition(), Precondition::None);
}

#[test]
fn test_shared_global_predicate_accepts_null() {
    let predicate = render_policy_predicate("tenant_id", true);
    assert_eq!(
        predicate,
        "tenant_id = current_tenant() OR tenant_id IS NULL"
    );
}

#[test]
fn test_referenced_tables_from_foreign_keys() {
    let op = Operation::CreateTable {
        table: TableName::new("invoices"),
        columns: vec![ColumnDef {
            name: "contract_id".to_string(),
            data_type: "UUID".to_string(),
            nullable: true,
            default: None,
            references: Some(TableName::new("contracts")),
            references_column: Some("id".to_string()),
        }],
        primary_key: vec![],
        checks: vec![],
        foreign_keys: vec![ForeignKey {
            columns: vec!["tenant_id".to_string()],
            references: TableName::new("tenants"),
            referenced_columns: vec![],
            on_delete: None,
        }],
    };
    let refs = op.referenced_tables();
    assert!(refs.contains(&TableName::new("contracts")));
    assert!(refs.contains(&TableName::new("tenants")));
    assert_eq!(op.creates_table(), Some(&TableName::new("invoices")));
}

#[test]
fn test_drop_table_orders_after_creator() {
    let op = Operation::DropObject {
        kind: ObjectKind::Table,
        name: "shop_orders".to_string(),
    };
    assert_eq!(op.referenced_tables(), vec![TableName::new("shop_orders")]);
    assert_eq!(
        op.precondition(),
        Precondition::TableExists(TableName::new("shop_orders"))
    );
}

#[test]
fn test_yaml_roundtrip_internally_tagged() {
    let yaml = r#"
op: add_constraint
table: payroll_entries
name: chk_amount_positive
definition: CHECK (amount >= 0)
"#;
    let op: Operation = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        op.sql(),
        "ALTER TABLE payroll_entries ADD CONSTRAINT chk_amount_positive CHECK (amount >= 0)"
    );
}

#[test]
fn test_backfill_guard() {
    let op = Operation::DataBackfill {
        table: TableName::new("tasks"),
        set: "priority = 3".to_string(),
        where_clause: Some("priority IS NULL".to_string()),
    };
    assert_eq!(
        op.sql(),
        "UPDATE tasks SET priority = 3 WHERE priority IS NULL"
    );
    assert_eq!(
        op.precondition(),
        Precondition::RowsMatch {
            table: TableName::new("tasks"),
            where_clause: Some("priority IS NULL".to_string()),
        }
    );
}

#[test]
fn test_raw_statement_guard_mapping() {
    let yaml = r#"
op: raw_statement
sql: ALTER TABLE plans ALTER COLUMN tenant_id DROP NOT NULL
guard:
  kind: column_exists
  table: plans
  column: tenant_id
"#;
    let op: Operation = serde_yaml::from_str(yaml).unwrap();
    assert!(op.affects_isolation());
    assert_eq!(
        op.precondition(),
        Precondition::ColumnExists {
            table: TableName::new("plans"),
            column: "tenant_id".to_string(),
        }
    );
}
