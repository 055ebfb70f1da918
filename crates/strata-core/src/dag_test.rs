use super::*;
use crate::operation::{ColumnDef, ForeignKey, Operation};
use crate::unit::MigrationUnit;
use std::path::PathBuf;

fn unit(name: &str, depends_on: &[&str], operations: Vec<Operation>) -> MigrationUnit {
    MigrationUnit {
        name: UnitName::new(name),
        description: None,
        depends_on: depends_on.iter().map(|d| UnitName::new(*d)).collect(),
        operations,
        path: PathBuf::new(),
    }
}

fn create_table(table: &str) -> Operation {
    Operation::CreateTable {
        table: TableName::new(table),
        columns: vec![ColumnDef {
            name: "id".to_string(),
            data_type: "UUID".to_string(),
            nullable: false,
            default: None,
            references: None,
            references_column: None,
        }],
        primary_key: vec!["id".to_string()],
        checks: vec![],
        foreign_keys: vec![],
    }
}

fn create_table_with_fk(table: &str, referenced: &str) -> Operation {
    Operation::CreateTable {
        table: TableName::new(table),
        columns: vec![ColumnDef {
            name: "id".to_string(),
            data_type: "UUID".to_string(),
            nullable: false,
            default: None,
            references: None,
            references_column: None,
        }],
        primary_key: vec![],
        checks: vec![],
        foreign_keys: vec![ForeignKey {
            columns: vec!["id".to_string()],
            references: TableName::new(referenced),
            referenced_columns: vec![],
            on_delete: None,
        }],
    }
}

#[test]
fn test_explicit_dependency_order() {
    let catalog = Catalog::from_units(vec![
        unit("0002_widgets", &["0001_tenants"], vec![create_table("widgets")]),
        unit("0001_tenants", &[], vec![create_table("tenants")]),
    ])
    .unwrap();

    let dag = UnitDag::build(&catalog).unwrap();
    let order = dag.application_order().unwrap();
    assert_eq!(
        order,
        vec![UnitName::new("0001_tenants"), UnitName::new("0002_widgets")]
    );
}

#[test]
fn test_referential_inference() {
    // 0009 references a table created by 0010: lexical order alone would be
    // wrong, inference must put the creator first.
    let catalog = Catalog::from_units(vec![
        unit(
            "0009_invoices",
            &[],
            vec![create_table_with_fk("invoices", "contracts")],
        ),
        unit("0010_contracts", &[], vec![create_table("contracts")]),
    ])
    .unwrap();

    let dag = UnitDag::build(&catalog).unwrap();
    let order = dag.application_order().unwrap();
    assert_eq!(
        order,
        vec![
            UnitName::new("0010_contracts"),
            UnitName::new("0009_invoices")
        ]
    );
}

#[test]
fn test_unrelated_units_in_identifier_order() {
    let catalog = Catalog::from_units(vec![
        unit("0003_c", &[], vec![create_table("c")]),
        unit("0001_a", &[], vec![create_table("a")]),
        unit("0002_b", &[], vec![create_table("b")]),
    ])
    .unwrap();

    let dag = UnitDag::build(&catalog).unwrap();
    let order = dag.application_order().unwrap();
    assert_eq!(
        order,
        vec![
            UnitName::new("0001_a"),
            UnitName::new("0002_b"),
            UnitName::new("0003_c")
        ]
    );
}

#[test]
fn test_dependency_cycle_is_error() {
    let catalog = Catalog::from_units(vec![
        unit("0001_a", &["0002_b"], vec![create_table("a")]),
        unit("0002_b", &["0001_a"], vec![create_table("b")]),
    ])
    .unwrap();

    let result = UnitDag::build(&catalog);
    assert!(matches!(
        result.unwrap_err(),
        CoreError::DependencyCycle { .. }
    ));
}

#[test]
fn test_total_order_property() {
    // Every unit must come after all of its dependencies.
    let catalog = Catalog::from_units(vec![
        unit("0001_tenants", &[], vec![create_table("tenants")]),
        unit(
            "0002_contracts",
            &[],
            vec![create_table_with_fk("contracts", "tenants")],
        ),
        unit(
            "0003_invoices",
            &["0001_tenants"],
            vec![create_table_with_fk("invoices", "contracts")],
        ),
        unit("0004_tasks", &[], vec![create_table("tasks")]),
    ])
    .unwrap();

    let dag = UnitDag::build(&catalog).unwrap();
    let order = dag.application_order().unwrap();
    assert_eq!(order.len(), 4);

    let pos = |name: &str| order.iter().position(|u| u == name).unwrap();
    for unit in catalog.units() {
        for dep in dag.dependencies(&unit.name) {
            assert!(pos(dep.as_str()) < pos(unit.name.as_str()));
        }
    }
}

#[test]
fn test_drop_ordered_after_creator() {
    let catalog = Catalog::from_units(vec![
        unit(
            "0001_shop",
            &[],
            vec![create_table("shop_orders")],
        ),
        unit(
            "0000_drop_shop",
            &[],
            vec![Operation::DropObject {
                kind: crate::operation::ObjectKind::Table,
                name: "shop_orders".to_string(),
            }],
        ),
    ])
    .unwrap();

    let dag = UnitDag::build(&catalog).unwrap();
    let order = dag.application_order().unwrap();
    assert_eq!(
        order,
        vec![UnitName::new("0001_shop"), UnitName::new("0000_drop_shop")]
    );
}

#[test]
fn test_external_table_reference_imposes_no_order() {
    // contracts is not created by any catalog unit (pre-existing table).
    let catalog = Catalog::from_units(vec![unit(
        "0001_invoices",
        &[],
        vec![create_table_with_fk("invoices", "contracts")],
    )])
    .unwrap();

    let dag = UnitDag::build(&catalog).unwrap();
    let order = dag.application_order().unwrap();
    assert_eq!(order, vec![UnitName::new("0001_invoices")]);
}
