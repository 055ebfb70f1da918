use super::*;
use std::io::Write;

fn write_unit(dir: &Path, name: &str, yaml: &str) -> PathBuf {
    let path = dir.join(format!("{}.yml", name));
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(yaml.as_bytes()).unwrap();
    path
}

const WIDGETS_YAML: &str = r#"
description: widgets table
depends_on: [0001_tenants]
operations:
  - op: create_table
    table: widgets
    columns:
      - name: id
        type: UUID
        nullable: false
      - name: tenant_id
        type: UUID
        nullable: false
    primary_key: [id]
    foreign_keys:
      - columns: [tenant_id]
        references: tenants
        referenced_columns: [id]
        on_delete: cascade
"#;

#[test]
fn test_parse_unit_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_unit(dir.path(), "0002_widgets", WIDGETS_YAML);

    let unit = MigrationUnit::from_file(&path).unwrap();
    assert_eq!(unit.name, "0002_widgets");
    assert_eq!(unit.depends_on, vec![UnitName::new("0001_tenants")]);
    assert_eq!(unit.operations.len(), 1);
    assert_eq!(unit.created_tables(), vec![&TableName::new("widgets")]);
    assert_eq!(unit.referenced_tables(), vec![TableName::new("tenants")]);
    assert!(unit.affects_isolation());
}

#[test]
fn test_checksum_ignores_description() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_unit(dir.path(), "0002_widgets", WIDGETS_YAML);
    let b = write_unit(
        dir.path(),
        "0002_widgets_b",
        &WIDGETS_YAML.replace("widgets table", "edited description"),
    );

    let unit_a = MigrationUnit::from_file(&a).unwrap();
    let unit_b = MigrationUnit::from_file(&b).unwrap();
    assert_eq!(unit_a.checksum().unwrap(), unit_b.checksum().unwrap());
}

#[test]
fn test_checksum_changes_with_operations() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_unit(dir.path(), "0002_widgets", WIDGETS_YAML);
    let b = write_unit(
        dir.path(),
        "0002_widgets_b",
        &WIDGETS_YAML.replace("cascade", "set_null"),
    );

    let unit_a = MigrationUnit::from_file(&a).unwrap();
    let unit_b = MigrationUnit::from_file(&b).unwrap();
    assert_ne!(unit_a.checksum().unwrap(), unit_b.checksum().unwrap());
}

#[test]
fn test_parse_error_names_unit() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_unit(dir.path(), "0003_broken", "operations: [{op: nonsense}]");

    let err = MigrationUnit::from_file(&path).unwrap_err();
    assert!(matches!(err, CoreError::UnitParseError { ref name, .. } if name == "0003_broken"));
}

#[test]
fn test_referenced_tables_excludes_self_created() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = r#"
operations:
  - op: create_table
    table: plans
    columns:
      - name: id
        type: UUID
        nullable: false
  - op: create_index
    table: plans
    name: uq_plans_root_version
    columns: [root_id, version]
    unique: true
"#;
    let path = write_unit(dir.path(), "0004_plans", yaml);
    let unit = MigrationUnit::from_file(&path).unwrap();
    assert!(unit.referenced_tables().is_empty());
}
