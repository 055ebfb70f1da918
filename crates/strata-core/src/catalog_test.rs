use super::*;
use std::io::Write;

fn write_unit(dir: &Path, name: &str, yaml: &str) {
    let path = dir.join(format!("{}.yml", name));
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(yaml.as_bytes()).unwrap();
}

const TENANTS: &str = r#"
operations:
  - op: create_table
    table: tenants
    columns:
      - name: id
        type: UUID
        nullable: false
    primary_key: [id]
"#;

const WIDGETS: &str = r#"
depends_on: [0001_tenants]
operations:
  - op: create_table
    table: widgets
    columns:
      - name: id
        type: UUID
        nullable: false
"#;

#[test]
fn test_load_orders_by_identifier() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "0002_widgets", WIDGETS);
    write_unit(dir.path(), "0001_tenants", TENANTS);

    let catalog = Catalog::load(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.units()[0].name, "0001_tenants");
    assert_eq!(catalog.units()[1].name, "0002_widgets");
    assert!(catalog.contains("0002_widgets"));
    catalog.validate_dependencies().unwrap();
}

#[test]
fn test_duplicate_identifier_across_dirs() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    write_unit(dir_a.path(), "0001_tenants", TENANTS);
    write_unit(dir_b.path(), "0001_tenants", TENANTS);

    let err = Catalog::load(&[dir_a.path().to_path_buf(), dir_b.path().to_path_buf()])
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateUnit { ref name, .. } if name == "0001_tenants"));
}

#[test]
fn test_missing_directory() {
    let err = Catalog::load(&[PathBuf::from("/nonexistent/migrations")]).unwrap_err();
    assert!(matches!(err, CoreError::MigrationsDirNotFound { .. }));
}

#[test]
fn test_unknown_dependency() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "0002_widgets", WIDGETS);

    let catalog = Catalog::load(&[dir.path().to_path_buf()]).unwrap();
    let err = catalog.validate_dependencies().unwrap_err();
    assert!(matches!(
        err,
        CoreError::UnknownDependency { ref dependency, .. } if dependency == "0001_tenants"
    ));
}

#[test]
fn test_non_yaml_files_ignored() {
    let dir = tempfile::tempdir().unwrap();
    write_unit(dir.path(), "0001_tenants", TENANTS);
    std::fs::write(dir.path().join("README.md"), "notes").unwrap();

    let catalog = Catalog::load(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(catalog.len(), 1);
}
