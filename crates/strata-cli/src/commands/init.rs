//! Init command implementation - scaffolds a new strata project

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::cli::InitArgs;

/// Execute the init command
pub(crate) async fn execute(args: &InitArgs) -> Result<()> {
    // Reject names that could cause path traversal or confusing directory names
    if args.name.contains('/')
        || args.name.contains('\\')
        || args.name.contains("..")
        || args.name.starts_with('.')
        || args.name.starts_with('-')
    {
        anyhow::bail!(
            "Invalid project name '{}': must not contain '/', '\\', '..', or start with '.' or '-'",
            args.name
        );
    }

    let project_dir = Path::new(&args.name);

    if project_dir.exists() {
        anyhow::bail!(
            "Directory '{}' already exists. Choose a different project name.",
            args.name
        );
    }

    println!("Creating new strata project: {}\n", args.name);

    let migrations_dir = project_dir.join("migrations");
    fs::create_dir_all(&migrations_dir)
        .with_context(|| format!("Failed to create directory: {}", migrations_dir.display()))?;

    // Escape YAML special characters in interpolated values
    let safe_name = args.name.replace('"', "\\\"");
    let safe_db_path = args.database_path.replace('"', "\\\"");
    let config_content = format!(
        r#"name: "{safe_name}"
version: "0.1.0"

migration_paths: ["migrations"]

database:
  path: "{safe_db_path}"

# Per-statement timeout in milliseconds
statement_timeout_ms: 30000

# Tables the isolation verifier must guard. Every table listed here needs a
# create_policy operation in some migration unit.
#
# tenant_tables:
#   - table: widgets
#     tenant_column: tenant_id
#     mode: strict          # or shared_global to allow null tenant keys

# Draft/locked version chains managed through the versioned entity API.
#
# versioned_entities:
#   - table: installment_plans
#     data_columns: [title, total_cents]
"#
    );
    fs::write(project_dir.join("strata.yml"), config_content)
        .context("Failed to write strata.yml")?;

    let starter_unit = r#"description: example tenant-scoped table
operations:
  - op: create_table
    table: widgets
    columns:
      - name: id
        type: VARCHAR
        nullable: false
      - name: tenant_id
        type: VARCHAR
        nullable: false
      - name: label
        type: VARCHAR
    primary_key: [id]

  - op: create_policy
    table: widgets
"#;
    fs::write(migrations_dir.join("0001_widgets.yml"), starter_unit)
        .context("Failed to write starter migration unit")?;

    println!("Created:");
    println!("  {}/strata.yml", args.name);
    println!("  {}/migrations/0001_widgets.yml", args.name);
    println!("\nNext steps:");
    println!("  cd {}", args.name);
    println!("  strata up");

    Ok(())
}
