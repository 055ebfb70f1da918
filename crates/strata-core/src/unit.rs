//! Migration unit: one named, atomic batch of schema operations.

use crate::checksum::compute_checksum;
use crate::error::{CoreError, CoreResult};
use crate::operation::Operation;
use crate::table_name::TableName;
use crate::unit_name::UnitName;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// On-disk YAML form of a migration unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct UnitFile {
    /// Free-form description, not part of the checksum
    #[serde(default)]
    description: Option<String>,

    /// Explicit dependency unit identifiers
    #[serde(default)]
    depends_on: Vec<UnitName>,

    /// Ordered operations
    operations: Vec<Operation>,
}

/// A parsed migration unit.
///
/// Immutable once recorded as applied: the tracker compares the stored
/// checksum against [`MigrationUnit::checksum`] on every run and refuses to
/// proceed on drift.
#[derive(Debug, Clone)]
pub struct MigrationUnit {
    /// Identifier taken from the file stem (e.g. `0007_installment_plans`)
    pub name: UnitName,

    /// Free-form description from the unit file
    pub description: Option<String>,

    /// Explicit dependencies declared in the file
    pub depends_on: Vec<UnitName>,

    /// Ordered operations
    pub operations: Vec<Operation>,

    /// Source path, kept for error reporting
    pub path: PathBuf,
}

impl MigrationUnit {
    /// Parse a unit from a YAML file; the identifier is the file stem.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(UnitName::try_new)
            .ok_or_else(|| CoreError::EmptyName {
                context: format!("unit file name in {}", path.display()),
            })?;

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        let file: UnitFile =
            serde_yaml::from_str(&content).map_err(|e| CoreError::UnitParseError {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            name,
            description: file.description,
            depends_on: file.depends_on,
            operations: file.operations,
            path: path.to_path_buf(),
        })
    }

    /// SHA-256 checksum over the canonical JSON of the operation list.
    ///
    /// The description and dependency metadata are excluded so documentation
    /// edits do not register as drift.
    pub fn checksum(&self) -> CoreResult<String> {
        let canonical = serde_json::to_string(&self.operations)?;
        Ok(compute_checksum(&canonical))
    }

    /// Tables created by this unit.
    pub fn created_tables(&self) -> Vec<&TableName> {
        self.operations
            .iter()
            .filter_map(Operation::creates_table)
            .collect()
    }

    /// Tables this unit requires to exist, excluding ones it creates itself.
    pub fn referenced_tables(&self) -> Vec<TableName> {
        let own: HashSet<&TableName> = self.created_tables().into_iter().collect();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for op in &self.operations {
            for table in op.referenced_tables() {
                if !own.contains(&table) && seen.insert(table.clone()) {
                    out.push(table);
                }
            }
        }
        out
    }

    /// Whether the tenant isolation verifier must re-run after this unit.
    pub fn affects_isolation(&self) -> bool {
        self.operations.iter().any(Operation::affects_isolation)
    }
}

#[cfg(test)]
#[path = "unit_test.rs"]
mod tests;
