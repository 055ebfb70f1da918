//! Migration catalog: discovery and lexical ordering of unit files.

use crate::error::{CoreError, CoreResult};
use crate::unit::MigrationUnit;
use crate::unit_name::UnitName;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Ordered catalog of migration units discovered on disk.
///
/// Units are sorted by identifier; the dependency resolver refines this
/// order, falling back to it for unrelated units so runs are reproducible.
#[derive(Debug, Default)]
pub struct Catalog {
    units: Vec<MigrationUnit>,
    by_name: HashMap<UnitName, usize>,
}

impl Catalog {
    /// Discover `.yml` / `.yaml` unit files under the given directories.
    pub fn load(paths: &[PathBuf]) -> CoreResult<Self> {
        let mut units: Vec<MigrationUnit> = Vec::new();
        let mut seen: HashMap<UnitName, PathBuf> = HashMap::new();

        for dir in paths {
            if !dir.is_dir() {
                return Err(CoreError::MigrationsDirNotFound {
                    path: dir.display().to_string(),
                });
            }
            let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
                .map_err(|e| CoreError::IoWithPath {
                    path: dir.display().to_string(),
                    source: e,
                })?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| {
                    matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("yml") | Some("yaml")
                    )
                })
                .collect();
            files.sort();

            for path in files {
                let unit = MigrationUnit::from_file(&path)?;
                if let Some(previous) = seen.get(&unit.name) {
                    return Err(CoreError::DuplicateUnit {
                        name: unit.name.to_string(),
                        path1: previous.display().to_string(),
                        path2: path.display().to_string(),
                    });
                }
                seen.insert(unit.name.clone(), path);
                units.push(unit);
            }
        }

        units.sort_by(|a, b| a.name.cmp(&b.name));
        let by_name = units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.name.clone(), i))
            .collect();

        Ok(Self { units, by_name })
    }

    /// Build a catalog from already-parsed units (used by tests and embedding).
    pub fn from_units(mut units: Vec<MigrationUnit>) -> CoreResult<Self> {
        units.sort_by(|a, b| a.name.cmp(&b.name));
        let mut by_name = HashMap::new();
        for (i, unit) in units.iter().enumerate() {
            if by_name.insert(unit.name.clone(), i).is_some() {
                return Err(CoreError::DuplicateUnit {
                    name: unit.name.to_string(),
                    path1: unit.path.display().to_string(),
                    path2: unit.path.display().to_string(),
                });
            }
        }
        Ok(Self { units, by_name })
    }

    /// Units in identifier order.
    pub fn units(&self) -> &[MigrationUnit] {
        &self.units
    }

    /// Look up a unit by identifier.
    pub fn get(&self, name: &str) -> Option<&MigrationUnit> {
        self.by_name.get(name).map(|&i| &self.units[i])
    }

    /// Whether the catalog contains a unit with this identifier.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of units in the catalog.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Validate that every explicit dependency names a catalog unit.
    pub fn validate_dependencies(&self) -> CoreResult<()> {
        for unit in &self.units {
            for dep in &unit.depends_on {
                if !self.contains(dep) {
                    return Err(CoreError::UnknownDependency {
                        unit: unit.name.to_string(),
                        dependency: dep.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Resolve migration directories relative to a project root.
pub fn migration_dirs(project_root: &Path, configured: &[String]) -> Vec<PathBuf> {
    configured.iter().map(|p| project_root.join(p)).collect()
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
