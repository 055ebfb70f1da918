//! Configuration types and parsing for strata.yml

use crate::error::{CoreError, CoreResult};
use crate::table_name::TableName;
use crate::tenant::TenantTable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name looked up in the project directory.
pub const CONFIG_FILE: &str = "strata.yml";

/// Main project configuration from strata.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Project version
    #[serde(default = "default_version")]
    pub version: String,

    /// Directories containing migration unit files
    #[serde(default = "default_migration_paths")]
    pub migration_paths: Vec<String>,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Per-statement timeout in milliseconds
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,

    /// Tables the tenant isolation verifier must guard
    #[serde(default)]
    pub tenant_tables: Vec<TenantTable>,

    /// Entities governed by the versioned entity manager
    #[serde(default)]
    pub versioned_entities: Vec<VersionedEntityDef>,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database file path, or `:memory:`
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// Declaration of a draft/locked versioned entity table.
///
/// The table is expected to carry `id`, `root_id`, `version`, `status`, the
/// tenant-key column, and the declared data columns; migrations must create
/// a UNIQUE index on `(root_id, version)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VersionedEntityDef {
    /// Table holding the version chains
    pub table: TableName,

    /// Tenant-key column (default `tenant_id`)
    #[serde(default = "default_tenant_column")]
    pub tenant_column: String,

    /// Payload columns copied to the new row on fork
    pub data_columns: Vec<String>,
}

fn default_tenant_column() -> String {
    "tenant_id".to_string()
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_migration_paths() -> Vec<String> {
    vec!["migrations".to_string()]
}

fn default_database_path() -> String {
    "target/strata.duckdb".to_string()
}

fn default_statement_timeout_ms() -> u64 {
    30_000
}

impl Config {
    /// Load configuration from a specific file path.
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `strata.yml` from a project directory.
    pub fn find(project_dir: &Path) -> CoreResult<Self> {
        Self::load(&project_dir.join(CONFIG_FILE))
    }

    /// Validate cross-field constraints not expressible in serde.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "project name must not be empty".to_string(),
            });
        }
        if self.statement_timeout_ms == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "statement_timeout_ms must be positive".to_string(),
            });
        }
        for entity in &self.versioned_entities {
            if entity.data_columns.is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "versioned entity '{}' must declare at least one data column",
                        entity.table
                    ),
                });
            }
        }
        Ok(())
    }

    /// Migration directories resolved against the project root.
    pub fn migration_dirs(&self, project_root: &Path) -> Vec<PathBuf> {
        crate::catalog::migration_dirs(project_root, &self.migration_paths)
    }

    /// Tenant-table declaration for a given table name, if any.
    pub fn tenant_table(&self, table: &str) -> Option<&TenantTable> {
        self.tenant_tables.iter().find(|t| t.table == table)
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
