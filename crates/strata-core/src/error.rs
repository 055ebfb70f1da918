//! Error types for strata-core

use thiserror::Error;

/// Core error type for strata
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Migrations directory not found
    #[error("[E004] Migrations directory not found: {path}")]
    MigrationsDirNotFound { path: String },

    /// E005: Migration unit not found in the catalog
    #[error("[E005] Migration unit not found: {name}")]
    UnitNotFound { name: String },

    /// E006: Failed to parse a migration unit file
    #[error("[E006] Failed to parse migration unit {name}: {message}")]
    UnitParseError { name: String, message: String },

    /// E007: Dependency cycle among migration units
    #[error("[E007] Dependency cycle detected: {cycle}")]
    DependencyCycle { cycle: String },

    /// E008: Duplicate migration unit identifier
    #[error("[E008] Duplicate migration unit '{name}' in {path1} and {path2}")]
    DuplicateUnit {
        name: String,
        path1: String,
        path2: String,
    },

    /// E009: A unit declares a dependency on an unknown unit
    #[error("[E009] Unit '{unit}' depends on unknown unit '{dependency}'")]
    UnknownDependency { unit: String, dependency: String },

    /// E010: Empty name where a non-empty identifier is required
    #[error("[E010] Empty name: {context}")]
    EmptyName { context: String },

    /// E011: IO error
    #[error("[E011] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E012: IO error with file path context
    #[error("[E012] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E013: YAML parse error
    #[error("[E013] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
