//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use strata_core::{Config, CONFIG_FILE};
use strata_db::DuckDbBackend;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ExitCode is control flow, not a user-facing error; keep Display
        // empty so nothing leaks into stderr if anyhow ever prints it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Resolve the project root and load its configuration, applying any
/// `--config` and `--database` overrides.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<(Config, PathBuf)> {
    let project_root = PathBuf::from(&global.project_dir);
    let config_path = match &global.config {
        Some(path) => PathBuf::from(path),
        None => project_root.join(CONFIG_FILE),
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(database) = &global.database {
        config.database.path = database.clone();
    }
    log::debug!("loaded config for project '{}'", config.name);
    Ok((config, project_root))
}

/// Open the configured database, resolving a relative file path against the
/// project root.
pub(crate) fn connect(config: &Config, project_root: &Path) -> Result<DuckDbBackend> {
    let path = &config.database.path;
    let backend = if path == ":memory:" || Path::new(path).is_absolute() {
        DuckDbBackend::new(path)
    } else {
        DuckDbBackend::new(&project_root.join(path).to_string_lossy())
    };
    backend.with_context(|| format!("Failed to open database '{}'", path))
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
