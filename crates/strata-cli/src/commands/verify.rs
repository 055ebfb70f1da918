//! Verify command implementation - tenant isolation check

use anyhow::{Context, Result};
use strata_engine::Runner;

use crate::cli::{GlobalArgs, VerifyArgs};
use crate::commands::common::{connect, load_config, ExitCode};

/// Execute the verify command
pub(crate) async fn execute(_args: &VerifyArgs, global: &GlobalArgs) -> Result<()> {
    let (config, project_root) = load_config(global)?;
    if config.tenant_tables.is_empty() {
        println!("No tenant tables declared; nothing to verify.");
        return Ok(());
    }

    let db = connect(&config, &project_root)?;
    let runner = Runner::new(&db, &config, &project_root);

    let findings = runner
        .verify()
        .await
        .context("Isolation verification failed to run")?;

    if findings.is_empty() {
        println!(
            "Isolation verified: {} tenant table(s) clean.",
            config.tenant_tables.len()
        );
        return Ok(());
    }

    println!("Found {} isolation gap(s):", findings.len());
    for finding in &findings {
        println!("  {}: {}", finding.table, finding.reason);
    }
    Err(ExitCode(1).into())
}
