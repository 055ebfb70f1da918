//! Up command implementation - apply pending migration units

use anyhow::{Context, Result};
use strata_engine::Runner;

use crate::cli::{GlobalArgs, UpArgs};
use crate::commands::common::{connect, load_config};

/// Execute the up command
pub(crate) async fn execute(args: &UpArgs, global: &GlobalArgs) -> Result<()> {
    let (config, project_root) = load_config(global)?;
    let db = connect(&config, &project_root)?;
    let runner = Runner::new(&db, &config, &project_root);

    let outcome = runner
        .up(args.dry_run)
        .await
        .context("Migration run failed")?;

    if outcome.dry_run {
        if outcome.pending.is_empty() {
            println!("Nothing to apply: all units are up to date.");
        } else {
            println!("Would apply {} unit(s):", outcome.pending.len());
            for unit in &outcome.pending {
                println!("  {}", unit);
            }
        }
        return Ok(());
    }

    if outcome.applied.is_empty() {
        println!("Nothing to apply: all units are up to date.");
    } else {
        for unit in &outcome.applied {
            println!("Applied {}", unit);
        }
        println!("\nApplied {} unit(s).", outcome.applied.len());
    }

    Ok(())
}
