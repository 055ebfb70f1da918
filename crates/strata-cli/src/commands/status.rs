//! Status command implementation - applied, pending, and drifted units

use anyhow::{Context, Result};
use serde::Serialize;
use strata_engine::{Outcome, Runner, StatusReport};

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{connect, load_config};

#[derive(Debug, Serialize)]
struct RecordJson {
    unit: String,
    checksum: String,
    applied_at: String,
    outcome: String,
}

#[derive(Debug, Serialize)]
struct StatusJson {
    applied: Vec<RecordJson>,
    pending: Vec<String>,
    drifted: Vec<String>,
}

/// Execute the status command
pub(crate) async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let (config, project_root) = load_config(global)?;
    let db = connect(&config, &project_root)?;
    let runner = Runner::new(&db, &config, &project_root);

    let report = runner.status().await.context("Failed to query status")?;

    match args.output {
        StatusOutput::Json => print_json(&report)?,
        StatusOutput::Table => print_table(&report),
    }
    Ok(())
}

fn print_json(report: &StatusReport) -> Result<()> {
    let out = StatusJson {
        applied: report
            .records
            .iter()
            .map(|r| RecordJson {
                unit: r.unit_id.to_string(),
                checksum: r.checksum.clone(),
                applied_at: r.applied_at.clone(),
                outcome: r.outcome.as_str().to_string(),
            })
            .collect(),
        pending: report.pending.iter().map(|u| u.to_string()).collect(),
        drifted: report.drifted.iter().map(|u| u.to_string()).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_table(report: &StatusReport) {
    if report.records.is_empty() {
        println!("No units have been applied yet.");
    } else {
        println!("{:<40} {:<10} {}", "UNIT", "OUTCOME", "APPLIED AT");
        for record in &report.records {
            let mut outcome = record.outcome.as_str().to_string();
            if record.outcome == Outcome::Success && report.drifted.contains(&record.unit_id) {
                outcome.push_str(" (drifted)");
            }
            println!(
                "{:<40} {:<10} {}",
                record.unit_id, outcome, record.applied_at
            );
        }
    }

    if report.pending.is_empty() {
        println!("\nUp to date: no pending units.");
    } else {
        println!("\nPending ({}):", report.pending.len());
        for unit in &report.pending {
            println!("  {}", unit);
        }
    }
}
