//! Migration run orchestration.
//!
//! The runner owns the end-to-end shape of `strata up`: bootstrap the meta
//! schema, take the run lock, resolve order, check drift, apply pending
//! units one transaction at a time, and keep the tenant isolation verifier
//! in the loop. The run fails fast on the first unit error; previously
//! committed units stay committed and the failed unit stays pending.
//!
//! Isolation verification happens at three points. Before the first unit,
//! existing gaps are snapshotted as the baseline (logged, not fatal, or a
//! gap could never be repaired by a migration). After each committed unit
//! that touches isolation-relevant state, the tables that existed before
//! the run are re-checked and any finding not in the baseline fails the
//! run, attributing the regression to the unit that introduced it; this is
//! what enforces the rule that a unit relaxing a tenant column's
//! nullability must register the matching policy update itself. Finally,
//! the whole declared set must verify clean at end of run, so tables
//! created during the run are checked after the units registering their
//! policies have had a chance to run, and baseline gaps must have been
//! repaired by the units that just ran.

use crate::error::{EngineError, EngineResult};
use crate::executor::Executor;
use crate::lock::RunLock;
use crate::meta;
use crate::tracker::{AppliedRecord, AppliedSet, Outcome};
use crate::verifier::{IsolationFinding, IsolationVerifier};
use std::path::{Path, PathBuf};
use strata_core::{Catalog, Config, CoreError, TenantTable, UnitDag, UnitName};
use strata_db::Database;

/// Result of an `up` run.
#[derive(Debug)]
pub struct UpOutcome {
    /// Units that were pending when the run started, in application order
    pub pending: Vec<UnitName>,
    /// Units actually applied by this run
    pub applied: Vec<UnitName>,
    pub dry_run: bool,
}

/// Result of a `status` query.
#[derive(Debug)]
pub struct StatusReport {
    /// All applied-set records, oldest first
    pub records: Vec<AppliedRecord>,
    /// Units not yet successfully applied, in application order
    pub pending: Vec<UnitName>,
    /// Applied units whose on-disk checksum no longer matches the record
    pub drifted: Vec<UnitName>,
}

/// Orchestrator over one database and one project configuration.
pub struct Runner<'a> {
    db: &'a dyn Database,
    config: &'a Config,
    project_root: PathBuf,
}

impl<'a> Runner<'a> {
    pub fn new(db: &'a dyn Database, config: &'a Config, project_root: &Path) -> Self {
        Self {
            db,
            config,
            project_root: project_root.to_path_buf(),
        }
    }

    fn load_catalog(&self) -> EngineResult<Catalog> {
        let dirs = self.config.migration_dirs(&self.project_root);
        Ok(Catalog::load(&dirs)?)
    }

    /// Apply all pending units. With `dry_run` the pending list is resolved
    /// and returned but nothing is executed (and no lock is taken).
    pub async fn up(&self, dry_run: bool) -> EngineResult<UpOutcome> {
        meta::bootstrap(self.db).await?;
        let catalog = self.load_catalog()?;
        let dag = UnitDag::build(&catalog)?;
        let tracker = AppliedSet::new(self.db);

        if dry_run {
            tracker.check_drift(&catalog).await?;
            let pending = tracker.pending(&dag).await?;
            log::info!("dry run: {} unit(s) pending", pending.len());
            return Ok(UpOutcome {
                pending,
                applied: Vec::new(),
                dry_run: true,
            });
        }

        // The lock covers pending-set computation too, so two concurrent
        // runs cannot resolve the same plan.
        let owner = format!("{}@{}", self.config.name, std::process::id());
        let mut lock = RunLock::acquire(self.db, &owner).await?;
        let result = self.run_locked(&catalog, &dag, &tracker).await;
        let released = lock.release().await;
        let (pending, applied) = result?;
        released?;

        log::info!("applied {} of {} pending unit(s)", applied.len(), pending.len());
        Ok(UpOutcome {
            pending,
            applied,
            dry_run: false,
        })
    }

    async fn run_locked(
        &self,
        catalog: &Catalog,
        dag: &UnitDag,
        tracker: &AppliedSet<'_>,
    ) -> EngineResult<(Vec<UnitName>, Vec<UnitName>)> {
        tracker.check_drift(catalog).await?;
        let pending = tracker.pending(dag).await?;
        let applied = self.apply_pending(catalog, &pending).await?;
        Ok((pending, applied))
    }

    async fn apply_pending(
        &self,
        catalog: &Catalog,
        pending: &[UnitName],
    ) -> EngineResult<Vec<UnitName>> {
        let verifier = IsolationVerifier::new(self.db);

        // Declared tenant tables that exist before the run. These are the
        // ones re-checked after every isolation-affecting unit; tables the
        // run itself creates are only held to the end-of-run check.
        let mut pre_existing: Vec<TenantTable> = Vec::new();
        for decl in &self.config.tenant_tables {
            if self.db.table_exists(decl.table.as_str()).await? {
                pre_existing.push(decl.clone());
            }
        }

        let baseline = verifier.findings(&self.config.tenant_tables).await?;
        for finding in &baseline {
            log::warn!(
                "pre-existing isolation gap on {}: {}",
                finding.table,
                finding.reason
            );
        }

        let executor = Executor::new(self.db, self.config.statement_timeout_ms);
        let mut applied = Vec::new();
        for name in pending {
            let unit = catalog.get(name).ok_or_else(|| {
                EngineError::Core(CoreError::UnitNotFound {
                    name: name.to_string(),
                })
            })?;
            executor.apply_unit(unit).await?;
            applied.push(name.clone());

            if unit.affects_isolation() {
                let findings = verifier.findings(&pre_existing).await?;
                if let Some(new) = findings.iter().find(|f| {
                    !baseline
                        .iter()
                        .any(|b| b.table == f.table && b.reason == f.reason)
                }) {
                    return Err(EngineError::IsolationGap {
                        table: new.table.clone(),
                        reason: format!("{} (introduced by unit '{}')", new.reason, name),
                    });
                }
            }
        }

        verifier.verify(&self.config.tenant_tables).await?;
        Ok(applied)
    }

    /// Report applied, pending, and drifted units without touching anything.
    pub async fn status(&self) -> EngineResult<StatusReport> {
        meta::bootstrap(self.db).await?;
        let catalog = self.load_catalog()?;
        let dag = UnitDag::build(&catalog)?;
        let tracker = AppliedSet::new(self.db);

        let records = tracker.records().await?;
        let pending = tracker.pending(&dag).await?;

        let mut drifted = Vec::new();
        for record in &records {
            if record.outcome != Outcome::Success {
                continue;
            }
            if let Some(unit) = catalog.get(&record.unit_id) {
                if unit.checksum()? != record.checksum {
                    drifted.push(record.unit_id.clone());
                }
            }
        }

        Ok(StatusReport {
            records,
            pending,
            drifted,
        })
    }

    /// Run the isolation verifier over every declared tenant table and
    /// return all findings (empty means the schema is clean).
    pub async fn verify(&self) -> EngineResult<Vec<IsolationFinding>> {
        meta::bootstrap(self.db).await?;
        let verifier = IsolationVerifier::new(self.db);
        verifier.findings(&self.config.tenant_tables).await
    }
}
