//! Versioned entity manager: draft/locked version chains.
//!
//! A chain is the set of rows sharing a `root_id`. Exactly one row per chain
//! may be Draft and it is always the highest version; Locked rows are
//! immutable history. Editing a Locked head forks the chain: a new Draft at
//! version N+1 is inserted and the old row is never touched.
//!
//! Migrations that create a governed table must also create a UNIQUE index
//! on `(root_id, version)`; the manager relies on it as the backstop that
//! turns a lost concurrent-fork race into [`EngineError::VersionConflict`].

use crate::error::{EngineError, EngineResult};
use strata_core::sql_utils::{column_list, quote_literal};
use strata_core::{TableName, TenantContext, TenantMode, TenantTable, VersionedEntityDef};
use strata_db::Database;
use uuid::Uuid;

/// Lifecycle state of one version row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStatus {
    Draft,
    Locked,
}

impl VersionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VersionStatus::Draft => "draft",
            VersionStatus::Locked => "locked",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(VersionStatus::Draft),
            "locked" => Some(VersionStatus::Locked),
            _ => None,
        }
    }
}

/// One row of a version chain.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRow {
    pub id: Uuid,
    pub root_id: Uuid,
    pub version: i64,
    pub status: VersionStatus,
}

/// Manager for one declared versioned entity table.
pub struct VersionedEntityManager<'a> {
    db: &'a dyn Database,
    def: &'a VersionedEntityDef,
    scope: TenantTable,
}

impl<'a> VersionedEntityManager<'a> {
    pub fn new(db: &'a dyn Database, def: &'a VersionedEntityDef) -> Self {
        let scope = TenantTable {
            table: def.table.clone(),
            tenant_column: def.tenant_column.clone(),
            mode: TenantMode::Strict,
        };
        Self { db, def, scope }
    }

    fn table(&self) -> &TableName {
        &self.def.table
    }

    fn validate_columns(&self, values: &[(&str, &str)]) -> EngineResult<()> {
        for (col, _) in values {
            if !self.def.data_columns.iter().any(|c| c == col) {
                return Err(EngineError::InvalidEntityState {
                    message: format!(
                        "'{}' is not a declared data column of {}",
                        col,
                        self.table()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Create version 1 of a new chain (`root_id` = own id, status Draft).
    pub async fn create(
        &self,
        ctx: &TenantContext,
        values: &[(&str, &str)],
    ) -> EngineResult<VersionRow> {
        let tenant = ctx.tenant.ok_or_else(|| EngineError::InvalidEntityState {
            message: format!("a tenant context is required to create rows in {}", self.table()),
        })?;
        self.validate_columns(values)?;

        let id = Uuid::new_v4();
        let mut columns = vec![
            "id".to_string(),
            "root_id".to_string(),
            "version".to_string(),
            "status".to_string(),
            self.def.tenant_column.clone(),
        ];
        let mut rendered = vec![
            quote_literal(&id.to_string()),
            quote_literal(&id.to_string()),
            "1".to_string(),
            quote_literal(VersionStatus::Draft.as_str()),
            quote_literal(&tenant.to_string()),
        ];
        for (col, value) in values {
            columns.push((*col).to_string());
            rendered.push(quote_literal(value));
        }

        self.db
            .execute(&format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table(),
                column_list(&columns),
                rendered.join(", ")
            ))
            .await?;

        Ok(VersionRow {
            id,
            root_id: id,
            version: 1,
            status: VersionStatus::Draft,
        })
    }

    /// Fetch one version row visible to the caller.
    pub async fn fetch(&self, ctx: &TenantContext, id: Uuid) -> EngineResult<VersionRow> {
        let rows = self
            .db
            .query_rows(&format!(
                "SELECT CAST(id AS VARCHAR), CAST(root_id AS VARCHAR), \
                 CAST(version AS VARCHAR), status FROM {} WHERE id = {} AND {}",
                self.table(),
                quote_literal(&id.to_string()),
                ctx.scope_filter(&self.scope)
            ))
            .await?;
        let row = rows.into_iter().next().ok_or_else(|| EngineError::EntityNotFound {
            table: self.table().to_string(),
            id: id.to_string(),
        })?;
        parse_version_row(self.table(), &row)
    }

    /// Current head (highest version) of a chain.
    pub async fn head(&self, ctx: &TenantContext, root_id: Uuid) -> EngineResult<VersionRow> {
        let rows = self
            .db
            .query_rows(&format!(
                "SELECT CAST(id AS VARCHAR), CAST(root_id AS VARCHAR), \
                 CAST(version AS VARCHAR), status FROM {} \
                 WHERE root_id = {} AND {} ORDER BY version DESC LIMIT 1",
                self.table(),
                quote_literal(&root_id.to_string()),
                ctx.scope_filter(&self.scope)
            ))
            .await?;
        let row = rows.into_iter().next().ok_or_else(|| EngineError::EntityNotFound {
            table: self.table().to_string(),
            id: root_id.to_string(),
        })?;
        parse_version_row(self.table(), &row)
    }

    /// Update data columns of a Draft version in place.
    pub async fn update_draft(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        values: &[(&str, &str)],
    ) -> EngineResult<()> {
        self.validate_columns(values)?;
        let row = self.fetch(ctx, id).await?;
        if row.status == VersionStatus::Locked {
            return Err(EngineError::ImmutableVersion {
                id: id.to_string(),
                version: row.version,
            });
        }

        let assignments: Vec<String> = values
            .iter()
            .map(|(col, value)| format!("{} = {}", col, quote_literal(value)))
            .collect();
        self.db
            .execute(&format!(
                "UPDATE {} SET {} WHERE id = {} AND status = 'draft' AND {}",
                self.table(),
                assignments.join(", "),
                quote_literal(&id.to_string()),
                ctx.scope_filter(&self.scope)
            ))
            .await?;
        Ok(())
    }

    /// Lock a Draft version. Irreversible; locking an already-Locked row is
    /// a no-op.
    pub async fn lock(&self, ctx: &TenantContext, id: Uuid) -> EngineResult<()> {
        let row = self.fetch(ctx, id).await?;
        if row.status == VersionStatus::Locked {
            log::debug!("{} version {} already locked", self.table(), row.version);
            return Ok(());
        }
        self.db
            .execute(&format!(
                "UPDATE {} SET status = 'locked' WHERE id = {} AND status = 'draft' AND {}",
                self.table(),
                quote_literal(&id.to_string()),
                ctx.scope_filter(&self.scope)
            ))
            .await?;
        Ok(())
    }

    /// Fork: create the next Draft version from the Locked head of a chain.
    ///
    /// A single atomic operation: the new row is inserted, the old row is
    /// never mutated. If `head_id` is no longer the chain head the fork
    /// fails with `VersionConflict` and the caller retries against the
    /// refreshed head.
    pub async fn fork(&self, ctx: &TenantContext, head_id: Uuid) -> EngineResult<VersionRow> {
        self.db.begin().await?;
        let result = self.fork_in_txn(ctx, head_id).await;
        match &result {
            Ok(_) => self.db.commit().await?,
            Err(_) => {
                if let Err(e) = self.db.rollback().await {
                    log::warn!("rollback after failed fork on {}: {}", self.table(), e);
                }
            }
        }
        result
    }

    async fn fork_in_txn(&self, ctx: &TenantContext, head_id: Uuid) -> EngineResult<VersionRow> {
        let head = self.fetch(ctx, head_id).await?;
        if head.status == VersionStatus::Draft {
            return Err(EngineError::InvalidEntityState {
                message: format!(
                    "version {} of {} is still draft; edit it directly",
                    head.version,
                    self.table()
                ),
            });
        }

        let current_head = self.head(ctx, head.root_id).await?;
        if current_head.id != head.id {
            return Err(EngineError::VersionConflict {
                root: head.root_id.to_string(),
                version: head.version,
            });
        }

        let new_id = Uuid::new_v4();
        let data_cols = column_list(&self.def.data_columns);
        let insert = format!(
            "INSERT INTO {table} (id, root_id, version, status, {tenant}, {data}) \
             SELECT {new_id}, root_id, version + 1, 'draft', {tenant}, {data} \
             FROM {table} WHERE id = {head_id}",
            table = self.table(),
            tenant = self.def.tenant_column,
            data = data_cols,
            new_id = quote_literal(&new_id.to_string()),
            head_id = quote_literal(&head.id.to_string()),
        );

        match self.db.execute(&insert).await {
            Ok(_) => Ok(VersionRow {
                id: new_id,
                root_id: head.root_id,
                version: head.version + 1,
                status: VersionStatus::Draft,
            }),
            // Unique (root_id, version) collision: a concurrent fork won.
            Err(e) if e.is_constraint_violation() => Err(EngineError::VersionConflict {
                root: head.root_id.to_string(),
                version: head.version,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

fn parse_version_row(table: &TableName, row: &[Option<String>]) -> EngineResult<VersionRow> {
    let field = |i: usize| -> EngineResult<&str> {
        row.get(i).and_then(|v| v.as_deref()).ok_or_else(|| {
            EngineError::Db(strata_db::DbError::Internal(format!(
                "unexpected NULL in version row of {}",
                table
            )))
        })
    };
    let parse_uuid = |s: &str| {
        Uuid::parse_str(s).map_err(|e| {
            EngineError::Db(strata_db::DbError::Internal(format!(
                "invalid uuid '{}' in {}: {}",
                s, table, e
            )))
        })
    };

    let id = parse_uuid(field(0)?)?;
    let root_id = parse_uuid(field(1)?)?;
    let version: i64 = field(2)?.parse().map_err(|_| {
        EngineError::Db(strata_db::DbError::Internal(format!(
            "invalid version number in {}",
            table
        )))
    })?;
    let status_raw = field(3)?;
    let status = VersionStatus::parse(status_raw).ok_or_else(|| {
        EngineError::Db(strata_db::DbError::Internal(format!(
            "unknown status '{}' in {}",
            status_raw, table
        )))
    })?;

    Ok(VersionRow {
        id,
        root_id,
        version,
        status,
    })
}

#[cfg(test)]
#[path = "versioned_test.rs"]
mod tests;
