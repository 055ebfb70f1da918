//! strata-core - Core library for strata
//!
//! This crate provides the migration unit model, catalog discovery, the
//! dependency DAG, checksums, project configuration, and the tenant-scoping
//! model shared across all strata components.

pub mod catalog;
pub mod checksum;
pub mod config;
pub mod dag;
pub mod error;
pub mod operation;
pub mod sql_utils;
pub mod table_name;
pub mod tenant;
pub mod unit;
pub mod unit_name;

pub use catalog::Catalog;
pub use checksum::compute_checksum;
pub use config::{Config, DatabaseConfig, VersionedEntityDef, CONFIG_FILE};
pub use dag::UnitDag;
pub use error::{CoreError, CoreResult};
pub use operation::{
    render_policy_predicate, ColumnDef, ForeignKey, ObjectKind, OnDeleteAction, Operation,
    Precondition, RawGuard, META_SCHEMA,
};
pub use table_name::TableName;
pub use tenant::{normalize_predicate, predicates_equivalent, TenantContext, TenantMode, TenantTable};
pub use unit::MigrationUnit;
pub use unit_name::UnitName;
