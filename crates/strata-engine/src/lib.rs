//! Migration application engine: applied-set tracking, idempotent
//! execution, tenant isolation verification, and versioned entities.

pub mod error;
pub mod executor;
pub mod lock;
pub mod meta;
pub mod runner;
pub mod tracker;
pub mod verifier;
pub mod versioned;

pub mod testing;

pub use error::{EngineError, EngineResult};
pub use executor::Executor;
pub use lock::RunLock;
pub use runner::{Runner, StatusReport, UpOutcome};
pub use tracker::{AppliedRecord, AppliedSet, Outcome};
pub use verifier::{IsolationFinding, IsolationVerifier};
pub use versioned::{VersionRow, VersionStatus, VersionedEntityManager};
