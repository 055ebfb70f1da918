//! CLI command implementations

pub(crate) mod common;
pub(crate) mod init;
pub(crate) mod status;
pub(crate) mod up;
pub(crate) mod verify;
