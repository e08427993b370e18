//! Core CLI commands
//!
//! The sync itself plus the read-only API commands used to check what the
//! backend serves before syncing.

pub mod fetch;
pub mod list;
pub mod sync;
