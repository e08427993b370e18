//! Core functionality modules
//!
//! This module contains all core business logic organized into logical layers:
//! - `data`: access to the OpenLP songs database and the sync marker format
//! - `services`: the songs API client
//! - `lyrics`: conversion of API verses into OpenLP verse markup
//! - `sync`: reconciliation of API songs against local rows
//! - `job`: the background fetch-then-sync worker

pub mod data;
pub mod job;
pub mod lyrics;
pub mod services;
pub mod sync;

// Re-export commonly used types for convenience
pub use data::SongsDatabase;
pub use job::{SyncJob, SyncOutcome};
