//! Command Line Interface module
//!
//! This module contains all CLI commands organized into logical submodules:
//! - `core`: Talking to the songs API (sync, fetch, list)
//! - `management`: Configuration and local inspection (config, status, detect-db)

pub mod core;
pub mod management;

pub use self::core::*;
pub use management::*;
