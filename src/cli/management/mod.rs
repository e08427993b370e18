//! Management commands
//!
//! Configuration handling and inspection of the local OpenLP database.

pub mod config;
pub mod detect;
pub mod status;
