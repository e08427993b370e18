//! Utility modules for common functionality
//!
//! - `logging`: Logging configuration and setup
//! - `progress`: UI mode detection and progress reporting

pub mod logging;
pub mod progress;
