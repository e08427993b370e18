//! Service wiring shared by the CLI commands
//!
//! - `SimpleServices`: holds the resolved configuration and builds the API
//!   client and sync service from it

pub mod simple_container;

pub use simple_container::SimpleServices;
