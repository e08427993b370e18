//! Data layer modules
//!
//! This module contains all database-related functionality:
//! - SQLite access to the host-owned `songs` table
//! - The JSON sync marker stashed in `songs.comments`

pub mod songs_db;
pub mod sync_marker;

pub use songs_db::SongsDatabase;
