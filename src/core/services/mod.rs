//! External services integration
//!
//! This module contains integrations with external APIs:
//! - Songs API client with pagination
//! - `SongSource`, the seam the sync job pulls songs through

pub mod songs_api;

use async_trait::async_trait;

use crate::error::Result;

pub use songs_api::{ApiSong, SongsApiClient};

/// Anything that can hand over the complete remote song list
#[async_trait]
pub trait SongSource: Send + Sync {
    async fn fetch_all_songs(&self) -> Result<Vec<ApiSong>>;
}
