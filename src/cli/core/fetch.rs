use clap::Args;
use tracing::info;

use crate::core::services::ApiSong;
use crate::error::{Result, SongSyncError};
use crate::services::SimpleServices;

#[derive(Args)]
pub struct FetchArgs {
    /// Backend id of the song
    #[arg(value_name = "ID")]
    id: String,

    /// Also print the OpenLP lyrics markup the sync would write
    #[arg(long)]
    lyrics: bool,
}

pub async fn execute(args: FetchArgs, services: &SimpleServices) -> Result<()> {
    let id = args.id.trim();
    if id.is_empty() {
        return Err(SongSyncError::Validation("Song id must not be empty".to_string()));
    }

    let client = services.create_api_client()?;
    info!("Fetching song {} from {}", id, client.base_url());

    let song = client.get_song_by_id(id).await?;
    print_song(&song);

    if args.lyrics {
        println!();
        println!("{}", services.lyrics_formatter().format(&song));
    }

    Ok(())
}

fn print_song(song: &ApiSong) {
    println!("🎵 {}", song.display_title());
    println!("  🆔 id: {}", song.backend_id().unwrap_or("none"));
    println!("  🔢 number: {}", song.number.as_deref().unwrap_or("none"));
    println!("  ©️  copyright: {}", song.copyright.as_deref().unwrap_or("none"));
    println!("  📄 ccli_number: {}", song.ccli_number.as_deref().unwrap_or("none"));
}
