use clap::Args;

use crate::core::services::ApiSong;
use crate::error::Result;
use crate::services::SimpleServices;

#[derive(Args)]
pub struct ListArgs {
    /// Show at most this many songs
    #[arg(short, long)]
    limit: Option<usize>,
}

pub async fn execute(args: ListArgs, services: &SimpleServices) -> Result<()> {
    let client = services.create_api_client()?;
    let songs = client.fetch_all_songs().await?;

    for line in listing(&songs, args.limit) {
        println!("{}", line);
    }

    let shown = args.limit.map_or(songs.len(), |limit| limit.min(songs.len()));
    println!();
    println!("📋 {} of {} songs", shown, songs.len());

    Ok(())
}

fn listing(songs: &[ApiSong], limit: Option<usize>) -> Vec<String> {
    songs
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .map(|song| {
            format!(
                "{}\t{}\t{}",
                song.backend_id().unwrap_or("-"),
                song.number.as_deref().unwrap_or("-"),
                song.display_title()
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_is_tab_separated_and_limited() {
        let songs = vec![
            ApiSong {
                id: Some("a1".into()),
                number: Some("12".into()),
                title: Some("Amazing Grace".into()),
                ..Default::default()
            },
            ApiSong { id: None, title: Some("  ".into()), ..Default::default() },
        ];

        assert_eq!(listing(&songs, None), vec!["a1\t12\tAmazing Grace", "-\t-\tUntitled"]);
        assert_eq!(listing(&songs, Some(1)).len(), 1);
        assert!(listing(&songs, Some(0)).is_empty());
    }
}
