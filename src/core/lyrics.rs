//! Conversion of API songs into OpenLP's verse markup
//!
//! OpenLP stores lyrics as a sequence of `<verse label="..">text</verse>`
//! elements. Chorus goes first with label `c`, verses follow in order.

use tracing::debug;

use crate::core::services::songs_api::{ApiSong, Verses};

pub struct LyricsFormatter {
    prefer_lyrics_xml: bool,
}

impl Default for LyricsFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl LyricsFormatter {
    pub fn new() -> Self {
        LyricsFormatter { prefer_lyrics_xml: false }
    }

    /// Use the backend's stored `lyricsXml` verbatim when it is present
    pub fn with_lyrics_xml(prefer_lyrics_xml: bool) -> Self {
        LyricsFormatter { prefer_lyrics_xml }
    }

    pub fn format(&self, song: &ApiSong) -> String {
        if self.prefer_lyrics_xml {
            if let Some(xml) = song.lyrics_xml.as_deref().filter(|xml| !xml.trim().is_empty()) {
                return xml.to_string();
            }
        }

        format_lyrics(song)
    }
}

pub fn format_lyrics(song: &ApiSong) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(chorus) = song.chorus.as_deref().filter(|c| !c.is_empty()) {
        parts.push(verse_tag("c", chorus));
    }

    match song.verses {
        Some(Verses::Text(ref text)) if !text.is_empty() => {
            if text.trim_start().starts_with("<verse") {
                // Already in OpenLP markup
                parts.push(text.clone());
            } else {
                for (idx, block) in text.split("\n\n").enumerate() {
                    let block = block.trim();
                    if !block.is_empty() {
                        parts.push(verse_tag(&format!("v{}", idx + 1), block));
                    }
                }
            }
        }
        Some(Verses::List(ref verses)) => {
            for verse in verses {
                let content = match verse.content.as_deref() {
                    Some(content) if !content.is_empty() => content,
                    _ => continue,
                };
                let label = match verse.label.as_deref() {
                    Some(label) if !label.is_empty() => label.to_string(),
                    _ => format!("v{}", verse.order.unwrap_or(1)),
                };
                parts.push(verse_tag(&label, content));
            }
        }
        Some(Verses::Other(ref value)) => {
            debug!("Ignoring verses of unexpected shape for {:?}: {}", song.id, value);
        }
        _ => {}
    }

    parts.concat()
}

fn verse_tag(label: &str, content: &str) -> String {
    format!(r#"<verse label="{}">{}</verse>"#, escape_xml(label), escape_xml(content))
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::services::songs_api::Verse;

    fn song_with(verses: Option<Verses>, chorus: Option<&str>) -> ApiSong {
        ApiSong {
            id: Some("s1".into()),
            title: Some("Test".into()),
            chorus: chorus.map(str::to_string),
            verses,
            ..Default::default()
        }
    }

    fn verse(label: Option<&str>, order: Option<i64>, content: &str) -> Verse {
        Verse {
            label: label.map(str::to_string),
            order,
            content: Some(content.to_string()),
        }
    }

    #[test]
    fn escapes_all_special_characters() {
        assert_eq!(escape_xml(r#"a & b < c > d " e ' f"#), "a &amp; b &lt; c &gt; d &quot; e &apos; f");
        assert_eq!(escape_xml("&lt;"), "&amp;lt;");
        assert_eq!(escape_xml(""), "");
    }

    #[test]
    fn chorus_comes_first() {
        let song = song_with(Some(Verses::Text("one".into())), Some("Sing"));
        assert_eq!(
            format_lyrics(&song),
            r#"<verse label="c">Sing</verse><verse label="v1">one</verse>"#
        );
    }

    #[test]
    fn plain_text_splits_on_blank_lines() {
        let song = song_with(Some(Verses::Text("first line\nsecond line\n\n  second verse  ".into())), None);
        assert_eq!(
            format_lyrics(&song),
            "<verse label=\"v1\">first line\nsecond line</verse><verse label=\"v2\">second verse</verse>"
        );
    }

    #[test]
    fn empty_blocks_still_advance_numbering() {
        let song = song_with(Some(Verses::Text("a\n\n   \n\nc".into())), None);
        assert_eq!(
            format_lyrics(&song),
            r#"<verse label="v1">a</verse><verse label="v3">c</verse>"#
        );
    }

    #[test]
    fn existing_markup_passes_through() {
        let markup = r#"<verse label="v1">Already &amp; done</verse>"#;
        let song = song_with(Some(Verses::Text(format!("  {}", markup))), Some("C"));
        assert_eq!(format_lyrics(&song), format!(r#"<verse label="c">C</verse>  {}"#, markup));
    }

    #[test]
    fn one_tag_per_verse_in_list() {
        let verses = vec![
            verse(Some("v1"), Some(1), "one"),
            verse(None, Some(2), "two"),
            verse(Some("b1"), Some(3), "bridge"),
            verse(None, None, "no order"),
        ];
        let lyrics = format_lyrics(&song_with(Some(Verses::List(verses)), None));

        assert_eq!(lyrics.matches("<verse ").count(), 4);
        assert_eq!(
            lyrics,
            concat!(
                r#"<verse label="v1">one</verse>"#,
                r#"<verse label="v2">two</verse>"#,
                r#"<verse label="b1">bridge</verse>"#,
                r#"<verse label="v1">no order</verse>"#,
            )
        );
    }

    #[test]
    fn list_entries_without_content_are_skipped() {
        let verses = vec![
            verse(Some("v1"), Some(1), ""),
            Verse { label: Some("v2".into()), order: Some(2), content: None },
            verse(Some("v3"), Some(3), "kept"),
        ];
        let lyrics = format_lyrics(&song_with(Some(Verses::List(verses)), None));
        assert_eq!(lyrics, r#"<verse label="v3">kept</verse>"#);
    }

    #[test]
    fn verse_content_and_labels_are_escaped() {
        let verses = vec![verse(Some(r#"v"1"#), Some(1), "Rock & <roll>")];
        let lyrics = format_lyrics(&song_with(Some(Verses::List(verses)), None));
        assert_eq!(lyrics, r#"<verse label="v&quot;1">Rock &amp; &lt;roll&gt;</verse>"#);
    }

    #[test]
    fn no_lyrics_yields_empty_string() {
        assert_eq!(format_lyrics(&song_with(None, None)), "");
        assert_eq!(format_lyrics(&song_with(Some(Verses::Text(String::new())), Some(""))), "");
    }

    #[test]
    fn formatter_prefers_stored_xml_only_when_enabled() {
        let mut song = song_with(Some(Verses::Text("plain".into())), None);
        song.lyrics_xml = Some(r#"<song><lyrics><verse name="v1"/></lyrics></song>"#.into());

        assert_eq!(LyricsFormatter::new().format(&song), r#"<verse label="v1">plain</verse>"#);
        assert_eq!(
            LyricsFormatter::with_lyrics_xml(true).format(&song),
            r#"<song><lyrics><verse name="v1"/></lyrics></song>"#
        );

        song.lyrics_xml = Some("   ".into());
        assert_eq!(
            LyricsFormatter::with_lyrics_xml(true).format(&song),
            r#"<verse label="v1">plain</verse>"#
        );
    }
}
