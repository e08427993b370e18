//! Reconciliation of API songs against the OpenLP songs table
//!
//! Songs are matched by the backend id stashed in `comments`. Known ids are
//! updated in place, unknown ids are inserted. Everything happens in a single
//! transaction; one bad record is counted and skipped, never fatal.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::core::data::songs_db::{SongRow, SongsDatabase};
use crate::core::data::sync_marker::SyncMarker;
use crate::core::lyrics::LyricsFormatter;
use crate::core::services::songs_api::{ApiSong, Verses};
use crate::error::{Result, SongSyncError, SyncError};
use crate::signal_handler::CancelToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
}

impl SyncReport {
    pub fn processed(&self) -> usize {
        self.created + self.updated + self.errors
    }

    pub fn summary(&self) -> String {
        format!(
            "Sync complete!\n\nCreated: {}\nUpdated: {}\nErrors: {}",
            self.created, self.updated, self.errors
        )
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "created={} updated={} errors={}", self.created, self.updated, self.errors)
    }
}

/// What a sync would do, computed without writing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncPlan {
    pub to_create: usize,
    pub to_update: usize,
    pub missing_id: usize,
    pub unreadable_verses: usize,
}

pub struct SyncService {
    db_path: PathBuf,
    formatter: LyricsFormatter,
}

impl SyncService {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
            formatter: LyricsFormatter::new(),
        }
    }

    pub fn with_formatter(mut self, formatter: LyricsFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Column values for a song, marked with its backend id
    pub fn song_row(&self, song: &ApiSong, backend_id: &str) -> SongRow {
        let title = song.title.clone().unwrap_or_default();
        let lyrics = self.formatter.format(song);
        let ccli_number = song.ccli_number
            .clone()
            .filter(|ccli| !ccli.is_empty())
            .or_else(|| song.number.clone());

        SongRow {
            search_title: title.trim().to_lowercase(),
            search_lyrics: lyrics.to_lowercase(),
            title,
            alternate_title: song.number.clone(),
            lyrics,
            copyright: song.copyright.clone(),
            comments: SyncMarker::now(backend_id).to_comment(),
            ccli_number,
        }
    }

    /// Upsert every song inside one transaction.
    ///
    /// `progress` receives one message per record. Cancellation is checked
    /// once, after the loop: a cancelled run is rolled back in full.
    pub fn sync_songs<F>(&self, songs: &[ApiSong], mut progress: F, cancel: &CancelToken) -> Result<SyncReport>
    where
        F: FnMut(&str),
    {
        let mut db = SongsDatabase::open(&self.db_path).map_err(sync_failed)?;
        let tx = db.transaction().map_err(sync_failed)?;

        let mut existing = tx.existing_backend_ids().unwrap_or_else(|e| {
            warn!("Error reading existing songs: {}", e);
            HashMap::new()
        });

        let total = songs.len();
        let mut report = SyncReport::default();

        for (idx, song) in songs.iter().enumerate() {
            progress(&format!("Processing song {}/{}: {}", idx + 1, total, song.display_title()));

            let Some(backend_id) = song.backend_id() else {
                warn!("Song missing ID: {}", song.display_title());
                report.errors += 1;
                continue;
            };

            if has_unreadable_verses(song) {
                // Writing would replace the local lyrics with nothing
                warn!("Unreadable verses for song {}; leaving it untouched", song.display_title());
                report.errors += 1;
                continue;
            }

            let row = self.song_row(song, backend_id);

            match existing.get(backend_id).copied() {
                Some(local_id) => match tx.update_song(local_id, &row) {
                    Ok(()) => report.updated += 1,
                    Err(e) => {
                        error!("Error syncing song {}: {}", song.display_title(), e);
                        report.errors += 1;
                    }
                },
                None => match tx.insert_song(&row) {
                    Ok(local_id) => {
                        // A repeated id later in the batch must update this row
                        existing.insert(backend_id.to_string(), local_id);
                        report.created += 1;
                    }
                    Err(e) => {
                        error!("Error syncing song {}: {}", song.display_title(), e);
                        report.errors += 1;
                    }
                },
            }
        }

        if cancel.is_cancelled() {
            warn!("Sync cancelled; rolling back {} changes", report.created + report.updated);
            tx.rollback().map_err(sync_failed)?;
            return Err(SyncError::Cancelled.into());
        }

        tx.commit().map_err(sync_failed)?;

        info!("Sync finished: {}", report);
        Ok(report)
    }

    /// Count what `sync_songs` would create and update
    pub fn plan(&self, songs: &[ApiSong]) -> Result<SyncPlan> {
        let db = SongsDatabase::open(&self.db_path)?;
        let mut known: HashMap<String, i64> = db.existing_backend_ids().unwrap_or_else(|e| {
            warn!("Error reading existing songs: {}", e);
            HashMap::new()
        });

        let mut plan = SyncPlan::default();
        for song in songs {
            match song.backend_id() {
                None => plan.missing_id += 1,
                Some(_) if has_unreadable_verses(song) => plan.unreadable_verses += 1,
                Some(id) if known.contains_key(id) => plan.to_update += 1,
                Some(id) => {
                    known.insert(id.to_string(), 0);
                    plan.to_create += 1;
                }
            }
        }

        Ok(plan)
    }
}

fn has_unreadable_verses(song: &ApiSong) -> bool {
    matches!(song.verses, Some(Verses::Other(_)))
}

fn sync_failed(err: SongSyncError) -> SongSyncError {
    error!("Error during sync: {}", err);
    SyncError::Failed(err.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data::songs_db::test_support::{create_openlp_db, insert_raw};
    use crate::core::services::songs_api::Verse;
    use rusqlite::Connection;

    fn api_song(id: Option<&str>, title: &str) -> ApiSong {
        ApiSong {
            id: id.map(str::to_string),
            title: Some(title.to_string()),
            number: Some("101".to_string()),
            copyright: Some("Public Domain".to_string()),
            verses: Some(Verses::List(vec![Verse {
                label: Some("v1".to_string()),
                order: Some(1),
                content: Some(format!("{} Lyrics", title)),
            }])),
            ..Default::default()
        }
    }

    fn fetch_row(path: &Path, id: i64) -> (String, Option<String>, String, Option<String>, String, String) {
        let conn = Connection::open(path).unwrap();
        conn.query_row(
            "SELECT title, alternate_title, lyrics, ccli_number, search_title, search_lyrics FROM songs WHERE id = ?1",
            [id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?)),
        )
        .unwrap()
    }

    #[test]
    fn inserts_new_songs_with_marker_and_search_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        let service = SyncService::new(&path);

        let report = service
            .sync_songs(&[api_song(Some("b-1"), "  Amazing Grace ")], |_| {}, &CancelToken::new())
            .unwrap();
        assert_eq!(report, SyncReport { created: 1, updated: 0, errors: 0 });

        let db = SongsDatabase::open(&path).unwrap();
        let ids = db.existing_backend_ids().unwrap();
        let local_id = ids["b-1"];

        let (title, alternate, lyrics, ccli, search_title, search_lyrics) = fetch_row(&path, local_id);
        assert_eq!(title, "  Amazing Grace ");
        assert_eq!(alternate.as_deref(), Some("101"));
        assert_eq!(lyrics, r#"<verse label="v1">  Amazing Grace  Lyrics</verse>"#);
        assert_eq!(ccli.as_deref(), Some("101"));
        assert_eq!(search_title, "amazing grace");
        assert_eq!(search_lyrics, lyrics.to_lowercase());
    }

    #[test]
    fn updates_rows_found_by_backend_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        let existing = insert_raw(&path, "Old title", Some(r#"{"backendId": "b-1", "lastSynced": "2020-01-01T00:00:00"}"#));
        let untouched = insert_raw(&path, "Local only", Some("Capo 2"));

        let mut song = api_song(Some("b-1"), "New title");
        song.ccli_number = Some("7654321".to_string());

        let report = SyncService::new(&path)
            .sync_songs(&[song, api_song(Some("b-2"), "Brand new")], |_| {}, &CancelToken::new())
            .unwrap();
        assert_eq!(report, SyncReport { created: 1, updated: 1, errors: 0 });

        let (title, _, _, ccli, _, _) = fetch_row(&path, existing);
        assert_eq!(title, "New title");
        assert_eq!(ccli.as_deref(), Some("7654321"));

        let (title, ..) = fetch_row(&path, untouched);
        assert_eq!(title, "Local only");

        let db = SongsDatabase::open(&path).unwrap();
        assert_eq!(db.count_songs().unwrap(), 3);
        let marker = db.synced_songs().unwrap().into_iter().find(|s| s.id == existing).unwrap();
        assert_ne!(marker.last_synced.as_deref(), Some("2020-01-01T00:00:00"));
    }

    #[test]
    fn second_run_updates_instead_of_duplicating() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        let service = SyncService::new(&path);
        let songs = vec![api_song(Some("a"), "A"), api_song(Some("b"), "B")];

        let first = service.sync_songs(&songs, |_| {}, &CancelToken::new()).unwrap();
        let second = service.sync_songs(&songs, |_| {}, &CancelToken::new()).unwrap();

        assert_eq!(first, SyncReport { created: 2, updated: 0, errors: 0 });
        assert_eq!(second, SyncReport { created: 0, updated: 2, errors: 0 });
        assert_eq!(SongsDatabase::open(&path).unwrap().count_songs().unwrap(), 2);
    }

    #[test]
    fn repeated_id_in_one_batch_updates_the_new_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());

        let songs = vec![api_song(Some("same"), "First"), api_song(Some("same"), "Second")];
        let report = SyncService::new(&path).sync_songs(&songs, |_| {}, &CancelToken::new()).unwrap();

        assert_eq!(report, SyncReport { created: 1, updated: 1, errors: 0 });
        let synced = SongsDatabase::open(&path).unwrap().synced_songs().unwrap();
        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].title, "Second");
    }

    #[test]
    fn missing_ids_and_failed_writes_are_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        // Reject one specific title to force a per-record failure
        Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_bad BEFORE INSERT ON songs WHEN NEW.title = 'Bad'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let songs = vec![
            api_song(None, "No id"),
            api_song(Some("   "), "Blank id"),
            api_song(Some("bad"), "Bad"),
            api_song(Some("good"), "Good"),
        ];
        let report = SyncService::new(&path).sync_songs(&songs, |_| {}, &CancelToken::new()).unwrap();

        assert_eq!(report, SyncReport { created: 1, updated: 0, errors: 3 });
        assert_eq!(report.processed(), 4);
        assert_eq!(SongsDatabase::open(&path).unwrap().count_songs().unwrap(), 1);
    }

    #[test]
    fn reports_progress_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        let mut messages = Vec::new();

        let mut untitled = api_song(Some("u"), "");
        untitled.title = None;
        SyncService::new(&path)
            .sync_songs(&[api_song(Some("a"), "Abide"), untitled], |m| messages.push(m.to_string()), &CancelToken::new())
            .unwrap();

        assert_eq!(messages, vec!["Processing song 1/2: Abide", "Processing song 2/2: Untitled"]);
    }

    #[test]
    fn cancellation_rolls_back_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        let cancel = CancelToken::new();

        let result = SyncService::new(&path).sync_songs(
            &[api_song(Some("a"), "A"), api_song(Some("b"), "B")],
            |_| cancel.cancel(),
            &cancel,
        );

        assert!(matches!(result, Err(SongSyncError::Sync(SyncError::Cancelled))));
        assert_eq!(SongsDatabase::open(&path).unwrap().count_songs().unwrap(), 0);
    }

    #[test]
    fn missing_database_is_a_sync_failure() {
        let dir = tempfile::tempdir().unwrap();
        let result = SyncService::new(dir.path().join("missing.sqlite"))
            .sync_songs(&[api_song(Some("a"), "A")], |_| {}, &CancelToken::new());

        match result {
            Err(SongSyncError::Sync(SyncError::Failed(message))) => {
                assert!(message.contains("Database file not found"));
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.to_string())),
        }
    }

    #[test]
    fn plan_counts_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        insert_raw(&path, "Known", Some(r#"{"backendId": "known"}"#));

        let songs = vec![
            api_song(Some("known"), "Known"),
            api_song(Some("new"), "New"),
            api_song(Some("new"), "New again"),
            api_song(None, "Broken"),
            ApiSong {
                verses: Some(Verses::Other(serde_json::json!({ "v1": "odd" }))),
                ..api_song(Some("odd"), "Odd")
            },
        ];
        let plan = SyncService::new(&path).plan(&songs).unwrap();

        assert_eq!(plan, SyncPlan { to_create: 1, to_update: 2, missing_id: 1, unreadable_verses: 1 });
        assert_eq!(SongsDatabase::open(&path).unwrap().count_songs().unwrap(), 1);
    }

    #[test]
    fn padded_backend_ids_match_existing_markers() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        let existing = insert_raw(&path, "Old", Some(r#"{"backendId": " 42 "}"#));

        let report = SyncService::new(&path)
            .sync_songs(&[api_song(Some(" 42 "), "Renamed")], |_| {}, &CancelToken::new())
            .unwrap();

        assert_eq!(report, SyncReport { created: 0, updated: 1, errors: 0 });
        let db = SongsDatabase::open(&path).unwrap();
        assert_eq!(db.count_songs().unwrap(), 1);
        assert_eq!(db.existing_backend_ids().unwrap()[" 42 "], existing);
    }

    #[test]
    fn unreadable_verses_leave_local_lyrics_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        let existing = insert_raw(&path, "Keep me", Some(r#"{"backendId": "b-1"}"#));
        Connection::open(&path)
            .unwrap()
            .execute("UPDATE songs SET lyrics = 'local lyrics' WHERE id = ?1", [existing])
            .unwrap();

        let song = ApiSong {
            verses: Some(Verses::Other(serde_json::json!(17))),
            ..api_song(Some("b-1"), "Keep me")
        };
        let report = SyncService::new(&path)
            .sync_songs(&[song], |_| {}, &CancelToken::new())
            .unwrap();

        assert_eq!(report, SyncReport { created: 0, updated: 0, errors: 1 });
        let (_, _, lyrics, _, _, _) = fetch_row(&path, existing);
        assert_eq!(lyrics, "local lyrics");
    }

    #[test]
    fn summary_lists_counts() {
        let report = SyncReport { created: 3, updated: 2, errors: 1 };
        assert_eq!(report.summary(), "Sync complete!\n\nCreated: 3\nUpdated: 2\nErrors: 1");
    }
}
