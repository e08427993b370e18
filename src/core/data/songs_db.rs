//! Access to OpenLP's `songs` table
//!
//! The database file and its schema belong to OpenLP. This module only opens
//! an existing file, reads the backend-id markers and writes song rows; it
//! never creates or migrates tables.

use rusqlite::{params, Connection, OpenFlags, Transaction};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::data::sync_marker::SyncMarker;
use crate::error::{DatabaseError, Result};

const SONGS_TABLE: &str = "songs";

/// Column values written for one synced song
#[derive(Debug, Clone, PartialEq)]
pub struct SongRow {
    pub title: String,
    pub alternate_title: Option<String>,
    pub lyrics: String,
    pub copyright: Option<String>,
    pub comments: String,
    pub ccli_number: Option<String>,
    pub search_title: String,
    pub search_lyrics: String,
}

/// A local row that carries a sync marker
#[derive(Debug, Clone, Serialize)]
pub struct SyncedSong {
    pub id: i64,
    pub title: String,
    pub backend_id: String,
    pub last_synced: Option<String>,
}

pub struct SongsDatabase {
    conn: Connection,
    path: PathBuf,
}

impl SongsDatabase {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("Opening OpenLP database at: {}", db_path.display());

        if !db_path.exists() {
            return Err(DatabaseError::FileNotFound { path: db_path.to_path_buf() }.into());
        }

        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(DatabaseError::Connection)?;

        // OpenLP may hold the file open while we write
        conn.busy_timeout(Duration::from_secs(5))
            .map_err(DatabaseError::Connection)?;

        let has_songs: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            params![SONGS_TABLE],
            |row| row.get(0),
        )?;

        if !has_songs {
            return Err(DatabaseError::MissingTable {
                table: SONGS_TABLE.to_string(),
                path: db_path.to_path_buf(),
            }
            .into());
        }

        Ok(SongsDatabase { conn, path: db_path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn transaction(&mut self) -> Result<SongsTransaction<'_>> {
        let tx = self.conn.transaction().map_err(DatabaseError::Transaction)?;
        Ok(SongsTransaction { tx })
    }

    pub fn existing_backend_ids(&self) -> Result<HashMap<String, i64>> {
        read_backend_ids(&self.conn)
    }

    pub fn synced_songs(&self) -> Result<Vec<SyncedSong>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, comments FROM songs WHERE comments IS NOT NULL ORDER BY title, id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let songs = rows
            .into_iter()
            .filter_map(|(id, title, comments)| {
                let marker = SyncMarker::parse(comments.as_deref()?)?;
                Some(SyncedSong {
                    id,
                    title: title.unwrap_or_default(),
                    backend_id: marker.backend_id,
                    last_synced: marker.last_synced,
                })
            })
            .collect();

        Ok(songs)
    }

    pub fn count_songs(&self) -> Result<i64> {
        let count = self.conn.query_row("SELECT COUNT(*) FROM songs", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Write access to the songs table inside one transaction.
///
/// Dropping without `commit` rolls everything back.
pub struct SongsTransaction<'conn> {
    tx: Transaction<'conn>,
}

impl SongsTransaction<'_> {
    pub fn existing_backend_ids(&self) -> Result<HashMap<String, i64>> {
        read_backend_ids(&self.tx)
    }

    pub fn insert_song(&self, row: &SongRow) -> Result<i64> {
        self.tx.execute(
            r#"
            INSERT INTO songs (
                title, alternate_title, lyrics, copyright, comments,
                ccli_number, search_title, search_lyrics, last_modified
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))
            "#,
            params![
                row.title,
                row.alternate_title,
                row.lyrics,
                row.copyright,
                row.comments,
                row.ccli_number,
                row.search_title,
                row.search_lyrics,
            ],
        )?;

        let id = self.tx.last_insert_rowid();
        debug!("Inserted song '{}' as row {}", row.title, id);
        Ok(id)
    }

    pub fn update_song(&self, id: i64, row: &SongRow) -> Result<()> {
        self.tx.execute(
            r#"
            UPDATE songs
            SET title = ?1, alternate_title = ?2, lyrics = ?3, copyright = ?4,
                comments = ?5, ccli_number = ?6, search_title = ?7, search_lyrics = ?8,
                last_modified = datetime('now')
            WHERE id = ?9
            "#,
            params![
                row.title,
                row.alternate_title,
                row.lyrics,
                row.copyright,
                row.comments,
                row.ccli_number,
                row.search_title,
                row.search_lyrics,
                id,
            ],
        )?;

        debug!("Updated song '{}' at row {}", row.title, id);
        Ok(())
    }

    pub fn commit(self) -> Result<()> {
        self.tx.commit().map_err(DatabaseError::Transaction)?;
        Ok(())
    }

    pub fn rollback(self) -> Result<()> {
        self.tx.rollback().map_err(DatabaseError::Transaction)?;
        Ok(())
    }
}

/// Map backend id -> local row id; later rows win on duplicates
fn read_backend_ids(conn: &Connection) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT id, comments FROM songs WHERE comments IS NOT NULL ORDER BY id")?;

    let mut mapping = HashMap::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let id: i64 = row.get(0)?;
        // Comments are free text; a non-text value is simply not ours
        let comments: Option<String> = row.get(1).ok();
        if let Some(marker) = comments.as_deref().and_then(SyncMarker::parse) {
            mapping.insert(marker.backend_id, id);
        }
    }

    debug!("Found {} previously synced songs", mapping.len());
    Ok(mapping)
}

#[cfg(test)]
pub(crate) mod test_support {
    use rusqlite::Connection;
    use std::path::{Path, PathBuf};

    /// The OpenLP 2.x `songs` table, as the host creates it
    pub const OPENLP_SONGS_SCHEMA: &str = r#"
        CREATE TABLE songs (
            id INTEGER NOT NULL PRIMARY KEY,
            title VARCHAR(255) NOT NULL,
            alternate_title VARCHAR(255),
            lyrics TEXT NOT NULL,
            verse_order VARCHAR(128),
            copyright VARCHAR(255),
            comments TEXT,
            ccli_number VARCHAR(64),
            theme_name VARCHAR(128),
            search_title VARCHAR(255) NOT NULL,
            search_lyrics TEXT NOT NULL,
            create_date DATETIME,
            last_modified DATETIME,
            temporary BOOLEAN
        );
    "#;

    pub fn create_openlp_db(dir: &Path) -> PathBuf {
        let path = dir.join("songs.sqlite");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(OPENLP_SONGS_SCHEMA).unwrap();
        path
    }

    pub fn insert_raw(path: &Path, title: &str, comments: Option<&str>) -> i64 {
        let conn = Connection::open(path).unwrap();
        conn.execute(
            "INSERT INTO songs (title, lyrics, comments, search_title, search_lyrics) VALUES (?1, '', ?2, ?3, '')",
            rusqlite::params![title, comments, title.to_lowercase()],
        )
        .unwrap();
        conn.last_insert_rowid()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::error::SongSyncError;

    fn row(title: &str, backend_id: &str) -> SongRow {
        SongRow {
            title: title.to_string(),
            alternate_title: Some("12".to_string()),
            lyrics: r#"<verse label="v1">Hello</verse>"#.to_string(),
            copyright: None,
            comments: SyncMarker::now(backend_id).to_comment(),
            ccli_number: Some("12".to_string()),
            search_title: title.to_lowercase(),
            search_lyrics: r#"<verse label="v1">hello</verse>"#.to_string(),
        }
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = SongsDatabase::open(&dir.path().join("nope.sqlite")).err().unwrap();
        assert!(matches!(err, SongSyncError::Database(DatabaseError::FileNotFound { .. })));
        assert!(!dir.path().join("nope.sqlite").exists());
    }

    #[test]
    fn open_without_songs_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.sqlite");
        Connection::open(&path).unwrap().execute_batch("CREATE TABLE other (id INTEGER)").unwrap();

        let err = SongsDatabase::open(&path).err().unwrap();
        assert!(matches!(err, SongSyncError::Database(DatabaseError::MissingTable { .. })));
    }

    #[test]
    fn backend_ids_come_from_markers_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        let synced = insert_raw(&path, "Synced", Some(r#"{"backendId": "b-1", "lastSynced": "2024-01-01T00:00:00"}"#));
        insert_raw(&path, "Hand entered", Some("Key of G"));
        insert_raw(&path, "No comments", None);

        let db = SongsDatabase::open(&path).unwrap();
        let ids = db.existing_backend_ids().unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(ids.get("b-1"), Some(&synced));
    }

    #[test]
    fn duplicate_markers_resolve_to_latest_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        insert_raw(&path, "First", Some(r#"{"backendId": "dup"}"#));
        let second = insert_raw(&path, "Second", Some(r#"{"backendId": "dup"}"#));

        let db = SongsDatabase::open(&path).unwrap();
        assert_eq!(db.existing_backend_ids().unwrap().get("dup"), Some(&second));
    }

    #[test]
    fn insert_and_update_inside_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        let mut db = SongsDatabase::open(&path).unwrap();

        let tx = db.transaction().unwrap();
        let id = tx.insert_song(&row("Amazing Grace", "b-7")).unwrap();
        tx.update_song(id, &row("Amazing Grace (Chris Tomlin)", "b-7")).unwrap();
        tx.commit().unwrap();

        let synced = db.synced_songs().unwrap();
        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].id, id);
        assert_eq!(synced[0].title, "Amazing Grace (Chris Tomlin)");
        assert_eq!(synced[0].backend_id, "b-7");
        assert!(synced[0].last_synced.is_some());

        let conn = Connection::open(&path).unwrap();
        let (alternate, modified): (Option<String>, Option<String>) = conn
            .query_row("SELECT alternate_title, last_modified FROM songs WHERE id = ?1", [id], |r| {
                Ok((r.get(0)?, r.get(1)?))
            })
            .unwrap();
        assert_eq!(alternate.as_deref(), Some("12"));
        assert!(modified.is_some());
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_openlp_db(dir.path());
        let mut db = SongsDatabase::open(&path).unwrap();

        {
            let tx = db.transaction().unwrap();
            tx.insert_song(&row("Temporary", "b-9")).unwrap();
        }
        assert_eq!(db.count_songs().unwrap(), 0);

        let tx = db.transaction().unwrap();
        tx.insert_song(&row("Temporary", "b-9")).unwrap();
        tx.rollback().unwrap();
        assert_eq!(db.count_songs().unwrap(), 0);
    }
}
