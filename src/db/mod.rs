use crate::errors::{AppError, AppResult};
use crate::live::{LivePublisher, LiveStream};
use crate::models::{Note, NoteSnapshot};
use crate::repository::NoteStore;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const SCHEMA_SQL: &str = include_str!("schema.sql");

const SELECT_NOTES: &str = "SELECT id, title, content, timestamp, image_path FROM notes";

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    notes: LivePublisher<NoteSnapshot>,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| AppError::Io(err.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        Self::with_connection(conn, Some(path.to_path_buf()))
    }

    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(AppError::from)?;
        Self::with_connection(conn, None)
    }

    fn with_connection(conn: Connection, db_path: Option<PathBuf>) -> AppResult<Self> {
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;
        let initial = select_all(&conn)?;
        tracing::debug!(path = ?db_path, notes = initial.len(), "opened note database");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            notes: LivePublisher::new(Arc::new(initial)),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    pub fn schema_version(&self) -> AppResult<i64> {
        let conn = self.lock()?;
        conn.query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(AppError::from)
    }

    pub fn list_notes(&self) -> AppResult<Vec<Note>> {
        let conn = self.lock()?;
        select_all(&conn)
    }

    pub fn get_note(&self, id: i64) -> AppResult<Option<Note>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{SELECT_NOTES} WHERE id = ?1"),
            [id],
            parse_note_row,
        )
        .optional()
        .map_err(AppError::from)
    }

    /// Inserts an unsaved note or fully replaces the stored record with the same id.
    pub fn upsert_note(&self, note: &Note) -> AppResult<i64> {
        let conn = self.lock()?;
        let id = if note.is_persisted() {
            conn.execute(
                "INSERT OR REPLACE INTO notes (id, title, content, timestamp, image_path)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![note.id, note.title, note.content, note.timestamp, note.image_path],
            )?;
            note.id
        } else {
            conn.execute(
                "INSERT INTO notes (title, content, timestamp, image_path) VALUES (?1, ?2, ?3, ?4)",
                params![note.title, note.content, note.timestamp, note.image_path],
            )?;
            conn.last_insert_rowid()
        };
        self.publish_locked(&conn)?;
        Ok(id)
    }

    pub fn delete_note(&self, id: i64) -> AppResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM notes WHERE id = ?1", [id])?;
        if changed > 0 {
            self.publish_locked(&conn)?;
        }
        Ok(changed > 0)
    }

    pub fn notes(&self) -> LiveStream<NoteSnapshot> {
        self.notes.stream()
    }

    // Publishing under the connection lock keeps snapshots in write order.
    fn publish_locked(&self, conn: &Connection) -> AppResult<()> {
        let snapshot = select_all(conn)?;
        self.notes.publish(Arc::new(snapshot));
        Ok(())
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Internal("database mutex poisoned".to_string()))
    }
}

impl NoteStore for Database {
    fn stream_all(&self) -> LiveStream<NoteSnapshot> {
        self.notes()
    }

    fn get_by_id(&self, id: i64) -> AppResult<Option<Note>> {
        self.get_note(id)
    }

    fn upsert(&self, note: &Note) -> AppResult<i64> {
        self.upsert_note(note)
    }

    fn delete_by_id(&self, id: i64) -> AppResult<()> {
        self.delete_note(id).map(|_| ())
    }
}

fn select_all(conn: &Connection) -> AppResult<Vec<Note>> {
    let mut statement = conn.prepare(&format!("{SELECT_NOTES} ORDER BY id ASC"))?;
    let rows = statement.query_map([], parse_note_row)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

fn parse_note_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        timestamp: row.get(3)?,
        image_path: row.get(4)?,
    })
}
