use crate::errors::AppResult;
use crate::live::LiveStream;
use crate::models::{Note, NoteSnapshot};
use std::sync::Arc;

/// Persistence backend for notes. Implemented by [`crate::db::Database`]; tests swap in fakes.
pub trait NoteStore: Send + Sync {
    fn stream_all(&self) -> LiveStream<NoteSnapshot>;
    fn get_by_id(&self, id: i64) -> AppResult<Option<Note>>;
    fn upsert(&self, note: &Note) -> AppResult<i64>;
    fn delete_by_id(&self, id: i64) -> AppResult<()>;
    fn delete(&self, note: &Note) -> AppResult<()> {
        self.delete_by_id(note.id)
    }
}

#[derive(Clone)]
pub struct NoteRepository {
    store: Arc<dyn NoteStore>,
}

impl NoteRepository {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self { store }
    }

    pub fn all_notes(&self) -> LiveStream<NoteSnapshot> {
        self.store.stream_all()
    }

    pub fn get_note_by_id(&self, id: i64) -> AppResult<Option<Note>> {
        self.store.get_by_id(id)
    }

    pub fn insert_note(&self, note: &Note) -> AppResult<i64> {
        self.store.upsert(note)
    }

    pub fn update_note(&self, note: &Note) -> AppResult<i64> {
        self.store.upsert(note)
    }

    pub fn delete_note(&self, note: &Note) -> AppResult<()> {
        self.store.delete(note)
    }

    pub fn delete_note_by_id(&self, id: i64) -> AppResult<()> {
        self.store.delete_by_id(id)
    }
}
