use crate::errors::{AppError, AppResult};
use crate::live::{LivePublisher, LiveStream};
use crate::models::{Note, NoteSnapshot};
use crate::repository::NoteRepository;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Completion handle for a store operation launched by [`NoteViewModel`].
///
/// Dropping it leaves the operation running. Awaiting [`PendingWrite::wait`] yields the
/// operation's result, or `None` when the store failed (the failure is logged).
#[derive(Debug)]
#[must_use = "drop the handle explicitly to fire and forget"]
pub struct PendingWrite<T> {
    handle: JoinHandle<Option<T>>,
}

impl<T> PendingWrite<T> {
    pub async fn wait(self) -> Option<T> {
        match self.handle.await {
            Ok(result) => result,
            Err(error) => {
                tracing::error!(error = %error, "note store task did not complete");
                None
            }
        }
    }
}

/// Transient UI state shared by the list and edit screens: the live list of notes and a
/// single selected-note slot.
pub struct NoteViewModel {
    repository: NoteRepository,
    all_notes: LiveStream<NoteSnapshot>,
    selected: Arc<LivePublisher<Option<Note>>>,
}

impl NoteViewModel {
    pub fn new(repository: NoteRepository) -> Self {
        let all_notes = repository.all_notes();
        Self {
            repository,
            all_notes,
            selected: Arc::new(LivePublisher::new(None)),
        }
    }

    pub fn all_notes(&self) -> LiveStream<NoteSnapshot> {
        self.all_notes.clone()
    }

    pub fn selected_note(&self) -> LiveStream<Option<Note>> {
        self.selected.stream()
    }

    /// Loads the note in the background and publishes it, or `None` when the id is unknown.
    pub fn select_by_id(&self, id: i64) -> PendingWrite<Option<Note>> {
        let selected = self.selected.clone();
        self.launch("select", move |repository| {
            let note = repository.get_note_by_id(id)?;
            if note.is_none() {
                tracing::debug!(note_id = id, "selected note not found");
            }
            selected.publish(note.clone());
            Ok(note)
        })
    }

    /// Reads one note for a caller that needs it before writing. Unlike
    /// [`NoteViewModel::select_by_id`] the selection slot is left untouched.
    pub async fn load(&self, id: i64) -> AppResult<Note> {
        let repository = self.repository.clone();
        tokio::task::spawn_blocking(move || repository.get_note_by_id(id))
            .await
            .map_err(|error| AppError::Internal(error.to_string()))??
            .ok_or_else(|| AppError::NotFound(format!("note {id}")))
    }

    pub fn create(&self, title: &str, content: &str, image_path: Option<String>) -> PendingWrite<i64> {
        let note = Note::new(title, content, image_path);
        self.launch("create", move |repository| {
            let id = repository.insert_note(&note)?;
            tracing::info!(note_id = id, has_image = note.image_path.is_some(), "note created");
            Ok(id)
        })
    }

    /// Writes `note` as a full replacement of the stored record with the same id.
    pub fn update(&self, note: Note) -> PendingWrite<i64> {
        self.launch("update", move |repository| {
            let id = repository.update_note(&note)?;
            tracing::info!(note_id = id, "note updated");
            Ok(id)
        })
    }

    pub fn delete(&self, note: Note) -> PendingWrite<()> {
        self.launch("delete", move |repository| {
            repository.delete_note(&note)?;
            tracing::info!(note_id = note.id, "note deleted");
            Ok(())
        })
    }

    pub fn delete_by_id(&self, id: i64) -> PendingWrite<()> {
        self.launch("delete", move |repository| {
            repository.delete_note_by_id(id)?;
            tracing::info!(note_id = id, "note deleted");
            Ok(())
        })
    }

    pub fn clear_selection(&self) {
        self.selected.publish(None);
    }

    fn launch<T, F>(&self, operation: &'static str, work: F) -> PendingWrite<T>
    where
        T: Send + 'static,
        F: FnOnce(&NoteRepository) -> AppResult<T> + Send + 'static,
    {
        let repository = self.repository.clone();
        let handle = tokio::task::spawn_blocking(move || match work(&repository) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::error!(operation, error = %error, "note store operation failed");
                None
            }
        });
        PendingWrite { handle }
    }
}
