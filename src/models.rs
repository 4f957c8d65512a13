use crate::errors::{AppError, AppResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Id carried by a note that has not been written to the store yet.
pub const UNSAVED_NOTE_ID: i64 = 0;

pub const EMPTY_NOTE_MESSAGE: &str = "Note cannot be empty";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Epoch milliseconds of creation or of the last save.
    pub timestamp: i64,
    pub image_path: Option<String>,
}

impl Note {
    /// Builds an unsaved note stamped with the current time.
    pub fn new(title: impl Into<String>, content: impl Into<String>, image_path: Option<String>) -> Self {
        Self {
            id: UNSAVED_NOTE_ID,
            title: title.into(),
            content: content.into(),
            timestamp: now_millis(),
            image_path,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id > UNSAVED_NOTE_ID
    }

    /// Copy of this note with the given fields and a refreshed timestamp that never
    /// moves backwards.
    pub fn revised(&self, draft: NoteDraft) -> Self {
        Self {
            id: self.id,
            title: draft.title,
            content: draft.content,
            timestamp: now_millis().max(self.timestamp),
            image_path: draft.image_path,
        }
    }
}

/// Shared, immutable view of the whole table as delivered by the live stream.
pub type NoteSnapshot = Arc<Vec<Note>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub image_path: Option<String>,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>, image_path: Option<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            image_path,
        }
    }

    /// Trims both text fields and rejects a draft with nothing left in either.
    pub fn normalized(self) -> AppResult<Self> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();
        if title.is_empty() && content.is_empty() {
            return Err(AppError::Validation(EMPTY_NOTE_MESSAGE.to_string()));
        }
        Ok(Self {
            title,
            content,
            image_path: self.image_path,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveNotePayload {
    pub id: Option<i64>,
    pub title: String,
    pub content: String,
    pub image_path: Option<String>,
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
