use crate::live::{LivePublisher, LiveStream, Subscription};
use crate::models::{Note, NoteSnapshot};
use crate::platform::{Navigator, Screen, NEW_NOTE_ID};
use crate::view_model::{NoteViewModel, PendingWrite};
use chrono::{Local, TimeZone};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub const UNTITLED: &str = "Untitled";
pub const EMPTY_LIST_MESSAGE: &str = "No notes yet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowChange {
    Removed { index: usize, id: i64 },
    Inserted { index: usize, id: i64 },
    Moved { from: usize, to: usize, id: i64 },
    Changed { index: usize, id: i64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDiff {
    pub changes: Vec<RowChange>,
    pub unchanged: usize,
}

impl ListDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Reconciles two row lists by id, then by full equality.
///
/// Rows on the longest common id subsequence keep their place; the rest are reported as
/// removed, inserted or moved. Rows present on both sides whose contents differ are also
/// reported as changed, indexed into `new`.
pub fn diff_rows(old: &[Note], new: &[Note]) -> ListDiff {
    let old_index: HashMap<i64, usize> = old.iter().enumerate().map(|(index, note)| (note.id, index)).collect();
    let new_ids: HashSet<i64> = new.iter().map(|note| note.id).collect();
    let stable = longest_common_ids(old, new);

    let mut diff = ListDiff::default();
    for (index, note) in old.iter().enumerate() {
        if !new_ids.contains(&note.id) {
            diff.changes.push(RowChange::Removed { index, id: note.id });
        }
    }
    for (index, note) in new.iter().enumerate() {
        let Some(&from) = old_index.get(&note.id) else {
            diff.changes.push(RowChange::Inserted { index, id: note.id });
            continue;
        };
        if !stable.contains(&note.id) {
            diff.changes.push(RowChange::Moved { from, to: index, id: note.id });
        }
        if old[from] != *note {
            diff.changes.push(RowChange::Changed { index, id: note.id });
        } else if stable.contains(&note.id) {
            diff.unchanged += 1;
        }
    }
    diff
}

fn longest_common_ids(old: &[Note], new: &[Note]) -> HashSet<i64> {
    let prefix = old
        .iter()
        .zip(new)
        .take_while(|(before, after)| before.id == after.id)
        .count();
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take_while(|(before, after)| before.id == after.id)
        .count();

    let mut common: HashSet<i64> = old[..prefix]
        .iter()
        .chain(&old[old.len() - suffix..])
        .map(|note| note.id)
        .collect();

    // Only rows present on both sides can be on the common subsequence.
    let old_ids: HashSet<i64> = old[prefix..old.len() - suffix].iter().map(|note| note.id).collect();
    let new_ids: HashSet<i64> = new[prefix..new.len() - suffix].iter().map(|note| note.id).collect();
    let old_mid: Vec<i64> = old[prefix..old.len() - suffix]
        .iter()
        .map(|note| note.id)
        .filter(|id| new_ids.contains(id))
        .collect();
    let new_mid: Vec<i64> = new[prefix..new.len() - suffix]
        .iter()
        .map(|note| note.id)
        .filter(|id| old_ids.contains(id))
        .collect();

    let (rows, cols) = (old_mid.len(), new_mid.len());
    let width = cols + 1;
    let mut lengths = vec![0_usize; (rows + 1) * width];
    for i in (0..rows).rev() {
        for j in (0..cols).rev() {
            lengths[i * width + j] = if old_mid[i] == new_mid[j] {
                lengths[(i + 1) * width + j + 1] + 1
            } else {
                lengths[(i + 1) * width + j].max(lengths[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < rows && j < cols {
        if old_mid[i] == new_mid[j] {
            common.insert(old_mid[i]);
            i += 1;
            j += 1;
        } else if lengths[(i + 1) * width + j] >= lengths[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    common
}

/// Display form of one list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub date: String,
}

impl From<&Note> for NoteRow {
    fn from(note: &Note) -> Self {
        let title = if note.title.is_empty() {
            UNTITLED.to_string()
        } else {
            note.title.clone()
        };
        Self {
            id: note.id,
            title,
            content: note.content.clone(),
            date: format_timestamp(note.timestamp),
        }
    }
}

/// `MMM dd, yyyy HH:mm` in local time; empty for out-of-range values.
pub fn format_timestamp(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|time| time.format("%b %d, %Y %H:%M").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub notes: Vec<Note>,
    pub last_diff: ListDiff,
    pub renders: u64,
}

impl ListState {
    pub fn shows_placeholder(&self) -> bool {
        self.notes.is_empty()
    }

    /// Message shown in place of the rows while the list is empty.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.shows_placeholder().then_some(EMPTY_LIST_MESSAGE)
    }

    pub fn rows(&self) -> Vec<NoteRow> {
        self.notes.iter().map(NoteRow::from).collect()
    }

    fn render(&mut self, snapshot: &NoteSnapshot) -> bool {
        let diff = diff_rows(&self.notes, snapshot);
        if diff.is_empty() && self.renders > 0 {
            return false;
        }
        self.notes = snapshot.to_vec();
        self.last_diff = diff;
        self.renders += 1;
        true
    }
}

/// Headless list screen. The live-list subscription lives as long as the screen.
pub struct NoteListScreen {
    view_model: Arc<NoteViewModel>,
    navigator: Arc<dyn Navigator>,
    state: Arc<LivePublisher<ListState>>,
    pending_delete: Option<Note>,
    _subscription: Subscription,
}

impl NoteListScreen {
    pub fn open(view_model: Arc<NoteViewModel>, navigator: Arc<dyn Navigator>) -> Self {
        let state = Arc::new(LivePublisher::new(ListState::default()));
        let subscription = view_model.all_notes().observe({
            let state = state.clone();
            move |snapshot| {
                state.modify(|current| current.render(&snapshot));
            }
        });

        Self {
            view_model,
            navigator,
            state,
            pending_delete: None,
            _subscription: subscription,
        }
    }

    pub fn state(&self) -> ListState {
        self.state.current()
    }

    /// Stream of rendered states, for hosts that redraw on change.
    pub fn rendered(&self) -> LiveStream<ListState> {
        self.state.stream()
    }

    pub fn tap(&self, id: i64) -> bool {
        if !self.state.current().notes.iter().any(|note| note.id == id) {
            return false;
        }
        self.navigator.navigate(Screen::NoteEdit { note_id: id });
        true
    }

    pub fn add_note(&self) {
        self.navigator.navigate(Screen::NoteEdit { note_id: NEW_NOTE_ID });
    }

    /// Starts the delete confirmation for the row; returns `false` for unknown ids.
    pub fn long_press(&mut self, id: i64) -> bool {
        let note = self.state.current().notes.into_iter().find(|note| note.id == id);
        let found = note.is_some();
        self.pending_delete = note;
        found
    }

    pub fn pending_delete(&self) -> Option<&Note> {
        self.pending_delete.as_ref()
    }

    pub fn confirm_delete(&mut self) -> Option<PendingWrite<()>> {
        let note = self.pending_delete.take()?;
        Some(self.view_model.delete(note))
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }
}
