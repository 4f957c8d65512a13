use crate::errors::{AppError, AppResult};
use crate::images::ImageStore;
use crate::live::{LivePublisher, LiveStream, Subscription};
use crate::models::{Note, NoteDraft, EMPTY_NOTE_MESSAGE, UNSAVED_NOTE_ID};
use crate::platform::{
    Camera, Navigator, Notifier, Permission, PermissionPrompt, CAMERA_PERMISSION_MESSAGE,
    IMAGE_FILE_ERROR_MESSAGE,
};
use crate::view_model::{NoteViewModel, PendingWrite};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    Create,
    Edit { note_id: i64 },
}

impl EditMode {
    /// `NEW_NOTE_ID` and any other non-persisted id open an empty form.
    pub fn from_note_id(note_id: i64) -> Self {
        if note_id > UNSAVED_NOTE_ID {
            Self::Edit { note_id }
        } else {
            Self::Create
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditForm {
    pub title: String,
    pub content: String,
    pub image_path: Option<String>,
    /// Whether the attached photo is currently rendered; missing files are not.
    pub image_visible: bool,
    pub overlay_open: bool,
    /// The stored note the form was populated from, in edit mode.
    pub loaded: Option<Note>,
}

#[derive(Debug)]
pub enum SaveOutcome {
    Rejected,
    Submitted(PendingWrite<i64>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoOutcome {
    Attached(PathBuf),
    PermissionDenied,
    FileError,
    Cancelled,
}

/// Host services the editor needs.
#[derive(Clone)]
pub struct EditPlatform {
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub permissions: Arc<dyn PermissionPrompt>,
    pub camera: Arc<dyn Camera>,
}

/// Headless editor screen for one note. Dropping it clears the selected-note slot.
pub struct NoteEditScreen {
    mode: EditMode,
    view_model: Arc<NoteViewModel>,
    images: ImageStore,
    platform: EditPlatform,
    form: Arc<LivePublisher<EditForm>>,
    load: Option<PendingWrite<Option<Note>>>,
    _selection: Option<Subscription>,
}

impl NoteEditScreen {
    pub fn open(note_id: i64, view_model: Arc<NoteViewModel>, images: ImageStore, platform: EditPlatform) -> Self {
        let mode = EditMode::from_note_id(note_id);
        let form = Arc::new(LivePublisher::new(EditForm::default()));

        let (selection, load) = match mode {
            EditMode::Create => (None, None),
            EditMode::Edit { note_id } => {
                let subscription = view_model.selected_note().observe({
                    let form = form.clone();
                    move |selected: Option<Note>| {
                        let Some(note) = selected else { return };
                        if note.id == note_id {
                            populate_once(&form, note);
                        }
                    }
                });
                (Some(subscription), Some(view_model.select_by_id(note_id)))
            }
        };

        Self {
            mode,
            view_model,
            images,
            platform,
            form,
            load,
            _selection: selection,
        }
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn form(&self) -> EditForm {
        self.form.current()
    }

    pub fn form_changes(&self) -> LiveStream<EditForm> {
        self.form.stream()
    }

    /// Waits for the initial load in edit mode. `None` in create mode or when the note no
    /// longer exists.
    pub async fn wait_loaded(&mut self) -> Option<Note> {
        let pending = self.load.take()?;
        let note = pending.wait().await.flatten()?;
        if let EditMode::Edit { note_id } = self.mode {
            if note.id == note_id {
                populate_once(&self.form, note);
            }
        }
        self.form.current().loaded
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.form.modify(|form| {
            form.title = title;
            true
        });
    }

    pub fn set_content(&self, content: impl Into<String>) {
        let content = content.into();
        self.form.modify(|form| {
            form.content = content;
            true
        });
    }

    pub fn save(&self) -> SaveOutcome {
        let form = self.form.current();
        let draft = match NoteDraft::new(form.title, form.content, form.image_path).normalized() {
            Ok(draft) => draft,
            Err(error) => {
                tracing::debug!(error = %error, "rejected note save");
                self.platform.notifier.show(EMPTY_NOTE_MESSAGE);
                return SaveOutcome::Rejected;
            }
        };

        let pending = match &form.loaded {
            Some(note) => self.view_model.update(note.revised(draft)),
            None => self
                .view_model
                .create(&draft.title, &draft.content, draft.image_path),
        };

        self.view_model.clear_selection();
        self.platform.navigator.back();
        SaveOutcome::Submitted(pending)
    }

    pub async fn capture_photo(&self) -> PhotoOutcome {
        if let Err(error) = self.ensure_camera_permission().await {
            tracing::debug!(error = %error, "photo capture blocked");
            self.platform.notifier.show(CAMERA_PERMISSION_MESSAGE);
            return PhotoOutcome::PermissionDenied;
        }

        let destination = match self.images.allocate() {
            Ok(path) => path,
            Err(error) => {
                tracing::warn!(error = %error, "failed to allocate photo file");
                self.platform.notifier.show(IMAGE_FILE_ERROR_MESSAGE);
                return PhotoOutcome::FileError;
            }
        };

        if !self.platform.camera.capture(&destination).await {
            tracing::debug!(path = %destination.display(), "camera capture did not complete");
            return PhotoOutcome::Cancelled;
        }

        let recorded = destination.to_string_lossy().into_owned();
        self.form.modify(|form| {
            form.image_visible = Path::new(&recorded).is_file();
            form.image_path = Some(recorded);
            true
        });
        PhotoOutcome::Attached(destination)
    }

    async fn ensure_camera_permission(&self) -> AppResult<()> {
        let permissions = &self.platform.permissions;
        if permissions.is_granted(Permission::Camera) || permissions.request(Permission::Camera).await {
            Ok(())
        } else {
            Err(AppError::PermissionDenied(CAMERA_PERMISSION_MESSAGE.to_string()))
        }
    }

    /// Bytes of the attached photo, or `None` when nothing is attached or the file is gone.
    pub fn image(&self) -> Option<Vec<u8>> {
        let path = self.form.current().image_path?;
        match self.images.load(Path::new(&path)) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(error = %error, path = %path, "failed to read photo");
                None
            }
        }
    }

    /// Opens the full-screen photo overlay; returns the photo when there is one to show.
    pub fn open_image_overlay(&self) -> Option<Vec<u8>> {
        let bytes = self.image()?;
        self.form.modify(|form| {
            form.overlay_open = true;
            true
        });
        Some(bytes)
    }

    pub fn dismiss_image_overlay(&self) {
        self.form.modify(|form| std::mem::replace(&mut form.overlay_open, false));
    }
}

impl Drop for NoteEditScreen {
    fn drop(&mut self) {
        self.view_model.clear_selection();
    }
}

/// Fills the form from the stored note unless it was already filled, so later store
/// updates never overwrite user input.
fn populate_once(form: &LivePublisher<EditForm>, note: Note) {
    form.modify(|form| {
        if form.loaded.is_some() {
            return false;
        }
        populate(form, note);
        true
    });
}

fn populate(form: &mut EditForm, note: Note) {
    form.title = note.title.clone();
    form.content = note.content.clone();
    form.image_visible = note
        .image_path
        .as_deref()
        .is_some_and(|path| Path::new(path).is_file());
    form.image_path = note.image_path.clone();
    form.loaded = Some(note);
}

#[cfg(test)]
mod tests {
    use super::{EditMode, EditPlatform, NoteEditScreen, PhotoOutcome, SaveOutcome};
    use crate::db::Database;
    use crate::errors::AppError;
    use crate::images::ImageStore;
    use crate::models::{Note, EMPTY_NOTE_MESSAGE};
    use crate::platform::fakes::{FakeCamera, NavEvent, RecordingNavigator, RecordingNotifier, ScriptedPermissions};
    use crate::platform::{CAMERA_PERMISSION_MESSAGE, IMAGE_FILE_ERROR_MESSAGE, NEW_NOTE_ID};
    use crate::repository::NoteRepository;
    use crate::view_model::NoteViewModel;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use std::time::Duration;

    struct Harness {
        view_model: Arc<NoteViewModel>,
        navigator: Arc<RecordingNavigator>,
        notifier: Arc<RecordingNotifier>,
        permissions: Arc<ScriptedPermissions>,
        camera: Arc<FakeCamera>,
        images: ImageStore,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(permissions: ScriptedPermissions, camera: FakeCamera) -> Self {
            let dir = tempfile::tempdir().expect("tempdir");
            Self {
                view_model: Arc::new(NoteViewModel::new(NoteRepository::new(Arc::new(
                    Database::in_memory().expect("db"),
                )))),
                navigator: Arc::new(RecordingNavigator::default()),
                notifier: Arc::new(RecordingNotifier::default()),
                permissions: Arc::new(permissions),
                camera: Arc::new(camera),
                images: ImageStore::new(dir.path().join("pictures")),
                _dir: dir,
            }
        }

        fn granted() -> Self {
            Self::new(ScriptedPermissions::new(true, true), FakeCamera::new(true))
        }

        fn open(&self, note_id: i64) -> NoteEditScreen {
            NoteEditScreen::open(
                note_id,
                self.view_model.clone(),
                self.images.clone(),
                EditPlatform {
                    navigator: self.navigator.clone(),
                    notifier: self.notifier.clone(),
                    permissions: self.permissions.clone(),
                    camera: self.camera.clone(),
                },
            )
        }

        async fn stored(&self, id: i64) -> Option<Note> {
            self.view_model.select_by_id(id).wait().await.flatten()
        }
    }

    async fn submitted(outcome: SaveOutcome) -> i64 {
        match outcome {
            SaveOutcome::Submitted(pending) => pending.wait().await.expect("write succeeded"),
            SaveOutcome::Rejected => panic!("save was rejected"),
        }
    }

    #[tokio::test]
    async fn create_mode_saves_trimmed_note_and_returns() {
        let harness = Harness::granted();
        let mut screen = harness.open(NEW_NOTE_ID);
        assert_eq!(screen.mode(), EditMode::Create);
        assert!(screen.wait_loaded().await.is_none());

        screen.set_title("  Groceries ");
        screen.set_content("milk, eggs\n");
        let id = submitted(screen.save()).await;

        let stored = harness.stored(id).await.expect("stored");
        assert_eq!(stored.title, "Groceries");
        assert_eq!(stored.content, "milk, eggs");
        assert!(stored.image_path.is_none());
        assert_eq!(harness.navigator.events(), vec![NavEvent::Back]);
    }

    #[tokio::test]
    async fn blank_note_is_rejected_without_writing() {
        let harness = Harness::granted();
        let screen = harness.open(NEW_NOTE_ID);
        screen.set_title("   ");
        screen.set_content("\n");

        assert!(matches!(screen.save(), SaveOutcome::Rejected));
        assert_eq!(harness.notifier.messages(), vec![EMPTY_NOTE_MESSAGE.to_string()]);
        assert!(harness.navigator.events().is_empty());
        assert!(harness.view_model.all_notes().current().is_empty());
    }

    #[tokio::test]
    async fn edit_mode_populates_once_and_updates_in_place() {
        let harness = Harness::granted();
        let id = harness
            .view_model
            .create("draft", "body", None)
            .wait()
            .await
            .expect("created");
        let original = harness.stored(id).await.expect("stored");

        let mut screen = harness.open(id);
        assert_eq!(screen.mode(), EditMode::Edit { note_id: id });
        assert_eq!(screen.wait_loaded().await, Some(original.clone()));
        assert_eq!(screen.form().title, "draft");

        screen.set_title("final");
        // A fresh selection of the same note must not clobber the edit.
        harness.view_model.select_by_id(id).wait().await.expect("reselect");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(screen.form().title, "final");

        assert_eq!(submitted(screen.save()).await, id);
        let stored = harness.stored(id).await.expect("stored");
        assert_eq!(stored.title, "final");
        assert_eq!(stored.content, "body");
        assert!(stored.timestamp >= original.timestamp);
        assert_eq!(harness.view_model.all_notes().current().len(), 1);
    }

    #[tokio::test]
    async fn deleted_note_leaves_form_blank() {
        let harness = Harness::granted();
        let id = harness.view_model.create("gone", "", None).wait().await.expect("created");
        harness.view_model.delete_by_id(id).wait().await.expect("deleted");

        let mut screen = harness.open(id);
        assert!(screen.wait_loaded().await.is_none());
        assert_eq!(screen.form().title, "");
        assert!(screen.form().loaded.is_none());
        assert!(harness.notifier.messages().is_empty());
    }

    #[tokio::test]
    async fn load_completes_even_when_selection_is_cleared_early() {
        let harness = Harness::granted();
        let id = harness.view_model.create("early", "", None).wait().await.expect("created");

        let mut screen = harness.open(id);
        harness.view_model.clear_selection();
        let loaded = tokio::time::timeout(Duration::from_secs(2), screen.wait_loaded())
            .await
            .expect("load finished");
        assert_eq!(loaded.map(|note| note.title), Some("early".to_string()));
        assert_eq!(screen.form().title, "early");
    }

    #[tokio::test]
    async fn dropping_screen_clears_selection() {
        let harness = Harness::granted();
        let id = harness.view_model.create("a", "b", None).wait().await.expect("created");
        let mut screen = harness.open(id);
        screen.wait_loaded().await.expect("loaded");
        assert!(harness.view_model.selected_note().current().is_some());

        drop(screen);
        assert!(harness.view_model.selected_note().current().is_none());
    }

    #[tokio::test]
    async fn photo_capture_attaches_path_and_saves_it() {
        let harness = Harness::new(ScriptedPermissions::new(false, true), FakeCamera::new(true));
        let screen = harness.open(NEW_NOTE_ID);
        screen.set_content("with photo");

        let PhotoOutcome::Attached(path) = screen.capture_photo().await else {
            panic!("photo not attached");
        };
        assert_eq!(harness.permissions.requests.load(Ordering::SeqCst), 1);
        let form = screen.form();
        assert_eq!(form.image_path, Some(path.to_string_lossy().into_owned()));
        assert!(form.image_visible);

        assert_eq!(screen.open_image_overlay(), Some(vec![0xFF, 0xD8, 0xFF, 0xD9]));
        assert!(screen.form().overlay_open);
        screen.dismiss_image_overlay();
        assert!(!screen.form().overlay_open);

        let id = submitted(screen.save()).await;
        let stored = harness.stored(id).await.expect("stored");
        assert_eq!(stored.image_path, Some(path.to_string_lossy().into_owned()));
    }

    #[tokio::test]
    async fn denied_permission_shows_message_and_skips_camera() {
        let harness = Harness::new(ScriptedPermissions::new(false, false), FakeCamera::new(true));
        let screen = harness.open(NEW_NOTE_ID);

        let error = screen.ensure_camera_permission().await.expect_err("denied");
        assert!(matches!(error, AppError::PermissionDenied(_)));
        assert_eq!(error.to_string(), format!("PERMISSION_DENIED: {CAMERA_PERMISSION_MESSAGE}"));

        assert_eq!(screen.capture_photo().await, PhotoOutcome::PermissionDenied);
        assert_eq!(harness.notifier.messages(), vec![CAMERA_PERMISSION_MESSAGE.to_string()]);
        assert!(harness.camera.shots().is_empty());
        assert!(screen.form().image_path.is_none());
    }

    #[tokio::test]
    async fn unusable_picture_directory_reports_file_error() {
        let harness = Harness::granted();
        std::fs::write(harness.images.dir(), b"blocker").expect("block directory");
        let screen = harness.open(NEW_NOTE_ID);

        assert_eq!(screen.capture_photo().await, PhotoOutcome::FileError);
        assert_eq!(harness.notifier.messages(), vec![IMAGE_FILE_ERROR_MESSAGE.to_string()]);
        assert!(harness.camera.shots().is_empty());
    }

    #[tokio::test]
    async fn cancelled_capture_keeps_previous_photo_state() {
        let harness = Harness::new(ScriptedPermissions::new(true, true), FakeCamera::new(false));
        let screen = harness.open(NEW_NOTE_ID);

        assert_eq!(screen.capture_photo().await, PhotoOutcome::Cancelled);
        assert_eq!(harness.camera.shots().len(), 1);
        assert!(screen.form().image_path.is_none());
        assert!(screen.open_image_overlay().is_none());
    }

    #[tokio::test]
    async fn missing_photo_file_is_not_rendered() {
        let harness = Harness::granted();
        let missing = harness.images.dir().join("JPEG_missing.jpg");
        let id = harness
            .view_model
            .create("with photo", "", Some(missing.to_string_lossy().into_owned()))
            .wait()
            .await
            .expect("created");

        let mut screen = harness.open(id);
        screen.wait_loaded().await.expect("loaded");
        let form = screen.form();
        assert!(form.image_path.is_some());
        assert!(!form.image_visible);
        assert!(screen.image().is_none());
        assert!(screen.open_image_overlay().is_none());
        assert!(!screen.form().overlay_open);
    }
}
