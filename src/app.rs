use crate::config::AppPaths;
use crate::db::Database;
use crate::edit_view::{EditPlatform, NoteEditScreen};
use crate::errors::AppResult;
use crate::images::ImageStore;
use crate::list_view::NoteListScreen;
use crate::platform::Navigator;
use crate::repository::NoteRepository;
use crate::view_model::NoteViewModel;
use std::path::PathBuf;
use std::sync::Arc;

/// Composition root: store, repository, view model and photo storage wired together once.
#[derive(Clone)]
pub struct NotesApp {
    db: Arc<Database>,
    view_model: Arc<NoteViewModel>,
    images: ImageStore,
}

impl NotesApp {
    pub fn new(paths: &AppPaths) -> AppResult<Self> {
        paths.ensure()?;
        let db = Arc::new(Database::new(&paths.database)?);
        tracing::info!(path = %paths.database.display(), "notes database ready");
        Ok(Self::assemble(db, ImageStore::new(&paths.pictures)))
    }

    /// Unpersisted variant for tests and previews.
    pub fn in_memory(pictures_dir: impl Into<PathBuf>) -> AppResult<Self> {
        let db = Arc::new(Database::in_memory()?);
        Ok(Self::assemble(db, ImageStore::new(pictures_dir)))
    }

    fn assemble(db: Arc<Database>, images: ImageStore) -> Self {
        let repository = NoteRepository::new(db.clone());
        let view_model = Arc::new(NoteViewModel::new(repository));
        Self {
            db,
            view_model,
            images,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn view_model(&self) -> Arc<NoteViewModel> {
        self.view_model.clone()
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn open_list(&self, navigator: Arc<dyn Navigator>) -> NoteListScreen {
        NoteListScreen::open(self.view_model.clone(), navigator)
    }

    pub fn open_editor(&self, note_id: i64, platform: EditPlatform) -> NoteEditScreen {
        NoteEditScreen::open(note_id, self.view_model.clone(), self.images.clone(), platform)
    }
}
