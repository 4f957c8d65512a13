use crate::errors::{AppError, AppResult};
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// App-private directory holding captured photos. Files are never cleaned up.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates a new, empty destination file for the camera to write into.
    pub fn allocate(&self) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|error| {
            AppError::Io(format!("creating picture directory {}: {error}", self.dir.display()))
        })?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .dir
            .join(format!("JPEG_{stamp}_{}.jpg", Uuid::new_v4().simple()));
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|error| AppError::Io(format!("creating image file {}: {error}", path.display())))?;
        tracing::debug!(path = %path.display(), "allocated image file");
        Ok(path)
    }

    /// Reads a photo for display. A missing file yields `None`.
    pub fn load(&self, path: &Path) -> AppResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "image file missing, skipping");
                Ok(None)
            }
            Err(error) => Err(error.into()),
        }
    }
}
