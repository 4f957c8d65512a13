use crate::errors::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};

pub const DATABASE_FILE: &str = "notes.sqlite";
pub const PICTURES_DIR: &str = "pictures";
pub const LOG_DIR: &str = "logs";

/// Filesystem layout under the platform's app-private data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub database: PathBuf,
    pub pictures: PathBuf,
    pub logs: PathBuf,
}

impl AppPaths {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            database: data_dir.join(DATABASE_FILE),
            pictures: data_dir.join(PICTURES_DIR),
            logs: data_dir.join(LOG_DIR),
        }
    }

    pub fn ensure(&self) -> AppResult<()> {
        for dir in [&self.data_dir, &self.pictures, &self.logs] {
            fs::create_dir_all(dir)
                .map_err(|err| AppError::Io(format!("{}: {err}", dir.display())))?;
        }
        Ok(())
    }
}
