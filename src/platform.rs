//! Contracts for the host platform pieces the screens talk to: navigation, transient
//! messages, runtime permissions and the camera.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

pub type PlatformFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Navigation argument meaning "open the editor on a new, unsaved note".
pub const NEW_NOTE_ID: i64 = -1;

pub const CAMERA_PERMISSION_MESSAGE: &str = "Camera permission required";
pub const IMAGE_FILE_ERROR_MESSAGE: &str = "Error creating image file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    NoteList,
    NoteEdit { note_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    Camera,
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, screen: Screen);
    /// Returns to the previous screen.
    fn back(&self);
}

pub trait Notifier: Send + Sync {
    fn show(&self, message: &str);
}

pub trait PermissionPrompt: Send + Sync {
    fn is_granted(&self, permission: Permission) -> bool;
    /// Asks the user; resolves to whether the permission was granted.
    fn request(&self, permission: Permission) -> PlatformFuture<'_, bool>;
}

pub trait Camera: Send + Sync {
    /// Hands control to the camera, which writes a JPEG to `destination` on success.
    /// There is no timeout: the future resolves only when the camera reports back.
    fn capture<'a>(&'a self, destination: &'a Path) -> PlatformFuture<'a, bool>;
}
