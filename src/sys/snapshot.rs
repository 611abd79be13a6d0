//! Cached last-frame images of applications.
//!
//! Showing a still image instead of the live window saves compositing work
//! for applications sitting in the background, and is the only thing left to
//! show once an application has been hibernated.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use std::{fs, io};

use image::RgbaImage;
use tracing::debug;

use crate::sys::geometry::Size;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("no snapshot stored for '{class_id}'")]
    NotFound { class_id: String },

    #[error("failed to stat snapshot '{}': {source}", path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to decode snapshot '{}': {source}", path.display())]
    Decode { path: PathBuf, source: image::ImageError },
}

#[derive(Clone)]
pub struct Snapshot {
    pub modified: SystemTime,
    pub size: Size,
    pub pixels: Arc<RgbaImage>,
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("modified", &self.modified)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

pub trait SnapshotStore {
    /// Modification time of the stored image for `class_id`, if any.
    fn modified(&self, class_id: &str) -> Option<SystemTime>;

    fn load(&self, class_id: &str) -> Result<Snapshot, SnapshotError>;
}

/// A store that never has anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSnapshots;

impl SnapshotStore for NoSnapshots {
    fn modified(&self, _class_id: &str) -> Option<SystemTime> { None }

    fn load(&self, class_id: &str) -> Result<Snapshot, SnapshotError> {
        Err(SnapshotError::NotFound { class_id: class_id.to_string() })
    }
}

/// Reads `<dir>/<class_id>.png`.
#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    dir: PathBuf,
}

impl FsSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self { Self { dir: dir.into() } }

    pub fn path_for(&self, class_id: &str) -> PathBuf {
        let file: String = class_id
            .chars()
            .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
            .collect();
        self.dir.join(format!("{file}.png"))
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn modified(&self, class_id: &str) -> Option<SystemTime> {
        fs::metadata(self.path_for(class_id)).and_then(|m| m.modified()).ok()
    }

    fn load(&self, class_id: &str) -> Result<Snapshot, SnapshotError> {
        let path = self.path_for(class_id);
        let modified = match fs::metadata(&path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound { class_id: class_id.to_string() });
            }
            Err(source) => return Err(SnapshotError::Io { path, source }),
        };
        let pixels = image::open(&path)
            .map_err(|source| SnapshotError::Decode { path: path.clone(), source })?
            .to_rgba8();
        debug!(path = %path.display(), width = pixels.width(), height = pixels.height(), "loaded snapshot");
        Ok(Snapshot {
            modified,
            size: Size::new(f64::from(pixels.width()), f64::from(pixels.height())),
            pixels: Arc::new(pixels),
        })
    }
}
