//! Ephemeral staging directories

use super::ProvisionError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A uniquely named directory that is removed when dropped.
///
/// Removal is best-effort: a failure is logged and never replaces the error
/// that caused the scope to unwind.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    pub fn create(root: &Path) -> Result<Self, ProvisionError> {
        let path = root.join(Uuid::new_v4().to_string());
        info!("Creating tempdir {}", path.display());
        fs::create_dir_all(&path).map_err(|e| ProvisionError::filesystem(&path, e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!("Removed tempdir {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove tempdir {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
