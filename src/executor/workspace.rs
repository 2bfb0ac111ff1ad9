// Scratch workspace - one private directory per execution

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Uniquely named directory owned by a single execution.
///
/// `remove` deletes it; if that never happens (early return, panic, dropped
/// future) the directory is deleted synchronously on drop.
#[derive(Debug)]
pub struct ScratchWorkspace {
    path: PathBuf,
    removed: bool,
}

impl ScratchWorkspace {
    /// Create `<base>/<uuid>`; `base` is created if missing
    pub async fn create(base: &Path) -> io::Result<Self> {
        tokio::fs::create_dir_all(base).await?;
        let path = base.join(Uuid::new_v4().to_string());
        // create_dir, not create_dir_all: an existing directory is an error
        tokio::fs::create_dir(&path).await?;
        debug!(path = %path.display(), "created scratch workspace");
        Ok(Self {
            path,
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `contents` to `name` inside the workspace, returning the file path
    pub async fn write(&self, name: &str, contents: &str) -> io::Result<PathBuf> {
        let file = self.path.join(name);
        tokio::fs::write(&file, contents).await?;
        Ok(file)
    }

    /// Delete the workspace recursively. Failures are logged, never returned.
    pub async fn remove(mut self) {
        match tokio::fs::remove_dir_all(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed scratch workspace");
                self.removed = true;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.removed = true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove scratch workspace");
            }
        }
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if !self.removed {
            // Best effort; nothing useful to do with the error here
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
