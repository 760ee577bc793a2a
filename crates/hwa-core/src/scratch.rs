//! Scratch files: uniquely named, removed on drop unless persisted.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Prefix shared by every file the service creates.
pub const SCRATCH_PREFIX: &str = "hwa_";

#[derive(Clone, Debug)]
pub struct ScratchSpace {
    dir: PathBuf,
}

impl ScratchSpace {
    pub fn new(dir: impl Into<PathBuf>) -> CoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CoreError::ScratchIo {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reserve a fresh path `hwa_<stem>_<uuid>.<ext>`. Nothing is written yet.
    pub fn file(&self, stem: &str, ext: &str) -> ScratchFile {
        let name = format!(
            "{SCRATCH_PREFIX}{stem}_{}.{ext}",
            Uuid::new_v4().simple()
        );
        ScratchFile {
            path: self.dir.join(name),
            keep: false,
        }
    }
}

#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    keep: bool,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, contents: &str) -> CoreResult<()> {
        fs::write(&self.path, contents).map_err(|source| CoreError::ScratchIo {
            path: self.path.clone(),
            source,
        })
    }

    /// Hand the file over to the caller; it will no longer be removed.
    pub fn persist(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.keep || !self.path.exists() {
            return;
        }
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to remove scratch file");
        }
    }
}
