use crate::error::StudyError;
use anyhow::Result;
use log::debug;
use std::fs;
use std::path::PathBuf;

/// Boundary to the research-data repository. The core treats each call as
/// atomic: it fully succeeds or the error propagates, with no retry or
/// partial-success bookkeeping here.
pub trait FileStore {
    fn list_files(&self) -> Result<Vec<String>>;
    fn download(&self, name: &str) -> Result<Vec<u8>>;
    fn upload(&self, name: &str, bytes: &[u8]) -> Result<()>;
}

/// Directory-backed store, used for local runs and as the staging target
/// in tests. One flat namespace of session files per study.
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    /// Open an existing store directory.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the store directory if needed, then open it.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| StudyError::RemoteIo {
            name: root.display().to_string(),
            source,
        })?;
        Ok(Self { root })
    }

    fn remote_io(&self, name: &str, source: std::io::Error) -> StudyError {
        StudyError::RemoteIo {
            name: name.to_string(),
            source,
        }
    }
}

impl FileStore for LocalDirStore {
    fn list_files(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| self.remote_io(&self.root.display().to_string(), e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| self.remote_io(&self.root.display().to_string(), e))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(".csv") {
                names.push(name);
            }
        }
        names.sort();
        debug!("store {} lists {} files", self.root.display(), names.len());
        Ok(names)
    }

    fn download(&self, name: &str) -> Result<Vec<u8>> {
        fs::read(self.root.join(name))
            .map_err(|e| self.remote_io(name, e))
            .map_err(Into::into)
    }

    fn upload(&self, name: &str, bytes: &[u8]) -> Result<()> {
        fs::write(self.root.join(name), bytes)
            .map_err(|e| self.remote_io(name, e))
            .map_err(Into::into)
    }
}
