//! Host filesystem access.
//!
//! The engine only needs to probe and create directories. [`LocalHost`]
//! talks to the real filesystem; [`MemoryHost`] keeps a tree in memory and
//! records every directory it creates, which is what tests assert against.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::error::{VfsError, VfsResult};
use super::types::DirEntry;

/// Filesystem calls the resolver and materializer depend on.
#[async_trait]
pub trait HostFs: Send + Sync {
    /// Returns true if anything exists at `path`.
    async fn exists(&self, path: &Path) -> bool;

    /// Returns true if `path` is an existing directory.
    async fn is_dir(&self, path: &Path) -> bool;

    /// Create a single directory. The parent must already exist.
    async fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Entries of the directory at `path`, sorted by name.
    async fn read_dir(&self, path: &Path) -> VfsResult<Vec<DirEntry>>;
}

/// The real filesystem, via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalHost;

#[async_trait]
impl HostFs for LocalHost {
    async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok()
    }

    async fn is_dir(&self, path: &Path) -> bool {
        fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
    }

    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path).await
    }

    async fn read_dir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(path).await.map_err(VfsError::from)?;

        while let Some(entry) = dir.next_entry().await.map_err(VfsError::from)? {
            let is_dir = fs::metadata(entry.path())
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(if is_dir {
                DirEntry::directory(name)
            } else {
                DirEntry::file(name)
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[derive(Debug, Default)]
struct MemoryHostState {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    created: Vec<PathBuf>,
}

/// In-memory host filesystem.
///
/// Thread-safe via an internal mutex. Every successful `create_dir` is
/// appended to a log readable with [`MemoryHost::created`].
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<MemoryHostState>,
}

impl MemoryHost {
    /// Create an empty host. Not even `/` exists until added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory and all of its ancestors. Not recorded as created.
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        {
            let mut state = self.state.lock();
            for ancestor in path.as_ref().ancestors() {
                if !ancestor.as_os_str().is_empty() {
                    state.dirs.insert(ancestor.to_path_buf());
                }
            }
        }
        self
    }

    /// Add a file, creating its parent directories.
    pub fn with_file(self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> Self {
        let path = path.as_ref();
        let this = match path.parent() {
            Some(parent) => self.with_dir(parent),
            None => self,
        };
        this.state.lock().files.insert(path.to_path_buf(), data.into());
        this
    }

    /// Directories created through [`HostFs::create_dir`], in call order.
    pub fn created(&self) -> Vec<PathBuf> {
        self.state.lock().created.clone()
    }
}

#[async_trait]
impl HostFs for MemoryHost {
    async fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock();
        state.dirs.contains(path) || state.files.contains_key(path)
    }

    async fn is_dir(&self, path: &Path) -> bool {
        self.state.lock().dirs.contains(path)
    }

    async fn create_dir(&self, path: &Path) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.dirs.contains(path) || state.files.contains_key(path) {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, path.display().to_string()));
        }
        let parent_ok = path.parent().is_some_and(|p| state.dirs.contains(p));
        if !parent_ok {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent of {} does not exist", path.display()),
            ));
        }
        state.dirs.insert(path.to_path_buf());
        state.created.push(path.to_path_buf());
        Ok(())
    }

    async fn read_dir(&self, path: &Path) -> VfsResult<Vec<DirEntry>> {
        let state = self.state.lock();
        if !state.dirs.contains(path) {
            return Err(VfsError::not_found(path.display().to_string()));
        }
        let mut entries: Vec<DirEntry> = state
            .dirs
            .iter()
            .filter(|d| d.parent() == Some(path))
            .filter_map(|d| d.file_name())
            .map(|n| DirEntry::directory(n.to_string_lossy()))
            .chain(
                state
                    .files
                    .keys()
                    .filter(|f| f.parent() == Some(path))
                    .filter_map(|f| f.file_name())
                    .map(|n| DirEntry::file(n.to_string_lossy())),
            )
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
