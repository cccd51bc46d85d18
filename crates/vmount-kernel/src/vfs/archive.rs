//! Embedded read-only archives.
//!
//! Mount targets like `rom:` and `debug:` address archives instead of the
//! host filesystem. Archives are immutable once built and can be shared
//! between computers without locking.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{debug, warn};

use super::error::{VfsError, VfsResult};
use super::path::PathComponents;
use super::types::{DirEntry, FileType};

/// Metadata for an archive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub kind: FileType,
    /// Size in bytes (0 for directories).
    pub size: u64,
}

impl ArchiveEntry {
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// A read-only tree addressed by guest-style paths.
///
/// Lookups of missing entries return `None`; they are never errors.
pub trait Archive: Send + Sync + fmt::Debug {
    /// Metadata for `path`, relative to the archive root.
    fn lookup(&self, path: &PathComponents) -> Option<ArchiveEntry>;

    /// Entries directly under the directory `path`, sorted by name.
    fn list(&self, path: &PathComponents) -> Option<Vec<DirEntry>>;

    /// Contents of the file at `path`.
    fn read(&self, path: &PathComponents) -> Option<Vec<u8>>;
}

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Directory,
}

/// In-memory archive.
#[derive(Debug, Clone)]
pub struct MemoryArchive {
    nodes: BTreeMap<PathComponents, Node>,
}

impl Default for MemoryArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryArchive {
    /// Create an archive holding only its root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(PathComponents::root(), Node::Directory);
        Self { nodes }
    }

    /// Add a file, creating parent directories as needed.
    pub fn insert_file(&mut self, path: &str, data: impl Into<Vec<u8>>) -> VfsResult<()> {
        let path = PathComponents::normalize(path)?;
        let Some((parent, _)) = path.split_last() else {
            return Err(VfsError::invalid_path("archive root is a directory"));
        };
        self.insert_parents(&parent)?;
        if matches!(self.nodes.get(&path), Some(Node::Directory)) {
            return Err(VfsError::invalid_path(format!("{path} is a directory")));
        }
        self.nodes.insert(path, Node::File(data.into()));
        Ok(())
    }

    /// Add a directory, creating parent directories as needed.
    pub fn insert_dir(&mut self, path: &str) -> VfsResult<()> {
        let path = PathComponents::normalize(path)?;
        self.insert_parents(&path)
    }

    fn insert_parents(&mut self, dir: &PathComponents) -> VfsResult<()> {
        let mut current = PathComponents::root();
        for segment in dir {
            current = current.join(segment);
            match self.nodes.get(&current) {
                Some(Node::File(_)) => {
                    return Err(VfsError::invalid_path(format!("{current} is a file")));
                }
                Some(Node::Directory) => {}
                None => {
                    self.nodes.insert(current.clone(), Node::Directory);
                }
            }
        }
        Ok(())
    }

    /// Snapshot a host directory tree into memory.
    pub async fn load_dir(root: impl AsRef<Path>) -> VfsResult<Self> {
        let root = root.as_ref();
        let mut archive = Self::new();
        let mut pending: Vec<(PathBuf, PathComponents)> =
            vec![(root.to_path_buf(), PathComponents::root())];

        while let Some((dir, guest)) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let child = guest.join(&name);
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    archive.nodes.insert(child.clone(), Node::Directory);
                    pending.push((entry.path(), child));
                } else if file_type.is_file() {
                    let data = fs::read(entry.path()).await?;
                    archive.nodes.insert(child, Node::File(data));
                }
            }
        }

        debug!(root = %root.display(), entries = archive.nodes.len(), "loaded archive");
        Ok(archive)
    }
}

impl Archive for MemoryArchive {
    fn lookup(&self, path: &PathComponents) -> Option<ArchiveEntry> {
        self.nodes.get(path).map(|node| match node {
            Node::File(data) => ArchiveEntry {
                kind: FileType::File,
                size: data.len() as u64,
            },
            Node::Directory => ArchiveEntry {
                kind: FileType::Directory,
                size: 0,
            },
        })
    }

    fn list(&self, path: &PathComponents) -> Option<Vec<DirEntry>> {
        if !matches!(self.nodes.get(path), Some(Node::Directory)) {
            return None;
        }
        // BTreeMap order keeps same-parent children sorted by name.
        let entries = self
            .nodes
            .range(path.clone()..)
            .skip(1)
            .take_while(|(p, _)| p.starts_with(path))
            .filter(|(p, _)| p.len() == path.len() + 1)
            .filter_map(|(p, node)| {
                let name = p.last()?;
                Some(match node {
                    Node::File(_) => DirEntry::file(name),
                    Node::Directory => DirEntry::directory(name),
                })
            })
            .collect();
        Some(entries)
    }

    fn read(&self, path: &PathComponents) -> Option<Vec<u8>> {
        match self.nodes.get(path)? {
            Node::File(data) => Some(data.clone()),
            Node::Directory => None,
        }
    }
}

/// Archives available to a computer, by id.
#[derive(Debug, Clone, Default)]
pub struct ArchiveSet {
    archives: HashMap<String, Arc<dyn Archive>>,
}

impl ArchiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `archive` under `id` (`"rom"` for `rom:` targets).
    pub fn with(mut self, id: impl Into<String>, archive: impl Archive + 'static) -> Self {
        self.archives.insert(id.into(), Arc::new(archive));
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.archives.contains_key(id)
    }

    /// Look up `path` in archive `id`. An unknown id is a miss.
    pub fn lookup(&self, id: &str, path: &PathComponents) -> Option<ArchiveEntry> {
        match self.archives.get(id) {
            Some(archive) => archive.lookup(path),
            None => {
                warn!(archive = id, "mount refers to an archive that is not loaded");
                None
            }
        }
    }

    /// List the directory `path` in archive `id`.
    pub fn list(&self, id: &str, path: &PathComponents) -> Option<Vec<DirEntry>> {
        self.archives.get(id)?.list(path)
    }
}
