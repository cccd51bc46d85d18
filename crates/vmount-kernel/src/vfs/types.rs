//! Core VFS types.
//!
//! A mount target is either a host directory or a symbolic archive id
//! (`rom:`, `debug:`). Resolution produces [`RealPath`]s in the same two
//! flavours, wrapped in a [`ResolvedPath`] that also names the volume.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::path::PathComponents;

/// Volume name reported when resolution falls through to the data mount.
pub const DEFAULT_MOUNT_NAME: &str = "hdd";

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// Directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry type.
    pub kind: FileType,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, kind: FileType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FileType::File)
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, FileType::Directory)
    }
}

/// Where a mount's data actually lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RealRoot {
    /// A directory on the host filesystem.
    Host(PathBuf),
    /// An embedded read-only archive, by id (`"rom"` for `rom:`).
    Archive(String),
}

impl RealRoot {
    /// Parse a mount target string.
    ///
    /// `"rom:"` and other separator-free strings ending in `:` name archives;
    /// everything else is a host path.
    pub fn parse(target: &str) -> Self {
        match target.strip_suffix(':') {
            Some(id) if !id.is_empty() && !id.contains(['/', '\\', ':']) => {
                RealRoot::Archive(id.to_string())
            }
            _ => RealRoot::Host(PathBuf::from(target)),
        }
    }

    pub fn host(path: impl Into<PathBuf>) -> Self {
        RealRoot::Host(path.into())
    }

    pub fn archive(id: impl Into<String>) -> Self {
        RealRoot::Archive(id.into())
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, RealRoot::Archive(_))
    }

    /// The real location of `residual` below this root.
    pub fn locate(&self, residual: &PathComponents) -> RealPath {
        match self {
            RealRoot::Host(root) => {
                let mut path = root.clone();
                for segment in residual {
                    path.push(segment);
                }
                RealPath::Host(path)
            }
            RealRoot::Archive(id) => RealPath::Archive {
                archive: id.clone(),
                path: residual.clone(),
            },
        }
    }
}

impl fmt::Display for RealRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealRoot::Host(path) => write!(f, "{}", path.display()),
            RealRoot::Archive(id) => write!(f, "{id}:"),
        }
    }
}

/// A concrete location produced by resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RealPath {
    /// Host filesystem path.
    Host(PathBuf),
    /// Entry inside an archive, relative to the archive root.
    Archive {
        archive: String,
        path: PathComponents,
    },
}

impl RealPath {
    /// Host path, if this location is on the host filesystem.
    pub fn as_host(&self) -> Option<&Path> {
        match self {
            RealPath::Host(path) => Some(path),
            RealPath::Archive { .. } => None,
        }
    }

    pub fn is_archive(&self) -> bool {
        matches!(self, RealPath::Archive { .. })
    }
}

impl fmt::Display for RealPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RealPath::Host(path) => write!(f, "{}", path.display()),
            RealPath::Archive { archive, path } => {
                write!(f, "{archive}:")?;
                for segment in path {
                    write!(f, "/{segment}")?;
                }
                Ok(())
            }
        }
    }
}

/// Result of a successful resolution.
///
/// Always holds at least one location; only the resolver builds these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    locations: Vec<RealPath>,
    mount_name: String,
    is_mount_root: bool,
    is_default_mount: bool,
}

impl ResolvedPath {
    /// Wrap `locations`, or `None` if there are none.
    pub(crate) fn new(locations: Vec<RealPath>, mount_name: impl Into<String>) -> Option<Self> {
        if locations.is_empty() {
            return None;
        }
        Some(Self {
            locations,
            mount_name: mount_name.into(),
            is_mount_root: false,
            is_default_mount: false,
        })
    }

    pub(crate) fn with_mount_root(mut self, is_mount_root: bool) -> Self {
        self.is_mount_root = is_mount_root;
        self
    }

    pub(crate) fn with_default_mount(mut self, is_default_mount: bool) -> Self {
        self.is_default_mount = is_default_mount;
        self
    }

    /// The highest-priority location.
    pub fn first(&self) -> &RealPath {
        &self.locations[0]
    }

    /// Real locations in candidate priority order.
    pub fn locations(&self) -> &[RealPath] {
        &self.locations
    }

    pub fn into_locations(self) -> Vec<RealPath> {
        self.locations
    }

    /// Volume name: [`DEFAULT_MOUNT_NAME`] or the matched prefix joined by `/`.
    pub fn mount_name(&self) -> &str {
        &self.mount_name
    }

    /// True when the guest path is the mount point itself.
    pub fn is_mount_root(&self) -> bool {
        self.is_mount_root
    }

    /// All locations, newline-joined (the gather-all rendering).
    pub fn joined(&self) -> String {
        self.locations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns true if resolution fell through to the data mount.
    ///
    /// Tracked separately from the name: a user mount may be called `hdd` too.
    pub fn is_default_mount(&self) -> bool {
        self.is_default_mount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type() {
        assert!(FileType::File.is_file());
        assert!(!FileType::File.is_dir());
        assert!(FileType::Directory.is_dir());
    }

    #[test]
    fn test_dir_entry() {
        let file = DirEntry::file("test.txt");
        assert_eq!(file.name, "test.txt");
        assert!(file.kind.is_file());

        let dir = DirEntry::directory("subdir");
        assert!(dir.kind.is_dir());
    }

    #[test]
    fn test_parse_root() {
        assert_eq!(RealRoot::parse("rom:"), RealRoot::archive("rom"));
        assert_eq!(RealRoot::parse("debug:"), RealRoot::archive("debug"));
        assert_eq!(RealRoot::parse("/srv/disk"), RealRoot::host("/srv/disk"));
        assert_eq!(RealRoot::parse("/srv/odd:"), RealRoot::host("/srv/odd:"));
        assert_eq!(RealRoot::parse(":"), RealRoot::host(":"));
    }

    #[test]
    fn test_locate_and_display() {
        let residual = PathComponents::normalize("programs/ls.lua").unwrap();

        let host = RealRoot::host("/data").locate(&residual);
        assert_eq!(host.as_host(), Some(Path::new("/data/programs/ls.lua")));

        let rom = RealRoot::archive("rom").locate(&residual);
        assert_eq!(rom.to_string(), "rom:/programs/ls.lua");
        assert!(rom.as_host().is_none());

        let rom_root = RealRoot::archive("rom").locate(&PathComponents::root());
        assert_eq!(rom_root.to_string(), "rom:");
    }

    #[test]
    fn test_joined() {
        let resolved = ResolvedPath::new(
            vec![
                RealPath::Host(PathBuf::from("/a/x")),
                RealPath::Host(PathBuf::from("/b/x")),
            ],
            "disk",
        )
        .unwrap();
        assert_eq!(resolved.joined(), "/a/x\n/b/x");
        assert_eq!(resolved.first().to_string(), "/a/x");
        assert_eq!(resolved.locations().len(), 2);
        assert_eq!(resolved.mount_name(), "disk");
        assert!(!resolved.is_default_mount());
        assert!(!resolved.is_mount_root());
    }

    #[test]
    fn test_no_locations_is_not_a_resolution() {
        assert!(ResolvedPath::new(Vec::new(), DEFAULT_MOUNT_NAME).is_none());
    }
}
