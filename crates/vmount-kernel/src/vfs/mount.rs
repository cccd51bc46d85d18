//! Mount table with longest-prefix matching.
//!
//! A table always carries the data mount (empty prefix) plus any number of
//! user mounts. Mounts that share an identical prefix overlay each other:
//! every tied entry's targets are consulted, in registration order.

use tracing::debug;

use super::error::{VfsError, VfsResult};
use super::path::PathComponents;
use super::types::{DEFAULT_MOUNT_NAME, RealRoot};

/// A binding from a guest prefix to one or more real roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    /// Guest prefix. Empty only for the data mount.
    pub prefix: PathComponents,
    /// Real roots, in priority order.
    pub targets: Vec<RealRoot>,
    /// Whether writes below this prefix are refused.
    pub read_only: bool,
}

impl MountEntry {
    pub fn new(prefix: PathComponents, target: RealRoot, read_only: bool) -> Self {
        Self {
            prefix,
            targets: vec![target],
            read_only,
        }
    }
}

/// Information about a mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    /// Guest path of the mount point (`""` for the data mount).
    pub path: String,
    /// Real roots, rendered as strings.
    pub targets: Vec<String>,
    /// Whether this mount is read-only.
    pub read_only: bool,
}

/// The outcome of longest-prefix matching.
#[derive(Debug, Clone)]
pub struct MountMatch<'a> {
    /// Every entry whose prefix tied for the longest match, in table order.
    /// Holds only the data mount when nothing else matched.
    pub entries: Vec<&'a MountEntry>,
    /// Length of the matched prefix (0 for the data mount).
    pub prefix_len: usize,
}

impl<'a> MountMatch<'a> {
    /// Returns true if no user mount matched.
    pub fn is_default(&self) -> bool {
        self.prefix_len == 0
    }

    /// Targets of all tied entries, concatenated in table order.
    pub fn targets(&self) -> Vec<&'a RealRoot> {
        self.entries.iter().flat_map(|e| e.targets.iter()).collect()
    }

    /// Volume name for the match.
    pub fn name(&self) -> String {
        match self.entries.first() {
            Some(entry) if !self.is_default() => entry.prefix.to_string(),
            _ => DEFAULT_MOUNT_NAME.to_string(),
        }
    }

    /// Read-only flag of the first tied entry.
    pub fn read_only(&self) -> bool {
        self.entries.first().is_some_and(|e| e.read_only)
    }
}

/// Ordered mount entries for one computer.
#[derive(Debug, Clone)]
pub struct MountTable {
    /// The data mount (empty prefix).
    default: MountEntry,
    /// User mounts, in registration order.
    mounts: Vec<MountEntry>,
}

impl MountTable {
    /// Create a table holding only the data mount.
    pub fn new(data_root: RealRoot) -> Self {
        Self {
            default: MountEntry::new(PathComponents::root(), data_root, false),
            mounts: Vec::new(),
        }
    }

    /// Set the data mount's read-only flag.
    pub fn with_default_read_only(mut self, read_only: bool) -> Self {
        self.default.read_only = read_only;
        self
    }

    /// User mounts in registration order.
    pub fn entries(&self) -> &[MountEntry] {
        &self.mounts
    }

    /// Mount `target` at the guest path `path`.
    ///
    /// A second mount at an existing prefix overlays the first rather than
    /// replacing it.
    pub fn mount(&mut self, path: &str, target: RealRoot, read_only: bool) -> VfsResult<()> {
        let prefix = PathComponents::normalize(path)?;
        self.add(MountEntry::new(prefix, target, read_only))
    }

    /// Append a prebuilt entry.
    pub fn add(&mut self, entry: MountEntry) -> VfsResult<()> {
        if entry.prefix.is_empty() {
            return Err(VfsError::invalid_path("cannot mount over the guest root"));
        }
        if entry.targets.is_empty() {
            return Err(VfsError::invalid_path(format!(
                "mount {} has no targets",
                entry.prefix
            )));
        }
        debug!(prefix = %entry.prefix, targets = ?entry.targets, read_only = entry.read_only, "mount");
        self.mounts.push(entry);
        Ok(())
    }

    /// Remove every mount whose prefix is exactly `path`.
    ///
    /// Returns the number of entries removed.
    pub fn unmount(&mut self, path: &str) -> VfsResult<usize> {
        let prefix = PathComponents::normalize(path)?;
        let before = self.mounts.len();
        self.mounts.retain(|m| m.prefix != prefix);
        let removed = before - self.mounts.len();
        if removed == 0 {
            return Err(VfsError::no_mount_point(prefix.to_string()));
        }
        debug!(prefix = %prefix, removed, "unmount");
        Ok(removed)
    }

    /// List the data mount followed by all user mounts.
    pub fn list_mounts(&self) -> Vec<MountInfo> {
        std::iter::once(&self.default)
            .chain(self.mounts.iter())
            .map(|m| MountInfo {
                path: m.prefix.to_string(),
                targets: m.targets.iter().map(ToString::to_string).collect(),
                read_only: m.read_only,
            })
            .collect()
    }

    /// Find the mount(s) responsible for `path`.
    ///
    /// Keeps every entry whose prefix is a prefix of `path` and whose length
    /// is maximal. Falls back to the data mount when nothing matches.
    pub fn best_match(&self, path: &PathComponents) -> MountMatch<'_> {
        let mut best: Vec<&MountEntry> = Vec::new();
        let mut best_len = 0;

        for mount in &self.mounts {
            if !path.starts_with(&mount.prefix) {
                continue;
            }
            let len = mount.prefix.len();
            if len > best_len {
                best_len = len;
                best.clear();
                best.push(mount);
            } else if len == best_len {
                best.push(mount);
            }
        }

        if best.is_empty() {
            best.push(&self.default);
        }

        MountMatch {
            entries: best,
            prefix_len: best_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(p: &str) -> PathComponents {
        PathComponents::normalize(p).unwrap()
    }

    fn table() -> MountTable {
        MountTable::new(RealRoot::host("/data"))
    }

    #[test]
    fn test_unmatched_uses_default() {
        let t = table();
        let m = t.best_match(&path("programs/edit.lua"));
        assert!(m.is_default());
        assert_eq!(m.name(), "hdd");
        assert_eq!(m.targets(), vec![&RealRoot::host("/data")]);
    }

    #[test]
    fn test_longest_prefix_wins() {
        let mut t = table();
        t.mount("data", RealRoot::host("/outer"), false).unwrap();
        t.mount("data/sub", RealRoot::host("/inner"), false).unwrap();

        let m = t.best_match(&path("data/sub/file"));
        assert_eq!(m.prefix_len, 2);
        assert_eq!(m.targets(), vec![&RealRoot::host("/inner")]);
        assert_eq!(m.name(), "data/sub");

        let m = t.best_match(&path("data/other"));
        assert_eq!(m.targets(), vec![&RealRoot::host("/outer")]);
    }

    #[test]
    fn test_prefix_is_segment_based() {
        let mut t = table();
        t.mount("disk", RealRoot::host("/disk"), false).unwrap();

        assert!(t.best_match(&path("disk2/file")).is_default());
        assert!(!t.best_match(&path("disk")).is_default());
    }

    #[test]
    fn test_tie_fans_out_in_order() {
        let mut t = table();
        t.mount("rom", RealRoot::archive("rom"), true).unwrap();
        t.mount("other", RealRoot::host("/other"), false).unwrap();
        t.mount("/rom/", RealRoot::host("/extra-rom"), false).unwrap();

        let m = t.best_match(&path("rom/programs"));
        assert_eq!(m.entries.len(), 2);
        assert_eq!(
            m.targets(),
            vec![&RealRoot::archive("rom"), &RealRoot::host("/extra-rom")]
        );
        // First registered decides the flag.
        assert!(m.read_only());
    }

    #[test]
    fn test_root_mount_rejected() {
        let mut t = table();
        let result = t.mount("/", RealRoot::host("/x"), false);
        assert!(matches!(result, Err(VfsError::InvalidPath(_))));
        assert!(t.mount("a/..", RealRoot::host("/x"), false).is_err());
    }

    #[test]
    fn test_unmount() {
        let mut t = table();
        t.mount("disk", RealRoot::host("/a"), false).unwrap();
        t.mount("disk", RealRoot::host("/b"), false).unwrap();
        t.mount("net", RealRoot::host("/n"), false).unwrap();

        assert_eq!(t.unmount("/disk").unwrap(), 2);
        assert!(t.best_match(&path("disk/x")).is_default());
        assert!(matches!(t.unmount("disk"), Err(VfsError::NoMountPoint(_))));
        assert_eq!(t.entries().len(), 1);
    }

    #[test]
    fn test_list_mounts() {
        let mut t = table().with_default_read_only(true);
        t.mount("rom", RealRoot::archive("rom"), true).unwrap();

        let mounts = t.list_mounts();
        assert_eq!(mounts.len(), 2);
        assert_eq!(mounts[0].path, "");
        assert!(mounts[0].read_only);
        assert_eq!(mounts[1].path, "rom");
        assert_eq!(mounts[1].targets, vec!["rom:".to_string()]);
    }
}
