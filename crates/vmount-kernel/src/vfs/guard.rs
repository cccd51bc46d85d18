//! Read-only lookup.

use super::mount::MountTable;
use super::path::PathComponents;

/// Whether `path` lies under a write-protected mount.
///
/// Uses the same longest-prefix rule as resolution. When tied mounts
/// disagree, the first registered one decides. Unmatched paths take the
/// data mount's flag.
pub fn is_read_only(table: &MountTable, path: &PathComponents) -> bool {
    table.best_match(path).read_only()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::types::RealRoot;

    fn path(p: &str) -> PathComponents {
        PathComponents::normalize(p).unwrap()
    }

    #[test]
    fn test_default_writable() {
        let t = MountTable::new(RealRoot::host("/data"));
        assert!(!is_read_only(&t, &path("")));
        assert!(!is_read_only(&t, &path("startup.lua")));
    }

    #[test]
    fn test_default_read_only() {
        let t = MountTable::new(RealRoot::host("/data")).with_default_read_only(true);
        assert!(is_read_only(&t, &path("startup.lua")));
    }

    #[test]
    fn test_nested_mount_overrides() {
        let mut t = MountTable::new(RealRoot::host("/data"));
        t.mount("rom", RealRoot::archive("rom"), true).unwrap();
        t.mount("rom/scratch", RealRoot::host("/scratch"), false).unwrap();

        assert!(is_read_only(&t, &path("rom")));
        assert!(is_read_only(&t, &path("rom/programs/ls.lua")));
        assert!(!is_read_only(&t, &path("rom/scratch/notes")));
        assert!(!is_read_only(&t, &path("romance")));
    }

    #[test]
    fn test_tie_first_registered_wins() {
        let mut t = MountTable::new(RealRoot::host("/data"));
        t.mount("disk", RealRoot::host("/a"), false).unwrap();
        t.mount("disk", RealRoot::host("/b"), true).unwrap();
        assert!(!is_read_only(&t, &path("disk/file")));

        let mut t = MountTable::new(RealRoot::host("/data"));
        t.mount("disk", RealRoot::host("/b"), true).unwrap();
        t.mount("disk", RealRoot::host("/a"), false).unwrap();
        assert!(is_read_only(&t, &path("disk/file")));
    }
}
