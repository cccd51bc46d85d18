//! On-demand creation of host directories for guest paths.
//!
//! To make room for a new file at `a/b/c/file`, the materializer walks back
//! from `a/b/c` until some ancestor resolves, then creates the missing
//! levels below it one at a time, outermost first.

use std::collections::VecDeque;
use std::io;
use std::path::Path;

use tracing::debug;

use super::error::{VfsError, VfsResult};
use super::guard::is_read_only;
use super::host::HostFs;
use super::path::PathComponents;
use super::resolve::{ResolveMode, Resolver};
use super::types::RealPath;

/// Make sure the directory that would hold `path` exists.
///
/// With `create`, missing directories are created and the real location of
/// `path` itself is returned. Without it nothing is touched and the nearest
/// resolvable ancestor is returned instead.
///
/// Fails with `ReadOnly` before any mutation when `create` is set and `path`
/// lies under a read-only mount.
pub async fn ensure_directory_for(
    resolver: &Resolver<'_>,
    path: &str,
    create: bool,
) -> VfsResult<RealPath> {
    let components = PathComponents::normalize_destination(path)?;
    if create && is_read_only(resolver.table(), &components) {
        return Err(VfsError::read_only(components.to_string()));
    }

    let Some((mut ancestor, _leaf)) = components.split_last() else {
        let root = resolver.resolve(&components, ResolveMode::Raw).await?;
        return Ok(root.first().clone());
    };

    let mut pending: VecDeque<String> = VecDeque::new();
    let base = loop {
        match resolver.resolve(&ancestor, ResolveMode::Create).await {
            Ok(resolved) => break resolved.first().clone(),
            Err(VfsError::NotFound(_)) => {
                let Some((shorter, last)) = ancestor.split_last() else {
                    return Err(VfsError::not_found(components.to_string()));
                };
                pending.push_front(last.to_string());
                if shorter.is_empty() {
                    return Err(VfsError::not_found(components.to_string()));
                }
                ancestor = shorter;
            }
            Err(e) => return Err(e),
        }
    };

    if !create {
        return Ok(base);
    }

    let RealPath::Host(base_dir) = &base else {
        return Err(VfsError::read_only(components.to_string()));
    };
    let mut target = base_dir.clone();
    target.extend(pending.iter());
    debug!(path = %components, base = %base_dir.display(), pending = pending.len(), "materialize");
    create_dir_all(resolver.host(), &target).await?;

    let resolved = resolver.resolve(&components, ResolveMode::Create).await?;
    Ok(resolved.first().clone())
}

/// Create the directory `path`, including any missing ancestors.
///
/// Succeeds without changes if it already exists as a directory.
pub async fn make_directory(resolver: &Resolver<'_>, path: &str) -> VfsResult<RealPath> {
    let location = ensure_directory_for(resolver, path, true).await?;
    let RealPath::Host(dir) = &location else {
        return Err(VfsError::read_only(path.to_string()));
    };

    let host = resolver.host();
    if host.exists(dir).await && !host.is_dir(dir).await {
        return Err(VfsError::Io(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a directory", dir.display()),
        )));
    }
    create_dir_all(host, dir).await?;
    Ok(location)
}

/// Create `target` and any missing ancestors, outermost first.
///
/// "Already exists" is tolerated; any other failure aborts.
async fn create_dir_all(host: &dyn HostFs, target: &Path) -> VfsResult<()> {
    let mut missing = Vec::new();
    let mut current = Some(target);
    while let Some(dir) = current {
        if dir.as_os_str().is_empty() || host.is_dir(dir).await {
            break;
        }
        missing.push(dir);
        current = dir.parent();
    }

    for dir in missing.into_iter().rev() {
        match host.create_dir(dir).await {
            Ok(()) => debug!(dir = %dir.display(), "created directory"),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(VfsError::Io(e)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::archive::{ArchiveSet, MemoryArchive};
    use crate::vfs::host::MemoryHost;
    use crate::vfs::mount::MountTable;
    use crate::vfs::types::RealRoot;
    use std::path::PathBuf;

    fn data_table() -> MountTable {
        MountTable::new(RealRoot::host("/data"))
    }

    fn host_path(loc: &RealPath) -> PathBuf {
        loc.as_host().expect("host location").to_path_buf()
    }

    #[tokio::test]
    async fn test_read_only_mount_mutates_nothing() {
        let host = MemoryHost::new().with_dir("/data").with_dir("/ro");
        let archives = ArchiveSet::new();
        let mut table = data_table();
        table.mount("disk", RealRoot::host("/ro"), true).unwrap();
        let resolver = Resolver::new(&table, &host, &archives);

        let result = ensure_directory_for(&resolver, "disk/a/b/file", true).await;
        assert!(matches!(result, Err(VfsError::ReadOnly(_))));
        let result = make_directory(&resolver, "disk/a").await;
        assert!(matches!(result, Err(VfsError::ReadOnly(_))));

        assert!(host.created().is_empty());
    }

    #[tokio::test]
    async fn test_read_only_default_mount() {
        let host = MemoryHost::new().with_dir("/data");
        let archives = ArchiveSet::new();
        let table = data_table().with_default_read_only(true);
        let resolver = Resolver::new(&table, &host, &archives);

        let result = make_directory(&resolver, "a/b").await;
        assert!(matches!(result, Err(VfsError::ReadOnly(_))));
        assert!(host.created().is_empty());
    }

    #[tokio::test]
    async fn test_make_directory_creates_levels_in_order() {
        let host = MemoryHost::new().with_dir("/data/a");
        let archives = ArchiveSet::new();
        let table = data_table();
        let resolver = Resolver::new(&table, &host, &archives);

        let location = make_directory(&resolver, "a/b/c").await.unwrap();
        assert_eq!(host_path(&location), PathBuf::from("/data/a/b/c"));
        assert_eq!(
            host.created(),
            vec![PathBuf::from("/data/a/b"), PathBuf::from("/data/a/b/c")]
        );

        let resolved = resolver.resolve_str("a/b/c", ResolveMode::Exists).await.unwrap();
        assert_eq!(host_path(resolved.first()), PathBuf::from("/data/a/b/c"));
    }

    #[tokio::test]
    async fn test_ensure_parent_for_new_file() {
        let host = MemoryHost::new().with_dir("/data/a");
        let archives = ArchiveSet::new();
        let table = data_table();
        let resolver = Resolver::new(&table, &host, &archives);

        let location = ensure_directory_for(&resolver, "a/b/c/file.txt", true)
            .await
            .unwrap();
        assert_eq!(host_path(&location), PathBuf::from("/data/a/b/c/file.txt"));
        assert_eq!(
            host.created(),
            vec![PathBuf::from("/data/a/b"), PathBuf::from("/data/a/b/c")]
        );
    }

    #[tokio::test]
    async fn test_existing_parent_creates_nothing() {
        let host = MemoryHost::new().with_dir("/data/a");
        let archives = ArchiveSet::new();
        let table = data_table();
        let resolver = Resolver::new(&table, &host, &archives);

        let location = ensure_directory_for(&resolver, "a/new.txt", true).await.unwrap();
        assert_eq!(host_path(&location), PathBuf::from("/data/a/new.txt"));

        let location = ensure_directory_for(&resolver, "top.txt", true).await.unwrap();
        assert_eq!(host_path(&location), PathBuf::from("/data/top.txt"));

        let root = ensure_directory_for(&resolver, "/", true).await.unwrap();
        assert_eq!(host_path(&root), PathBuf::from("/data"));

        make_directory(&resolver, "a").await.unwrap();
        assert!(host.created().is_empty());
    }

    #[tokio::test]
    async fn test_without_create_returns_ancestor() {
        let host = MemoryHost::new().with_dir("/data/a");
        let archives = ArchiveSet::new();
        let table = data_table();
        let resolver = Resolver::new(&table, &host, &archives);

        let location = ensure_directory_for(&resolver, "a/b/c/d/file", false)
            .await
            .unwrap();
        assert_eq!(host_path(&location), PathBuf::from("/data/a/b"));
        assert!(host.created().is_empty());
    }

    #[tokio::test]
    async fn test_under_user_mount_with_backslashes() {
        let host = MemoryHost::new().with_dir("/data").with_dir("/disk");
        let archives = ArchiveSet::new();
        let mut table = data_table();
        table.mount("disk", RealRoot::host("/disk"), false).unwrap();
        let resolver = Resolver::new(&table, &host, &archives);

        let location = ensure_directory_for(&resolver, "disk\\x\\y\\f.txt", true)
            .await
            .unwrap();
        assert_eq!(host_path(&location), PathBuf::from("/disk/x/y/f.txt"));
        assert_eq!(
            host.created(),
            vec![PathBuf::from("/disk/x"), PathBuf::from("/disk/x/y")]
        );
    }

    #[tokio::test]
    async fn test_missing_data_root_is_not_found() {
        let host = MemoryHost::new();
        let archives = ArchiveSet::new();
        let table = data_table();
        let resolver = Resolver::new(&table, &host, &archives);

        let result = ensure_directory_for(&resolver, "a/b/f", true).await;
        assert!(matches!(result, Err(VfsError::NotFound(_))));
        assert!(host.created().is_empty());
    }

    #[tokio::test]
    async fn test_file_in_the_way_is_io_error() {
        let host = MemoryHost::new().with_file("/data/a", b"not a dir".to_vec());
        let archives = ArchiveSet::new();
        let table = data_table();
        let resolver = Resolver::new(&table, &host, &archives);

        let result = ensure_directory_for(&resolver, "a/b/f", true).await;
        assert!(matches!(result, Err(VfsError::Io(_))));

        let result = make_directory(&resolver, "a").await;
        assert!(matches!(result, Err(VfsError::Io(_))));
    }

    #[tokio::test]
    async fn test_archive_base_is_read_only() {
        let host = MemoryHost::new().with_dir("/data");
        let mut rom = MemoryArchive::new();
        rom.insert_dir("programs").unwrap();
        let archives = ArchiveSet::new().with("rom", rom);
        let mut table = data_table();
        // Writable flag on purpose: the archive itself still refuses.
        table.mount("rom", RealRoot::archive("rom"), false).unwrap();
        let resolver = Resolver::new(&table, &host, &archives);

        let result = ensure_directory_for(&resolver, "rom/programs/new/x.lua", true).await;
        assert!(matches!(result, Err(VfsError::ReadOnly(_))));
        assert!(host.created().is_empty());
    }

    #[tokio::test]
    async fn test_escape_is_invalid() {
        let host = MemoryHost::new().with_dir("/data");
        let archives = ArchiveSet::new();
        let table = data_table();
        let resolver = Resolver::new(&table, &host, &archives);

        let result = ensure_directory_for(&resolver, "a/../../x", true).await;
        assert!(matches!(result, Err(VfsError::InvalidPath(_))));
    }
}
