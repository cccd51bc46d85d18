//! Guest path → real location resolution.
//!
//! Resolution picks the longest matching mount prefix (fanning out over
//! tied mounts), strips it, and probes each candidate root for the residual
//! path. Archive roots are asked first-class; host roots go through
//! [`HostFs`].

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::trace;

use super::archive::ArchiveSet;
use super::error::{VfsError, VfsResult};
use super::host::HostFs;
use super::mount::MountTable;
use super::path::PathComponents;
use super::types::{RealPath, RealRoot, ResolvedPath};

/// Volume name reported for the boot-file bypass.
pub const BOOT_MOUNT_NAME: &str = "rom";

/// How much existence checking a resolution performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResolveMode {
    /// The full path must exist on some candidate; first hit wins.
    Exists,
    /// The leaf may be missing as long as its parent directory exists.
    Create,
    /// No probing; first candidate root plus the residual.
    Raw,
    /// Like `Exists`, but every candidate that has the path is returned.
    GatherAll,
}

/// The file that debug-mode computers always boot from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootFile {
    /// Guest name at the root (`"bios.lua"`).
    pub name: String,
    /// Where it really lives.
    pub location: RealPath,
}

impl BootFile {
    /// A boot file at the root of archive `archive`.
    pub fn in_archive(name: impl Into<String>, archive: impl Into<String>) -> Self {
        let name = name.into();
        let location = RealRoot::Archive(archive.into()).locate(&PathComponents::root().join(&name));
        Self { name, location }
    }
}

impl Default for BootFile {
    fn default() -> Self {
        Self::in_archive("bios.lua", "rom")
    }
}

/// Resolves guest paths against one computer's mount table.
///
/// Borrowed view; build one per call site from the owning context.
pub struct Resolver<'a> {
    table: &'a MountTable,
    host: &'a dyn HostFs,
    archives: &'a ArchiveSet,
    boot: Option<&'a BootFile>,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a MountTable, host: &'a dyn HostFs, archives: &'a ArchiveSet) -> Self {
        Self {
            table,
            host,
            archives,
            boot: None,
        }
    }

    /// Enable the debug-mode boot bypass.
    pub fn with_boot_file(mut self, boot: &'a BootFile) -> Self {
        self.boot = Some(boot);
        self
    }

    pub fn table(&self) -> &'a MountTable {
        self.table
    }

    pub fn host(&self) -> &'a dyn HostFs {
        self.host
    }

    /// Normalize `path` and resolve it.
    pub async fn resolve_str(&self, path: &str, mode: ResolveMode) -> VfsResult<ResolvedPath> {
        let components = PathComponents::normalize(path)?;
        self.resolve(&components, mode).await
    }

    /// Resolve a normalized guest path.
    pub async fn resolve(
        &self,
        path: &PathComponents,
        mode: ResolveMode,
    ) -> VfsResult<ResolvedPath> {
        if let Some(boot) = self.boot {
            if path.len() == 1 && path.last() == Some(boot.name.as_str()) {
                return ResolvedPath::new(vec![boot.location.clone()], BOOT_MOUNT_NAME)
                    .ok_or_else(|| VfsError::not_found(path.to_string()));
            }
        }

        let matched = self.table.best_match(path);
        let residual = path.skip(matched.prefix_len);
        let targets = matched.targets();

        let mut found = Vec::new();
        if residual.is_empty() || mode == ResolveMode::Raw {
            found.extend(targets.first().map(|root| root.locate(&residual)));
        } else {
            let gather = mode == ResolveMode::GatherAll;
            for root in targets {
                let hit = match mode {
                    ResolveMode::Create => self.probe_create(root, &residual).await,
                    _ => self.probe_exists(root, &residual).await,
                };
                trace!(root = %root, residual = %residual, ?mode, hit, "probe");
                if hit {
                    found.push(root.locate(&residual));
                    if !gather {
                        break;
                    }
                }
            }
        }

        let resolved = ResolvedPath::new(found, matched.name())
            .ok_or_else(|| VfsError::not_found(path.to_string()))?;
        Ok(resolved
            .with_mount_root(residual.is_empty())
            .with_default_mount(matched.is_default()))
    }

    async fn probe_exists(&self, root: &RealRoot, residual: &PathComponents) -> bool {
        match root {
            RealRoot::Archive(id) => self.archives.lookup(id, residual).is_some(),
            RealRoot::Host(_) => match root.locate(residual) {
                RealPath::Host(full) => self.host.exists(&full).await,
                RealPath::Archive { .. } => false,
            },
        }
    }

    /// The leaf exists, or its parent is a directory it could be created in.
    async fn probe_create(&self, root: &RealRoot, residual: &PathComponents) -> bool {
        let Some((parent, _)) = residual.split_last() else {
            return true;
        };
        match root {
            RealRoot::Archive(id) => {
                self.archives.lookup(id, residual).is_some()
                    || self
                        .archives
                        .lookup(id, &parent)
                        .is_some_and(|e| e.is_dir())
            }
            RealRoot::Host(_) => {
                let (RealPath::Host(full), RealPath::Host(dir)) =
                    (root.locate(residual), root.locate(&parent))
                else {
                    return false;
                };
                self.host.exists(&full).await || self.host.is_dir(&dir).await
            }
        }
    }
}
