//! Per-computer filesystem context.
//!
//! A [`Computer`] owns exactly one mount table. Resolution takes a read lock
//! on it and mount/unmount take the write lock, so mounting from another
//! task never exposes a half-updated table.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::config::{ComputerConfig, ConfigError, expand_path};
use crate::vfs::{
    self, ArchiveSet, BootFile, DirEntry, HostFs, LocalHost, MemoryArchive, MountInfo,
    MountTable, PathComponents, RealPath, RealRoot, ResolveMode, ResolvedPath, Resolver,
    VfsError, VfsResult,
};

/// One emulated computer's view of its filesystem.
pub struct Computer {
    id: u32,
    table: RwLock<MountTable>,
    host: Arc<dyn HostFs>,
    archives: Arc<ArchiveSet>,
    debug: bool,
    boot: BootFile,
}

impl std::fmt::Debug for Computer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computer")
            .field("id", &self.id)
            .field("table", &"<locked>")
            .field("debug", &self.debug)
            .finish()
    }
}

impl Computer {
    /// Create a computer over `table`, backed by the real filesystem.
    pub fn new(id: u32, table: MountTable) -> Self {
        Self {
            id,
            table: RwLock::new(table),
            host: Arc::new(LocalHost),
            archives: Arc::new(ArchiveSet::new()),
            debug: false,
            boot: BootFile::default(),
        }
    }

    /// Use a different host filesystem.
    pub fn with_host(mut self, host: Arc<dyn HostFs>) -> Self {
        self.host = host;
        self
    }

    /// Share a set of loaded archives.
    pub fn with_archives(mut self, archives: Arc<ArchiveSet>) -> Self {
        self.archives = archives;
        self
    }

    /// Enable debug mode (boot-file bypass).
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_boot_file(mut self, boot: BootFile) -> Self {
        self.boot = boot;
        self
    }

    /// Build a computer from configuration.
    ///
    /// Creates the data directory if needed, snapshots the ROM directories
    /// into archives, and registers the standard and user mounts.
    pub async fn from_config(config: &ComputerConfig) -> Result<Self, ConfigError> {
        let data_dir = config.data_dir()?;
        tokio::fs::create_dir_all(&data_dir).await?;
        let data_dir = dunce::canonicalize(&data_dir)?;

        let mut archives = ArchiveSet::new();
        let mut table = MountTable::new(RealRoot::Host(data_dir.clone()))
            .with_default_read_only(config.data_read_only);

        if let Some(rom) = &config.rom {
            let archive = MemoryArchive::load_dir(expand_path(rom)?).await?;
            archives = archives.with("rom", archive);
            table.mount("rom", RealRoot::archive("rom"), true)?;
        }
        if config.debug {
            if let Some(debug_rom) = &config.debug_rom {
                let archive = MemoryArchive::load_dir(expand_path(debug_rom)?).await?;
                archives = archives.with("debug", archive);
                table.mount("debug", RealRoot::archive("debug"), true)?;
            }
        }
        for spec in &config.mounts {
            let target = match RealRoot::parse(&spec.target) {
                RealRoot::Host(_) => RealRoot::Host(expand_path(&spec.target)?),
                archive => archive,
            };
            table.mount(&spec.path, target, spec.read_only)?;
        }

        info!(
            id = config.id,
            data_dir = %data_dir.display(),
            mounts = table.entries().len(),
            debug = config.debug,
            "computer ready"
        );

        Ok(Self::new(config.id, table)
            .with_archives(Arc::new(archives))
            .with_debug(config.debug)
            .with_boot_file(BootFile::in_archive(config.boot_file.clone(), "rom")))
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    fn resolver<'a>(&'a self, table: &'a MountTable) -> Resolver<'a> {
        let resolver = Resolver::new(table, self.host.as_ref(), &self.archives);
        if self.debug {
            resolver.with_boot_file(&self.boot)
        } else {
            resolver
        }
    }

    /// Normalize a guest path to its canonical `a/b/c` form.
    pub fn canonical(path: &str) -> VfsResult<String> {
        Ok(PathComponents::normalize(path)?.to_string())
    }

    // ========================================================================
    // Mount table
    // ========================================================================

    /// Mount `target` at `path`. Stacks on top of any existing mount there.
    pub async fn mount(&self, path: &str, target: RealRoot, read_only: bool) -> VfsResult<()> {
        let mut table = self.table.write().await;
        table.mount(path, target, read_only)
    }

    /// Remove all mounts at exactly `path`.
    pub async fn unmount(&self, path: &str) -> VfsResult<usize> {
        let mut table = self.table.write().await;
        table.unmount(path)
    }

    pub async fn list_mounts(&self) -> Vec<MountInfo> {
        self.table.read().await.list_mounts()
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    pub async fn resolve(&self, path: &str, mode: ResolveMode) -> VfsResult<ResolvedPath> {
        let table = self.table.read().await;
        self.resolver(&table).resolve_str(path, mode).await
    }

    pub async fn is_read_only(&self, path: &str) -> VfsResult<bool> {
        let components = PathComponents::normalize(path)?;
        let table = self.table.read().await;
        Ok(vfs::is_read_only(&table, &components))
    }

    /// Volume name of an existing path.
    pub async fn drive(&self, path: &str) -> VfsResult<String> {
        Ok(self
            .resolve(path, ResolveMode::Exists)
            .await?
            .mount_name()
            .to_string())
    }

    pub async fn exists(&self, path: &str) -> VfsResult<bool> {
        match self.resolve(path, ResolveMode::Exists).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn is_dir(&self, path: &str) -> VfsResult<bool> {
        let resolved = match self.resolve(path, ResolveMode::Exists).await {
            Ok(resolved) => resolved,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };
        if resolved.is_mount_root() && !resolved.is_default_mount() {
            return Ok(true);
        }
        Ok(self.location_is_dir(resolved.first()).await)
    }

    async fn location_is_dir(&self, location: &RealPath) -> bool {
        match location {
            RealPath::Host(path) => self.host.is_dir(path).await,
            RealPath::Archive { archive, path } => self
                .archives
                .lookup(archive, path)
                .is_some_and(|e| e.is_dir()),
        }
    }

    // ========================================================================
    // Directories
    // ========================================================================

    pub async fn ensure_directory_for(&self, path: &str, create: bool) -> VfsResult<RealPath> {
        let table = self.table.read().await;
        vfs::ensure_directory_for(&self.resolver(&table), path, create).await
    }

    pub async fn make_directory(&self, path: &str) -> VfsResult<RealPath> {
        let table = self.table.read().await;
        vfs::make_directory(&self.resolver(&table), path).await
    }

    /// List a guest directory.
    ///
    /// Merges the entries of every overlaid location (first location wins on
    /// name clashes) with the mount points directly below `path`. Sorted by
    /// name.
    pub async fn list(&self, path: &str) -> VfsResult<Vec<DirEntry>> {
        let components = PathComponents::normalize(path)?;
        let table = self.table.read().await;
        let resolver = self.resolver(&table);

        let matched = table.best_match(&components);
        let locations: Vec<RealPath> = if components.len() == matched.prefix_len {
            let root = PathComponents::root();
            matched.targets().iter().map(|t| t.locate(&root)).collect()
        } else {
            match resolver.resolve(&components, ResolveMode::GatherAll).await {
                Ok(resolved) => resolved.into_locations(),
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => return Err(e),
            }
        };

        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        let mut listed_any = false;
        for location in &locations {
            let listing = match location {
                RealPath::Host(dir) => self.host.read_dir(dir).await.ok(),
                RealPath::Archive { archive, path } => self.archives.list(archive, path),
            };
            let Some(listing) = listing else { continue };
            listed_any = true;
            for entry in listing {
                if seen.insert(entry.name.clone()) {
                    entries.push(entry);
                }
            }
        }

        let children = vfs::list_mount_children(&table, &components);
        if !listed_any && children.is_empty() {
            return Err(VfsError::not_found(components.to_string()));
        }
        for name in children {
            if seen.insert(name.clone()) {
                entries.push(DirEntry::directory(name));
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
