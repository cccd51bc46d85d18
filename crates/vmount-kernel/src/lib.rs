//! # vmount-kernel
//!
//! Guest filesystem plumbing for emulated computers.
//!
//! Every computer sees a single guest tree. Underneath, that tree is an
//! overlay of mounts:
//! - the persistent data directory at the root (volume `hdd`)
//! - a read-only `rom` archive, and a `debug` archive in debug mode
//! - any number of user mounts, possibly stacked on the same prefix
//!
//! [`Computer`] owns one mount table and answers path questions against it;
//! the [`vfs`] module holds the resolution engine itself.

pub mod computer;
pub mod config;
pub mod vfs;

pub use computer::Computer;
pub use config::{ComputerConfig, ConfigError, MountSpec};
pub use vfs::{
    ArchiveSet, BootFile, DirEntry, FileType, HostFs, LocalHost, MemoryArchive, MemoryHost,
    MountInfo, MountTable, PathComponents, RealPath, RealRoot, ResolveMode, ResolvedPath,
    VfsError, VfsResult,
};
