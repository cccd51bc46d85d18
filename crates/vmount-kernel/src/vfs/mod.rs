//! Overlay mount resolution.
//!
//! This module maps guest paths onto real locations. Key components:
//!
//! - [`PathComponents`] - Normalized guest paths (`.`/`..` resolved, no escapes)
//! - [`MountTable`] - Ordered mounts with longest-prefix matching and overlay fan-out
//! - [`Resolver`] - Turns a guest path into one or more [`RealPath`]s
//! - [`is_read_only`] - Write protection by longest-prefix lookup
//! - [`ensure_directory_for`] / [`make_directory`] - Create missing host directories
//! - [`list_mount_children`] - Mount points shown as directory entries
//!
//! ## Design Decisions
//!
//! - **Segments, not strings**: prefixes are compared segment by segment, so
//!   `disk` never matches `disk2/file`.
//! - **Overlays are ties**: mounts sharing a prefix are all consulted in
//!   registration order rather than replacing each other.
//! - **Archives are probed, not thrown at**: an archive miss is `None`, and the
//!   resolver simply moves on to the next candidate.
//! - **Host access is a trait**: [`HostFs`] keeps the engine testable with an
//!   in-memory spy ([`MemoryHost`]).

mod archive;
mod enumerate;
mod error;
mod guard;
mod host;
mod materialize;
mod mount;
mod path;
mod resolve;
mod types;

pub use archive::{Archive, ArchiveEntry, ArchiveSet, MemoryArchive};
pub use enumerate::list_mount_children;
pub use error::{VfsError, VfsResult};
pub use guard::is_read_only;
pub use host::{HostFs, LocalHost, MemoryHost};
pub use materialize::{ensure_directory_for, make_directory};
pub use mount::{MountEntry, MountInfo, MountMatch, MountTable};
pub use path::PathComponents;
pub use resolve::{BOOT_MOUNT_NAME, BootFile, ResolveMode, Resolver};
pub use types::{DEFAULT_MOUNT_NAME, DirEntry, FileType, RealPath, RealRoot, ResolvedPath};
