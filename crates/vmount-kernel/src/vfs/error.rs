//! VFS error types.

use std::io;
use thiserror::Error;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// The guest path is malformed or tries to climb above the guest root.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// No candidate mount, archive or host path matched.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write or create attempted under a read-only mount.
    #[error("read-only: {0}")]
    ReadOnly(String),

    /// Unmount of a prefix that has no mount entry.
    #[error("no mount point for path: {0}")]
    NoMountPoint(String),

    /// Host filesystem call failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl VfsError {
    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a ReadOnly error.
    pub fn read_only(path: impl Into<String>) -> Self {
        Self::ReadOnly(path.into())
    }

    /// Create a NoMountPoint error.
    pub fn no_mount_point(path: impl Into<String>) -> Self {
        Self::NoMountPoint(path.into())
    }

    /// Returns true for `NotFound`, the one kind callers usually recover from.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VfsError::NotFound(_))
    }
}

/// Convert VfsError to std::io::Error for compatibility.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        match e {
            VfsError::InvalidPath(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            VfsError::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::ReadOnly(msg) => io::Error::new(io::ErrorKind::PermissionDenied, msg),
            VfsError::NoMountPoint(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            VfsError::Io(e) => e,
        }
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_kind_mapping() {
        let e: io::Error = VfsError::read_only("rom/x").into();
        assert_eq!(e.kind(), io::ErrorKind::PermissionDenied);

        let e: io::Error = VfsError::not_found("a/b").into();
        assert_eq!(e.kind(), io::ErrorKind::NotFound);

        let e: io::Error = VfsError::invalid_path("..").into();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_io_passthrough() {
        let inner = io::Error::new(io::ErrorKind::StorageFull, "disk full");
        let e: io::Error = VfsError::from(inner).into();
        assert_eq!(e.kind(), io::ErrorKind::StorageFull);
    }
}
