//! Computer configuration, loaded from RON.
//!
//! ```ron
//! (
//!     id: 3,
//!     debug: true,
//!     rom: Some("~/vmount/rom"),
//!     mounts: [
//!         (path: "disk", target: "/srv/floppy"),
//!         (path: "rom", target: "$HOME/rom-extras", read_only: true),
//!     ],
//! )
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vfs::VfsError;

/// A user mount from the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountSpec {
    /// Guest mount point.
    pub path: String,
    /// Host directory, or an archive id such as `"rom:"`.
    pub target: String,
    #[serde(default)]
    pub read_only: bool,
}

/// Everything needed to build a [`Computer`](crate::Computer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputerConfig {
    pub id: u32,
    /// Host directory backing the guest root. Defaults per id under the
    /// platform data directory.
    pub data_dir: Option<String>,
    /// Debug mode: boot-file bypass and the `debug` mount.
    pub debug: bool,
    pub boot_file: String,
    /// Host directory snapshotted into the `rom` archive.
    pub rom: Option<String>,
    /// Host directory snapshotted into the `debug` archive.
    pub debug_rom: Option<String>,
    pub data_read_only: bool,
    pub mounts: Vec<MountSpec>,
}

impl Default for ComputerConfig {
    fn default() -> Self {
        Self {
            id: 0,
            data_dir: None,
            debug: false,
            boot_file: "bios.lua".to_string(),
            rom: None,
            debug_rom: None,
            data_read_only: false,
            mounts: Vec::new(),
        }
    }
}

impl ComputerConfig {
    /// Parse RON text.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Read and parse a RON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_ron(&text)
    }

    /// The host data directory, expanded.
    pub fn data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => expand_path(dir),
            None => default_data_dir(self.id),
        }
    }
}

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse RON: {0}")]
    Ron(#[from] ron::error::SpannedError),

    #[error(transparent)]
    Vfs(#[from] VfsError),

    #[error("cannot expand {0}")]
    Expand(String),

    #[error("no platform data directory; set data_dir explicitly")]
    NoDataDir,
}

/// Expand `~` and `$VARS` in a host path.
pub fn expand_path(path: &str) -> Result<PathBuf, ConfigError> {
    let expanded =
        shellexpand::full(path).map_err(|e| ConfigError::Expand(format!("{path}: {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// `<data dir>/vmount/computer/<id>`.
pub fn default_data_dir(id: u32) -> Result<PathBuf, ConfigError> {
    let base = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    Ok(base.join("vmount").join("computer").join(id.to_string()))
}

/// `<config dir>/vmount/computer.ron`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vmount").join("computer.ron"))
}
