//! Mount points as directory entries.

use std::collections::BTreeSet;

use super::mount::MountTable;
use super::path::PathComponents;

/// Names of mount points sitting directly under `dir`.
///
/// A mount at `net/drive` shows up as `drive` when listing `net`, and not at
/// all when listing the root.
pub fn list_mount_children(table: &MountTable, dir: &PathComponents) -> BTreeSet<String> {
    table
        .entries()
        .iter()
        .filter(|m| m.prefix.len() == dir.len() + 1 && m.prefix.starts_with(dir))
        .filter_map(|m| m.prefix.last().map(str::to_string))
        .collect()
}
