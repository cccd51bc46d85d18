//! Guest path normalization.
//!
//! Guest paths are `/`-separated and case-sensitive. `.` and empty segments
//! vanish, `..` pops the previous segment, and popping past the guest root
//! is an error rather than a silent clamp.

use std::fmt;
use std::slice;

use super::error::{VfsError, VfsResult};

/// An ordered list of non-empty guest path segments.
///
/// Never contains `""`, `"."` or `".."`; the empty list is the guest root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathComponents {
    segments: Vec<String>,
}

impl PathComponents {
    /// The guest root (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Normalize a guest path using `/` as the separator.
    pub fn normalize(path: &str) -> VfsResult<Self> {
        Self::normalize_with(path, '/')
    }

    /// Normalize a destination path for directory creation.
    ///
    /// Splits on `/` when the string contains one, otherwise on `\`.
    pub fn normalize_destination(path: &str) -> VfsResult<Self> {
        let sep = if path.contains('/') { '/' } else { '\\' };
        Self::normalize_with(path, sep)
    }

    fn normalize_with(path: &str, sep: char) -> VfsResult<Self> {
        let mut segments: Vec<String> = Vec::new();
        for token in path.split(sep) {
            match token {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(VfsError::invalid_path(path));
                    }
                }
                s => segments.push(s.to_string()),
            }
        }
        Ok(Self { segments })
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for the guest root.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, String> {
        self.segments.iter()
    }

    /// Final segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns true if `prefix` matches the leading segments exactly.
    pub fn starts_with(&self, prefix: &PathComponents) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Drop the first `n` segments, yielding the residual below a mount prefix.
    pub fn skip(&self, n: usize) -> Self {
        Self {
            segments: self.segments.iter().skip(n).cloned().collect(),
        }
    }

    /// Split into (everything but the last segment, last segment).
    pub fn split_last(&self) -> Option<(Self, &str)> {
        let (last, rest) = self.segments.split_last()?;
        Some((
            Self {
                segments: rest.to_vec(),
            },
            last.as_str(),
        ))
    }

    /// A new path with `segment` appended.
    ///
    /// `segment` must come from another normalized path; it is not re-validated.
    pub fn join(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }
}

impl fmt::Display for PathComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl<'a> IntoIterator for &'a PathComponents {
    type Item = &'a String;
    type IntoIter = slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
