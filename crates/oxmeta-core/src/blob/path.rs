//! Type-safe paths inside a blob store.
//!
//! A [`BlobPath`] is the logical location of a node in a [`BlobStore`](super::BlobStore),
//! independent of where a backend physically keeps it.

use relative_path::{Component, RelativePath, RelativePathBuf};
use std::fmt;

/// Path of a node inside a blob store.
///
/// Blob paths use `/` as the separator regardless of the host OS. Leading
/// slashes are stripped and `.` components are normalized away, so
/// `"/meta-data/42"` and `"meta-data/./42"` are the same path.
///
/// # Examples
///
/// ```
/// use oxmeta_core::blob::BlobPath;
///
/// let dir = BlobPath::new("/meta-data/42");
/// assert_eq!(dir.file_name(), Some("42"));
/// assert_eq!(dir.to_string(), "/meta-data/42");
///
/// let file = dir.join("meta.data");
/// assert_eq!(file.as_str(), "meta-data/42/meta.data");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobPath(RelativePathBuf);

impl BlobPath {
    /// The root of the store.
    #[inline]
    pub fn root() -> Self {
        BlobPath(RelativePathBuf::new())
    }

    /// Create a blob path from a string.
    pub fn new(path: impl AsRef<str>) -> Self {
        let s = path.as_ref().trim_start_matches('/');
        let mut normalized = RelativePathBuf::new();
        for component in RelativePath::new(s).components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => normalized.push(".."),
                Component::Normal(name) => normalized.push(name),
            }
        }
        BlobPath(normalized)
    }

    /// Check if this is the root path.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.as_str().is_empty()
    }

    /// Get the string representation (without leading slash).
    #[inline]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Get the underlying `RelativePath`.
    #[inline]
    pub fn as_relative_path(&self) -> &RelativePath {
        &self.0
    }

    /// Join this path with another component.
    pub fn join(&self, component: impl AsRef<str>) -> Self {
        BlobPath::new(self.0.join(component.as_ref()).as_str())
    }

    /// Get the parent path. Returns `None` for the root.
    pub fn parent(&self) -> Option<BlobPath> {
        if self.is_root() {
            return None;
        }
        self.0.parent().map(|p| BlobPath(p.to_relative_path_buf()))
    }

    /// Final component of the path. Returns `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.0.file_name()
    }

    /// Iterate over the components of this path.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.components().map(|c| c.as_str())
    }

    /// Whether any component walks upwards (`..`).
    ///
    /// Backends that map blob paths onto a real directory tree must refuse
    /// such paths.
    pub fn escapes_root(&self) -> bool {
        self.0
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    }

    /// Whether `self` is `other` or lies beneath it.
    pub fn starts_with(&self, other: &BlobPath) -> bool {
        other.is_root() || self.0.starts_with(&other.0)
    }

    /// Sibling path with the final component replaced.
    ///
    /// Returns `None` for the root.
    pub fn with_file_name(&self, name: impl AsRef<str>) -> Option<BlobPath> {
        let parent = self.parent()?;
        Some(parent.join(name))
    }
}

impl AsRef<str> for BlobPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<RelativePath> for BlobPath {
    fn as_ref(&self) -> &RelativePath {
        &self.0
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "/{}", self.0)
        }
    }
}

impl From<&str> for BlobPath {
    fn from(s: &str) -> Self {
        BlobPath::new(s)
    }
}

impl From<String> for BlobPath {
    fn from(s: String) -> Self {
        BlobPath::new(s)
    }
}
