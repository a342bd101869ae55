//! Core VFS types.
//!
//! [`FileInfo`] is the metadata value returned by every handle's `stat()`
//! and by directory listings, whichever backend produced it.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use std::time::SystemTime;

/// Permission bits reported for compressed files.
pub const FILE_MODE: u32 = 0o444;

/// Permission bits reported for directories.
pub const DIR_MODE: u32 = 0o755;

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// File metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    /// Leaf name (not full path). The root directory is named `/`.
    pub name: String,
    /// Size in bytes. For compressed files this is the decompressed length.
    pub size: u64,
    /// File type.
    pub kind: FileType,
    /// Unix permissions (e.g., 0o444).
    pub perm: u32,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Embedder-specific extension slot. Never populated by this crate.
    #[serde(skip)]
    pub sys: Option<Arc<dyn Any + Send + Sync>>,
}

impl FileInfo {
    /// Metadata for a read-only file.
    pub fn file(name: impl Into<String>, size: u64, mtime: SystemTime) -> Self {
        Self {
            name: name.into(),
            size,
            kind: FileType::File,
            perm: FILE_MODE,
            mtime,
            sys: None,
        }
    }

    /// Metadata for a directory.
    pub fn directory(name: impl Into<String>, mtime: SystemTime) -> Self {
        Self {
            name: name.into(),
            size: 0,
            kind: FileType::Directory,
            perm: DIR_MODE,
            mtime,
            sys: None,
        }
    }

    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

impl PartialEq for FileInfo {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.size == other.size
            && self.kind == other.kind
            && self.perm == other.perm
            && self.mtime == other.mtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type() {
        assert!(FileType::File.is_file());
        assert!(!FileType::File.is_dir());
        assert!(FileType::Directory.is_dir());
    }

    #[test]
    fn test_file_info_constructors() {
        let now = SystemTime::now();

        let file = FileInfo::file("index.html", 1024, now);
        assert!(file.is_file());
        assert_eq!(file.size, 1024);
        assert_eq!(file.perm, 0o444);
        assert!(file.sys.is_none());

        let dir = FileInfo::directory("assets", now);
        assert!(dir.is_dir());
        assert_eq!(dir.size, 0);
        assert_eq!(dir.perm, 0o755);
    }

    #[test]
    fn test_equality_ignores_extension_slot() {
        let now = SystemTime::now();
        let plain = FileInfo::file("a.txt", 1, now);
        let mut tagged = plain.clone();
        tagged.sys = Some(Arc::new(42u32));
        assert_eq!(plain, tagged);
    }
}
