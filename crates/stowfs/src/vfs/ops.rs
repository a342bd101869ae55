//! VFS operations traits.
//!
//! [`VfsOps`] resolves paths to handles; [`VfsFile`] is the per-open
//! handle contract. Both the in-memory store and the on-disk adapter
//! implement them, and the tree walker consumes nothing else.

use std::fmt;
use std::io::{Read, Seek};

use super::types::FileInfo;
use super::{VfsError, VfsResult};

/// An open file or directory.
///
/// Byte access goes through `std::io::Read` and `std::io::Seek`. A read
/// returning `Ok(0)` is end of stream. Errors carry a [`VfsError`] inside
/// the `io::Error`, recoverable with [`VfsError::from_io`].
///
/// Handles own their cursor state. They are `Send` but must not be shared
/// between concurrent callers.
pub trait VfsFile: Read + Seek + Send + fmt::Debug {
    /// Metadata of the opened node.
    fn stat(&self) -> VfsResult<FileInfo>;

    /// Read directory entries from the handle's cursor.
    ///
    /// `count <= 0` returns every remaining entry (possibly none).
    /// `count > 0` returns at most `count` entries and fails with
    /// [`VfsError::EndOfEntries`] once the cursor is exhausted.
    fn readdir(&mut self, count: isize) -> VfsResult<Vec<FileInfo>>;

    /// Release resources held by the handle.
    ///
    /// Using a handle after close is a caller error.
    fn close(&mut self) -> VfsResult<()>;

    /// Raw gzip bytes, for handles backed by pre-compressed content.
    ///
    /// Lets a transport serve the stored stream verbatim with
    /// `Content-Encoding: gzip` instead of decompressing.
    fn precompressed(&self) -> Option<&[u8]> {
        None
    }
}

/// A filesystem that hands out [`VfsFile`] handles.
pub trait VfsOps: Send + Sync {
    /// Open the node at `path`.
    ///
    /// Paths are normalized lexically before lookup; relative paths are
    /// treated as rooted.
    fn open(&self, path: &str) -> VfsResult<Box<dyn VfsFile>>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Get metadata for a path.
    fn stat(&self, path: &str) -> VfsResult<FileInfo> {
        let mut file = self.open(path)?;
        let info = file.stat();
        file.close()?;
        info
    }

    /// Check if a path exists.
    fn exists(&self, path: &str) -> bool {
        self.stat(path).is_ok()
    }

    /// Read entire file contents.
    fn read_all(&self, path: &str) -> VfsResult<Vec<u8>> {
        let mut file = self.open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(VfsError::from_io)?;
        file.close()?;
        Ok(data)
    }

    /// List a directory, sorted by name.
    fn read_dir(&self, path: &str) -> VfsResult<Vec<FileInfo>> {
        let mut dir = self.open(path)?;
        let mut entries = dir.readdir(-1)?;
        dir.close()?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

/// Cursor over a fixed list of directory entries.
///
/// Shared by every handle that lists a directory so the `readdir`
/// contract is implemented once.
#[derive(Debug, Clone, Default)]
pub(crate) struct DirCursor {
    pos: usize,
}

impl DirCursor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rewind(&mut self) {
        self.pos = 0;
    }

    pub(crate) fn next_batch(
        &mut self,
        entries: &[FileInfo],
        count: isize,
    ) -> VfsResult<Vec<FileInfo>> {
        let start = self.pos.min(entries.len());
        let remaining = entries.len() - start;
        if remaining == 0 && count > 0 {
            return Err(VfsError::EndOfEntries);
        }
        let take = if count <= 0 {
            remaining
        } else {
            remaining.min(count as usize)
        };
        let batch = entries[start..start + take].to_vec();
        self.pos = start + take;
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn entries(names: &[&str]) -> Vec<FileInfo> {
        let now = SystemTime::now();
        names.iter().map(|n| FileInfo::file(*n, 0, now)).collect()
    }

    fn names(batch: &[FileInfo]) -> Vec<&str> {
        batch.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_cursor_paged() {
        let list = entries(&["a", "b", "c"]);
        let mut cursor = DirCursor::new();

        assert_eq!(names(&cursor.next_batch(&list, 2).unwrap()), ["a", "b"]);
        assert_eq!(names(&cursor.next_batch(&list, 2).unwrap()), ["c"]);
        assert!(matches!(
            cursor.next_batch(&list, 2),
            Err(VfsError::EndOfEntries)
        ));
        assert!(cursor.next_batch(&list, 0).unwrap().is_empty());
    }

    #[test]
    fn test_cursor_all_then_rewind() {
        let list = entries(&["a", "b"]);
        let mut cursor = DirCursor::new();

        assert_eq!(cursor.next_batch(&list, -1).unwrap().len(), 2);
        assert!(cursor.next_batch(&list, -1).unwrap().is_empty());

        cursor.rewind();
        assert_eq!(names(&cursor.next_batch(&list, -1).unwrap()), ["a", "b"]);
    }

    #[test]
    fn test_cursor_empty_directory() {
        let mut cursor = DirCursor::new();
        assert!(cursor.next_batch(&[], -1).unwrap().is_empty());
        assert!(matches!(
            cursor.next_batch(&[], 1),
            Err(VfsError::EndOfEntries)
        ));
    }
}
