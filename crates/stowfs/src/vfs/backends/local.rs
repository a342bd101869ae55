//! Local filesystem backend.
//!
//! Serves the same handle contract straight from a directory on disk, so an
//! application can switch between bundled assets and a live checkout.
//! Directory listings only report subdirectories.

use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};

use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::{DirCursor, VfsFile, VfsOps};
use crate::vfs::path;
use crate::vfs::types::{FileInfo, FileType};

/// Local filesystem backend.
///
/// All operations are relative to `root`. For example, if `root` is
/// `/srv/site`, then `open("css/app.css")` opens `/srv/site/css/app.css`.
///
/// Paths are cleaned lexically before joining, so `..` cannot climb out
/// of the root.
#[derive(Debug, Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Create a backend rooted at `dir`.
    ///
    /// A relative `dir` is resolved against the current working directory.
    /// The directory must exist.
    pub fn new(dir: impl AsRef<Path>) -> VfsResult<Self> {
        let dir = dir.as_ref();
        let joined = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(dir)
        };

        let meta = fs::metadata(&joined).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => VfsError::not_found(joined.display().to_string()),
            _ => VfsError::Io(e),
        })?;
        if !meta.is_dir() {
            return Err(VfsError::not_a_directory(joined.display().to_string()));
        }

        let root = dunce::canonicalize(&joined)?;
        tracing::info!(root = %root.display(), "serving local directory");
        Ok(Self { root })
    }

    /// Get the root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a virtual path onto the host filesystem.
    fn resolve(&self, name: &str) -> VfsResult<PathBuf> {
        if std::path::MAIN_SEPARATOR != '/' && name.contains(std::path::MAIN_SEPARATOR) {
            return Err(VfsError::invalid_path(name));
        }

        let normalized = path::normalize(name);
        let mut full = self.root.clone();
        for segment in normalized.split('/').filter(|s| !s.is_empty()) {
            full.push(segment);
        }
        if !full.starts_with(&self.root) {
            return Err(VfsError::path_escapes_root(normalized));
        }
        Ok(full)
    }

    /// Translate an open failure into the error a caller expects.
    ///
    /// OS-specific errors from traversing through a regular file become
    /// `NotFound`, matching how the in-memory backend reports them.
    fn map_open_error(&self, err: io::Error, full: &Path) -> VfsError {
        match err.kind() {
            io::ErrorKind::NotFound => return VfsError::not_found(full.display().to_string()),
            io::ErrorKind::PermissionDenied => return VfsError::Io(err),
            _ => {}
        }

        let mut prefix = PathBuf::new();
        for component in full.components() {
            prefix.push(component);
            if !matches!(component, Component::Normal(_)) {
                continue;
            }
            match fs::metadata(&prefix) {
                Ok(meta) if !meta.is_dir() => {
                    return VfsError::not_found(full.display().to_string());
                }
                Ok(_) => {}
                Err(_) => return VfsError::Io(err),
            }
        }
        VfsError::Io(err)
    }
}

impl VfsOps for LocalBackend {
    fn open(&self, name: &str) -> VfsResult<Box<dyn VfsFile>> {
        let full = self.resolve(name)?;
        let file = fs::File::open(&full).map_err(|e| self.map_open_error(e, &full))?;
        tracing::trace!(path = %full.display(), "opened local file");
        Ok(Box::new(LocalFile {
            file,
            path: full,
            listing: None,
            cursor: DirCursor::new(),
        }))
    }
}

/// An open file or directory on disk.
#[derive(Debug)]
pub struct LocalFile {
    file: fs::File,
    path: PathBuf,
    /// Directory entries, read on first `readdir`.
    listing: Option<Vec<FileInfo>>,
    cursor: DirCursor,
}

/// Convert std::fs::Metadata to FileInfo.
fn metadata_to_info(name: String, meta: &fs::Metadata) -> FileInfo {
    let kind = if meta.is_dir() {
        FileType::Directory
    } else {
        FileType::File
    };

    FileInfo {
        name,
        size: if meta.is_dir() { 0 } else { meta.len() },
        kind,
        perm: permission_bits(meta),
        mtime: meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
        sys: None,
    }
}

#[cfg(unix)]
fn permission_bits(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(meta: &fs::Metadata) -> u32 {
    match (meta.is_dir(), meta.permissions().readonly()) {
        (true, _) => crate::vfs::types::DIR_MODE,
        (false, true) => crate::vfs::types::FILE_MODE,
        (false, false) => 0o644,
    }
}

impl LocalFile {
    fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path::ROOT.to_string())
    }

    fn load_listing(&self) -> VfsResult<Vec<FileInfo>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            // Follow symlinks, the way a plain open would.
            let meta = fs::metadata(entry.path())?;
            entries.push(metadata_to_info(
                entry.file_name().to_string_lossy().into_owned(),
                &meta,
            ));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

impl Read for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for LocalFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        if pos == SeekFrom::Start(0) {
            self.cursor.rewind();
        }
        self.file.seek(pos)
    }
}

impl VfsFile for LocalFile {
    fn stat(&self) -> VfsResult<FileInfo> {
        let meta = self.file.metadata()?;
        Ok(metadata_to_info(self.name(), &meta))
    }

    fn readdir(&mut self, count: isize) -> VfsResult<Vec<FileInfo>> {
        if !self.file.metadata()?.is_dir() {
            return Err(VfsError::not_a_directory(self.path.display().to_string()));
        }
        if self.listing.is_none() {
            self.listing = Some(self.load_listing()?);
        }
        let listing = self.listing.as_deref().unwrap_or_default();
        let batch = self.cursor.next_batch(listing, count)?;
        Ok(batch.into_iter().filter(|e| e.is_dir()).collect())
    }

    fn close(&mut self) -> VfsResult<()> {
        self.listing = None;
        Ok(())
    }
}
