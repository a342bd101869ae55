//! VFS error types.

use std::io;
use thiserror::Error;

/// VFS error type.
#[derive(Debug, Error)]
pub enum VfsError {
    /// File or directory not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Expected a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Expected a file.
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// Operation not supported by this kind of handle.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Invalid path or path component.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Path escapes root (security violation).
    #[error("path escapes root: {0}")]
    PathEscapesRoot(String),

    /// Seek resolved to a negative offset.
    #[error("invalid seek to {offset} in {path}")]
    InvalidSeek { path: String, offset: i128 },

    /// Directory cursor is exhausted.
    ///
    /// Normal termination signal for `readdir` with a positive count.
    #[error("no more directory entries")]
    EndOfEntries,

    /// Decompression stream ended before the requested offset.
    #[error("short stream in {path}: wanted offset {expected}, stream ended at {reached}")]
    ShortStream {
        path: String,
        expected: u64,
        reached: u64,
    },

    /// Stored data failed an internal invariant. Not recoverable.
    #[error("corrupt state: {0}")]
    Corrupt(String),

    /// Handle used after close.
    #[error("handle closed: {0}")]
    Closed(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl VfsError {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a NotADirectory error.
    pub fn not_a_directory(path: impl Into<String>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Create an IsADirectory error.
    pub fn is_a_directory(path: impl Into<String>) -> Self {
        Self::IsADirectory(path.into())
    }

    /// Create an Unsupported error.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create a PathEscapesRoot error.
    pub fn path_escapes_root(path: impl Into<String>) -> Self {
        Self::PathEscapesRoot(path.into())
    }

    /// Create a Corrupt error.
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Returns true for the directory exhaustion signal.
    pub fn is_end_of_entries(&self) -> bool {
        matches!(self, VfsError::EndOfEntries)
    }

    /// Returns true for errors that indicate a bug in this crate rather
    /// than a caller mistake.
    pub fn is_fatal(&self) -> bool {
        matches!(self, VfsError::Corrupt(_))
    }

    /// Recover a `VfsError` that was carried through an `io::Error`.
    ///
    /// Handles implement `std::io::Read`/`Seek`, so their errors arrive as
    /// `io::Error`. Errors that did not originate here are wrapped in `Io`.
    pub fn from_io(err: io::Error) -> Self {
        let wrapped = err.get_ref().is_some_and(|inner| inner.is::<VfsError>());
        if !wrapped {
            return VfsError::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<VfsError>()) {
            Some(Ok(vfs)) => *vfs,
            _ => VfsError::other("wrapped error lost in conversion"),
        }
    }
}

/// Convert VfsError to std::io::Error for compatibility.
///
/// The original error is kept as the inner payload, so
/// [`VfsError::from_io`] can round-trip it.
impl From<VfsError> for io::Error {
    fn from(e: VfsError) -> Self {
        let kind = match e {
            VfsError::Io(inner) => return inner,
            VfsError::NotFound(_) => io::ErrorKind::NotFound,
            VfsError::NotADirectory(_) => io::ErrorKind::NotADirectory,
            VfsError::IsADirectory(_) => io::ErrorKind::IsADirectory,
            VfsError::Unsupported(_) => io::ErrorKind::Unsupported,
            VfsError::InvalidPath(_) => io::ErrorKind::InvalidInput,
            VfsError::PathEscapesRoot(_) => io::ErrorKind::PermissionDenied,
            VfsError::InvalidSeek { .. } => io::ErrorKind::InvalidInput,
            VfsError::EndOfEntries => io::ErrorKind::UnexpectedEof,
            VfsError::ShortStream { .. } => io::ErrorKind::UnexpectedEof,
            VfsError::Corrupt(_) => io::ErrorKind::InvalidData,
            VfsError::Closed(_) => io::ErrorKind::BrokenPipe,
            VfsError::Config(_) => io::ErrorKind::InvalidInput,
            VfsError::Other(_) => io::ErrorKind::Other,
        };
        io::Error::new(kind, e)
    }
}

/// VFS result type.
pub type VfsResult<T> = Result<T, VfsError>;
