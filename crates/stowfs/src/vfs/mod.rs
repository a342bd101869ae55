//! Virtual Filesystem abstraction.
//!
//! Key components:
//!
//! - [`VfsOps`] / [`VfsFile`] - The open/read/seek/stat/readdir contract
//! - [`MemoryBackend`] - Gzip-compressed, in-memory path store
//! - [`LocalBackend`] - Pass-through to a directory on disk
//! - [`walk`] - Sorted recursive traversal over any backend
//!
//! ## Design Decisions
//!
//! - **Path-keyed, no inodes**: the store maps clean absolute paths to
//!   nodes; directory listings are rebuilt on insertion.
//! - **Compress once, decode per handle**: each open file owns its own
//!   decoder and emulates seeking over it.
//! - **One coarse lock**: insertion happens at bundling time, lookups at
//!   serving time, so a single mutex over the map is enough.

pub mod backends;
mod error;
mod ops;
pub mod path;
mod types;
mod walk;

pub use backends::{CompressedFile, DirHandle, LocalBackend, MemoryBackend, Node};
pub use error::{VfsError, VfsResult};
pub use ops::{VfsFile, VfsOps};
pub use types::{DIR_MODE, FILE_MODE, FileInfo, FileType};
pub use walk::{WalkAction, WalkEntry, walk};
