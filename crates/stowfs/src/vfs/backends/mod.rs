//! VFS backends.
//!
//! Backends implement [`VfsOps`](crate::vfs::VfsOps) for different storage types.

pub mod gzip;
mod local;
mod memory;

pub use gzip::{CompressedFile, CompressedNode};
pub use local::{LocalBackend, LocalFile};
pub use memory::{DirHandle, DirNode, MemoryBackend, Node};
