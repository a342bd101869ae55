//! # stowfs
//!
//! Read-only virtual filesystem held in process memory.
//!
//! Assets are gzip-compressed once when added and served back through
//! ordinary file handles: `std::io::Read` + `Seek`, plus `stat` and
//! `readdir`. Seeking is emulated over the forward-only decoder, so no
//! file is ever kept decompressed.
//!
//! ```
//! use std::io::{Read, Seek, SeekFrom};
//! use stowfs::{MemoryBackend, VfsOps};
//!
//! let fs = MemoryBackend::new();
//! fs.add("/", "hi.txt", b"hello").unwrap();
//!
//! let mut file = fs.open("/hi.txt").unwrap();
//! file.seek(SeekFrom::Start(2)).unwrap();
//! let mut tail = String::new();
//! file.read_to_string(&mut tail).unwrap();
//! assert_eq!(tail, "llo");
//! ```

pub mod config;
pub mod vfs;

pub use config::StoreConfig;
pub use vfs::{
    backends::{LocalBackend, MemoryBackend},
    DirHandle, FileInfo, FileType, Node, VfsError, VfsFile, VfsOps, VfsResult, WalkAction,
    WalkEntry, walk,
};
