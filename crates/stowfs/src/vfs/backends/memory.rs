//! In-memory, gzip-backed filesystem backend.
//!
//! Content is compressed once when added and decompressed on demand by each
//! open handle. The store is append/overwrite-only: there is no removal.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;
use std::time::SystemTime;

use super::gzip::{CompressedFile, CompressedNode};
use crate::config::StoreConfig;
use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::{DirCursor, VfsFile, VfsOps};
use crate::vfs::path;
use crate::vfs::types::FileInfo;

/// Static definition of a directory.
#[derive(Debug, Clone)]
pub struct DirNode {
    name: String,
    mod_time: SystemTime,
    /// Immediate children, sorted by name.
    entries: Vec<FileInfo>,
}

impl DirNode {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mod_time: SystemTime::now(),
            entries: Vec::new(),
        }
    }

    /// Leaf name. The root is named `/`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Immediate children, sorted by name.
    pub fn entries(&self) -> &[FileInfo] {
        &self.entries
    }

    /// Metadata view of this node.
    pub fn info(&self) -> FileInfo {
        FileInfo::directory(&self.name, self.mod_time)
    }
}

/// Entry in the path store.
#[derive(Debug, Clone)]
pub enum Node {
    File(Arc<CompressedNode>),
    Directory(Arc<DirNode>),
}

impl Node {
    /// Metadata view of this node.
    pub fn info(&self) -> FileInfo {
        match self {
            Node::File(file) => file.info(),
            Node::Directory(dir) => dir.info(),
        }
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, Node::Directory(_))
    }
}

/// Mapping from normalized absolute path to [`Node`].
///
/// Invariants, held whenever the lock is released:
/// - `/` exists and is a directory;
/// - every ancestor of a stored path is a directory;
/// - each directory's entries are exactly the stored paths whose parent is
///   that directory.
#[derive(Debug)]
struct PathStore {
    nodes: HashMap<String, Node>,
}

impl PathStore {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            path::ROOT.to_string(),
            Node::Directory(Arc::new(DirNode::new(path::ROOT))),
        );
        Self { nodes }
    }

    /// Insert a file node at `file_path`, creating missing ancestors.
    fn insert_file(&mut self, file_path: &str, node: CompressedNode) -> VfsResult<()> {
        // Validate the whole chain before mutating anything.
        for ancestor in path::ancestors(file_path) {
            if let Some(Node::File(_)) = self.nodes.get(ancestor) {
                return Err(VfsError::not_a_directory(ancestor));
            }
        }
        if let Some(Node::Directory(_)) = self.nodes.get(file_path) {
            return Err(VfsError::is_a_directory(file_path));
        }

        for ancestor in path::ancestors(file_path) {
            if !self.nodes.contains_key(ancestor) {
                tracing::debug!(path = ancestor, "creating directory");
                self.nodes.insert(
                    ancestor.to_string(),
                    Node::Directory(Arc::new(DirNode::new(path::file_name(ancestor)))),
                );
            }
        }

        self.nodes
            .insert(file_path.to_string(), Node::File(Arc::new(node)));
        self.relink();
        Ok(())
    }

    /// Rebuild every directory's entry list from the full path set.
    fn relink(&mut self) {
        let mut children: HashMap<&str, Vec<FileInfo>> = HashMap::new();
        for (node_path, node) in &self.nodes {
            if let Some(parent) = path::parent(node_path) {
                children.entry(parent).or_default().push(node.info());
            }
        }

        let mut rebuilt: Vec<(String, Node)> = Vec::new();
        for (dir_path, node) in &self.nodes {
            if let Node::Directory(dir) = node {
                let mut entries = children.remove(dir_path.as_str()).unwrap_or_default();
                entries.sort_by(|a, b| a.name.cmp(&b.name));
                let dir = DirNode {
                    name: dir.name.clone(),
                    mod_time: dir.mod_time,
                    entries,
                };
                rebuilt.push((dir_path.clone(), Node::Directory(Arc::new(dir))));
            }
        }

        for (dir_path, node) in rebuilt {
            self.nodes.insert(dir_path, node);
        }
    }

    fn lookup(&self, normalized: &str) -> VfsResult<Node> {
        self.nodes
            .get(normalized)
            .cloned()
            .ok_or_else(|| VfsError::not_found(normalized))
    }
}

/// In-memory filesystem backend over gzip-compressed content.
///
/// Thread-safe via one internal mutex, held only for map reads and
/// mutations. Compression and handle construction happen outside it.
pub struct MemoryBackend {
    store: Mutex<PathStore>,
    config: StoreConfig,
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("store", &"<locked>")
            .field("config", &self.config)
            .finish()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    /// Create an empty filesystem containing only `/`.
    pub fn new() -> Self {
        Self {
            store: Mutex::new(PathStore::new()),
            config: StoreConfig::default(),
        }
    }

    /// Create an empty filesystem with the given config.
    pub fn with_config(config: StoreConfig) -> VfsResult<Self> {
        config.validate()?;
        Ok(Self {
            store: Mutex::new(PathStore::new()),
            config,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Compress `content` and store it as `dir/name`.
    ///
    /// Missing ancestor directories are created at every level. Adding to
    /// an existing file path replaces it.
    #[tracing::instrument(skip(self, content), fields(len = content.len()), name = "store.add")]
    pub fn add(&self, dir: &str, name: &str, content: &[u8]) -> VfsResult<()> {
        if !path::is_valid_name(name) {
            tracing::warn!(dir, name, "rejecting invalid file name");
            return Err(VfsError::invalid_path(format!("{dir}/{name}")));
        }
        let file_path = path::join(dir, name);

        let node = CompressedNode::compress(name, content, &self.config).inspect_err(|e| {
            tracing::error!(path = %file_path, error = %e, "compression failed");
        })?;
        let compressed_len = node.gzip_bytes().len();

        self.store
            .lock()
            .insert_file(&file_path, node)
            .inspect_err(|e| tracing::warn!(path = %file_path, error = %e, "insert rejected"))?;

        tracing::debug!(
            path = %file_path,
            size = content.len(),
            compressed = compressed_len,
            "added file"
        );
        Ok(())
    }

    /// Store `content` at a full path such as `/assets/app.js`.
    pub fn add_file(&self, file_path: &str, content: &[u8]) -> VfsResult<()> {
        let (dir, name) = path::split(file_path).ok_or_else(|| VfsError::is_a_directory(path::ROOT))?;
        self.add(&dir, &name, content)
    }

    /// Look up the node at `path`.
    pub fn lookup(&self, path: &str) -> VfsResult<Node> {
        let normalized = path::normalize(path);
        self.store.lock().lookup(&normalized)
    }

    /// Independent copy of the whole path map, for diagnostics.
    pub fn paths(&self) -> HashMap<String, Node> {
        self.store.lock().nodes.clone()
    }

    /// Number of stored paths, root included.
    pub fn len(&self) -> usize {
        self.store.lock().nodes.len()
    }

    /// Returns true when nothing but the root is stored.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl VfsOps for MemoryBackend {
    #[tracing::instrument(skip(self), name = "store.open")]
    fn open(&self, path: &str) -> VfsResult<Box<dyn VfsFile>> {
        let normalized = path::normalize(path);
        let node = self.store.lock().lookup(&normalized)?;

        Ok(match node {
            Node::File(file) => Box::new(CompressedFile::open(normalized, file)),
            Node::Directory(dir) => Box::new(DirHandle::open(normalized, dir)),
        })
    }
}

/// An opened [`DirNode`].
///
/// Lists the entries as they were when the directory was opened.
#[derive(Debug)]
pub struct DirHandle {
    path: String,
    node: Arc<DirNode>,
    cursor: DirCursor,
}

impl DirHandle {
    fn open(path: String, node: Arc<DirNode>) -> Self {
        Self {
            path,
            node,
            cursor: DirCursor::new(),
        }
    }
}

impl Read for DirHandle {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(VfsError::is_a_directory(self.path.clone()).into())
    }
}

impl Seek for DirHandle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match pos {
            SeekFrom::Start(0) => {
                self.cursor.rewind();
                Ok(0)
            }
            _ => Err(VfsError::unsupported(format!("seek {pos:?} in directory {}", self.path)).into()),
        }
    }
}

impl VfsFile for DirHandle {
    fn stat(&self) -> VfsResult<FileInfo> {
        Ok(self.node.info())
    }

    fn readdir(&mut self, count: isize) -> VfsResult<Vec<FileInfo>> {
        self.cursor.next_batch(&self.node.entries, count)
    }

    fn close(&mut self) -> VfsResult<()> {
        Ok(())
    }
}
