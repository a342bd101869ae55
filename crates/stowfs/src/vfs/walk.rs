//! Recursive, sorted traversal over any [`VfsOps`].
//!
//! Only the handle contract is used (`open`, `stat`, `readdir`), so the
//! same walker serves the in-memory store and the on-disk adapter.

use super::ops::VfsOps;
use super::path;
use super::types::FileInfo;
use super::{VfsError, VfsResult};

/// What the walker should do after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkAction {
    /// Keep going.
    Continue,
    /// On a directory: do not descend into it. On a file: skip the
    /// remaining entries of the containing directory.
    SkipDir,
}

/// One visit reported to the walk callback.
#[derive(Debug)]
pub struct WalkEntry {
    /// Path of the visited node, joined from the walk root.
    pub path: String,
    /// Metadata, absent when the node could not be stat'ed.
    pub info: Option<FileInfo>,
    /// Error hit while stat'ing or listing this node.
    pub error: Option<VfsError>,
}

/// Walk the tree rooted at `root`, calling `f` for every node in
/// lexical order, directories before their contents.
///
/// Errors from opening `root` are returned directly. Errors further down
/// are handed to `f`, which decides whether the walk continues: returning
/// `Err` stops the walk and propagates that error.
pub fn walk<F>(fs: &dyn VfsOps, root: &str, mut f: F) -> VfsResult<()>
where
    F: FnMut(&WalkEntry) -> VfsResult<WalkAction>,
{
    let mut handle = fs.open(root)?;
    let stat = handle.stat();
    handle.close()?;

    let root = root.to_string();
    let outcome = match stat {
        Ok(info) => walk_node(fs, root, info, &mut f),
        Err(error) => f(&WalkEntry {
            path: root,
            info: None,
            error: Some(error),
        }),
    };

    // A SkipDir that reaches the top just ends the walk.
    outcome.map(|_| ())
}

fn walk_node<F>(fs: &dyn VfsOps, node_path: String, info: FileInfo, f: &mut F) -> VfsResult<WalkAction>
where
    F: FnMut(&WalkEntry) -> VfsResult<WalkAction>,
{
    if !info.is_dir() {
        return f(&WalkEntry {
            path: node_path,
            info: Some(info),
            error: None,
        });
    }

    let (names, list_error) = match read_dir_names(fs, &node_path) {
        Ok(names) => (names, None),
        Err(e) => (Vec::new(), Some(e)),
    };
    let failed = list_error.is_some();
    let action = f(&WalkEntry {
        path: node_path.clone(),
        info: Some(info),
        error: list_error,
    })?;
    if failed || action == WalkAction::SkipDir {
        return Ok(action);
    }

    for name in names {
        let child = path::join(&node_path, &name);
        match fs.stat(&child) {
            Err(error) => {
                // SkipDir has nothing to skip for an unreadable entry.
                f(&WalkEntry {
                    path: child,
                    info: None,
                    error: Some(error),
                })?;
            }
            Ok(child_info) => {
                let is_dir = child_info.is_dir();
                let action = walk_node(fs, child, child_info, f)?;
                if action == WalkAction::SkipDir && !is_dir {
                    return Ok(WalkAction::SkipDir);
                }
            }
        }
    }
    Ok(WalkAction::Continue)
}

fn read_dir_names(fs: &dyn VfsOps, dir: &str) -> VfsResult<Vec<String>> {
    let mut handle = fs.open(dir)?;
    let infos = handle.readdir(-1);
    handle.close()?;

    let mut names: Vec<String> = infos?.into_iter().map(|i| i.name).collect();
    names.sort();
    Ok(names)
}
