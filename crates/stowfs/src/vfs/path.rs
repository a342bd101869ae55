//! Lexical path algebra for store keys.
//!
//! Store keys are `/`-separated, absolute, and clean: no `.` or `..`
//! segments, no repeated or trailing separators (except the root itself).
//! Nothing here touches the store or the host filesystem.

/// The root path.
pub const ROOT: &str = "/";

/// Normalize a caller-supplied path into a store key.
///
/// Prefixes `/` when missing, drops `.` segments, lets `..` pop one
/// segment (never above the root) and collapses repeated separators.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return ROOT.to_string();
    }

    let mut result = String::with_capacity(path.len() + 1);
    for s in segments {
        result.push('/');
        result.push_str(s);
    }
    result
}

/// Join a directory and a leaf name, normalizing the result.
pub fn join(dir: &str, name: &str) -> String {
    normalize(&format!("{dir}/{name}"))
}

/// Parent of a normalized path. The root has no parent.
pub fn parent(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Last component of a normalized path. The root is named `/`.
pub fn file_name(path: &str) -> &str {
    if path == ROOT {
        return ROOT;
    }
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Split a path into its normalized parent directory and leaf name.
///
/// Returns `None` when the path normalizes to the root.
pub fn split(path: &str) -> Option<(String, String)> {
    let normalized = normalize(path);
    let dir = parent(&normalized)?.to_string();
    let name = file_name(&normalized).to_string();
    Some((dir, name))
}

/// Every proper ancestor of a normalized path, outermost first, root excluded.
///
/// `/a/b/c.txt` yields `/a`, `/a/b`.
pub fn ancestors(path: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut end = 0;
    while let Some(offset) = path[end + 1..].find('/') {
        end = end + 1 + offset;
        result.push(&path[..end]);
    }
    result
}

/// Returns true when `name` is usable as a single path component.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}
