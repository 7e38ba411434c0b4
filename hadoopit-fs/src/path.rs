//! Helpers for absolute, slash-separated filesystem paths.
//!
//! Remote paths are plain strings rather than `std::path::Path` so they keep
//! forward slashes on every host platform.

/// Name of the read-only namespace that holds a directory's snapshots.
pub const SNAPSHOT_DIR: &str = ".snapshot";

/// Collapse repeated slashes and drop any trailing slash. The root stays `/`.
pub fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let joined = segments.join("/");
    if path.starts_with('/') {
        format!("/{}", joined)
    } else {
        joined
    }
}

pub fn join(parent: &str, child: &str) -> String {
    let parent = normalize(parent);
    let child = child.trim_matches('/');
    if child.is_empty() {
        parent
    } else if parent == "/" {
        format!("/{}", child)
    } else {
        format!("{}/{}", parent, child)
    }
}

pub fn snapshot_root(directory: &str) -> String {
    join(directory, SNAPSHOT_DIR)
}

pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}
