// FILE: src/core/path.rs
//! Path Resolver: pure helpers over materialized paths.
//!
//! Nothing in here touches storage. Paths are plain `/`-separated strings, not
//! `std::path::Path`, because they describe rows in a table rather than the host
//! filesystem.

use super::consts::{PATH_SEPARATOR, ROOT_PATH};

/// Normalize a path to its stored form.
///
/// Trims whitespace around the whole path, collapses repeated separators,
/// guarantees exactly one leading separator and drops any trailing one. Segment
/// names are kept verbatim. The root stays `/`.
/// `normalize(normalize(p)) == normalize(p)` for every input.
pub fn normalize(path: &str) -> String {
    let trimmed = path
        .trim_start()
        .trim_end_matches(|c: char| c == PATH_SEPARATOR || c.is_whitespace());

    let mut normalized = String::with_capacity(trimmed.len() + 1);
    for segment in trimmed.split(PATH_SEPARATOR).filter(|s| !s.is_empty()) {
        normalized.push(PATH_SEPARATOR);
        normalized.push_str(segment);
    }

    if normalized.is_empty() {
        return ROOT_PATH.to_string();
    }

    normalized
}

/// Whether `name` survives as the last segment of a normalized path: no
/// separator and no surrounding whitespace.
pub fn is_valid_name(name: &str) -> bool {
    !name.contains(PATH_SEPARATOR) && name.trim() == name
}

/// Path of a child called `name` living under `parent_path`.
pub fn child_path(parent_path: &str, name: &str) -> String {
    let parent = normalize(parent_path);
    if parent == ROOT_PATH {
        return format!("{}{}", ROOT_PATH, name);
    }
    format!("{}{}{}", parent, PATH_SEPARATOR, name)
}

/// Prefix the separator when missing. Used on lookup input only.
pub fn fix_path(path: &str) -> String {
    if path.starts_with(PATH_SEPARATOR) {
        return path.to_string();
    }
    format!("{}{}", PATH_SEPARATOR, path)
}

/// Lexical parent of a normalized path. The root has no parent.
pub fn parent_of(path: &str) -> Option<String> {
    let path = normalize(path);
    if path == ROOT_PATH {
        return None;
    }

    match path.rfind(PATH_SEPARATOR) {
        Some(0) => Some(ROOT_PATH.to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => None,
    }
}

/// Last segment of a path, `None` for the root.
pub fn file_name(path: &str) -> Option<String> {
    let path = normalize(path);
    if path == ROOT_PATH {
        return None;
    }
    path.rsplit(PATH_SEPARATOR).next().map(str::to_string)
}
