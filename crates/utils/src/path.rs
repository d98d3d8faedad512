use std::path::Path;

/// Joins a backend-relative folder and an entry name with `/`.
/// An empty folder yields the bare name.
pub fn remote_join(folder: &str, name: &str) -> String {
    let folder = folder.trim_end_matches('/');
    let name = name.trim_start_matches('/');

    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}

/// Last `/`-separated segment of a backend key, ignoring trailing slashes.
/// Returns `None` for keys without a usable final segment (`""`, `"/"`, `"."`, `".."`).
pub fn remote_basename(key: &str) -> Option<&str> {
    let trimmed = key.trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);

    match name {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

/// Final component of a local path as a UTF-8 string.
pub fn local_basename(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
}

/// Entries whose name starts with `.` are never listed.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Normalizes an entry prefix for listing: `""` and `"/"` both mean the root.
pub fn is_root_prefix(prefix: &str) -> bool {
    prefix.trim_matches('/').is_empty()
}
