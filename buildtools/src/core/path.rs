//! File name safety checks and `/`-separated path helpers.
//!
//! Paths handed to destructive operations are relative to the working root.
//! A name is rejected when, joined to that root, it could resolve to
//! something outside of it.

/// Replace every `\` with `/`.
pub fn canonical_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// True if `path` could be used to reach a file outside the working root.
///
/// A path is malformed when it starts with `/` or `\`, starts with a drive
/// prefix such as `c:`, or has a component (after canonicalisation) that is
/// exactly `..`. Components that merely contain `..` (`b..`, `..b`) are fine.
/// The empty path is not malformed; see [`is_illegal_file_name`].
pub fn is_malformed_file_name(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    let canonical = canonical_path(path);
    if has_drive_prefix(&canonical) {
        return true;
    }
    canonical.split('/').any(is_back_dir)
}

/// True if `path` is empty or malformed; such a name must never be used to
/// address a file under the working root.
pub fn is_illegal_file_name(path: &str) -> bool {
    path.is_empty() || is_malformed_file_name(path)
}

/// True if any `/`- or `\`-separated component of `path` is exactly `..`.
///
/// Narrower than [`is_malformed_file_name`]: absolute and drive-prefixed
/// paths are not flagged.
pub fn contains_back_dir(path: &str) -> bool {
    if !path.contains("..") {
        return false;
    }
    path.split(['/', '\\']).any(is_back_dir)
}

/// True if `target_dir` is `possible_parent` or lies beneath it.
///
/// Matching is by whole components: `foo/bar` is under `foo` and `foo/`, but
/// not under `f`.
pub fn is_parent_dir(target_dir: &str, possible_parent: &str) -> bool {
    let Some(remainder) = target_dir.strip_prefix(possible_parent) else {
        return false;
    };
    remainder.is_empty() || possible_parent.ends_with('/') || remainder.starts_with('/')
}

/// Join a directory and a child name with `/`. An empty directory stands for
/// the current one.
pub fn join_dir(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Strip trailing separators, keeping a lone `/`.
pub(crate) fn trim_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

fn is_back_dir(component: &str) -> bool {
    component == ".."
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
