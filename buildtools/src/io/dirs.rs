//! Directory discovery: walking a tree and picking the directories that
//! directly hold files a task cares about.

use anyhow::{Context, Result, bail};
use tracing::{debug, instrument};

use crate::core::path::{canonical_path, join_dir, trim_trailing_separators};
use crate::io::fs::{DirEntry, FileSystem};

/// Every directory under `top`, `top` included, depth-first and pre-order.
///
/// Siblings are visited in name order. `top` must be a directory; once it is,
/// subdirectories that cannot be read are treated as empty.
#[instrument(skip(fs))]
pub fn all_dirs(fs: &dyn FileSystem, top: &str) -> Result<Vec<String>> {
    let top = canonical_path(top);
    let top = trim_trailing_separators(&top);
    let is_dir = fs.is_dir(top).with_context(|| format!("inspect {top:?}"))?;
    if !is_dir {
        bail!("{top:?} is not a directory");
    }
    let mut dirs = Vec::new();
    collect_dirs(fs, top.to_string(), &mut dirs);
    debug!(count = dirs.len(), "collected directories");
    Ok(dirs)
}

fn collect_dirs(fs: &dyn FileSystem, dir: String, dirs: &mut Vec<String>) {
    let entries = fs.read_dir(&dir).unwrap_or_else(|err| {
        debug!(dir = %dir, err = %err, "unreadable directory, skipping");
        Vec::new()
    });
    let children: Vec<String> = entries
        .iter()
        .filter(|entry| entry.is_dir())
        .map(|entry| join_dir(&dir, &entry.name))
        .collect();
    dirs.push(dir);
    for child in children {
        collect_dirs(fs, child, dirs);
    }
}

/// True if `entry` is a regular file whose name satisfies `matcher`.
pub fn is_relevant_file<M>(entry: &DirEntry, matcher: M) -> bool
where
    M: Fn(&str) -> bool,
{
    entry.is_file() && matcher(&entry.name)
}

/// True if `dir` directly contains a relevant file. Unreadable directories
/// contain nothing.
pub fn includes_relevant_files<M>(fs: &dyn FileSystem, dir: &str, matcher: M) -> bool
where
    M: Fn(&str) -> bool,
{
    match fs.read_dir(dir) {
        Ok(entries) => entries
            .iter()
            .any(|entry| is_relevant_file(entry, &matcher)),
        Err(_) => false,
    }
}

/// Directories under `top` that directly contain a relevant file, relative to
/// `top` (which itself becomes `""`), in walk order.
pub fn relevant_dirs_under<M>(fs: &dyn FileSystem, top: &str, matcher: M) -> Result<Vec<String>>
where
    M: Fn(&str) -> bool,
{
    let dirs = all_dirs(fs, top)?;
    let top = canonical_path(top);
    let top = trim_trailing_separators(&top);
    Ok(dirs
        .iter()
        .filter(|dir| includes_relevant_files(fs, dir, &matcher))
        .map(|dir| relative_to(top, dir))
        .collect())
}

fn relative_to(top: &str, dir: &str) -> String {
    dir.strip_prefix(top)
        .unwrap_or(dir)
        .trim_start_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::matchers::{match_go_source, match_module_file};
    use crate::io::fs::EntryKind;
    use crate::test_support::MemoryFileSystem;

    fn sample_tree() -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        fs.mkdir_all("a/b/c/d");
        fs.mkdir_all("a/b/c/e");
        fs.write_file("a/b/c/f", "data");
        fs.write_file("a/b/c/e/x", "data");
        fs
    }

    #[test]
    fn all_dirs_walks_pre_order_by_name() {
        let fs = sample_tree();
        let dirs = all_dirs(&fs, "a").expect("all_dirs");
        assert_eq!(dirs, vec!["a", "a/b", "a/b/c", "a/b/c/d", "a/b/c/e"]);
    }

    #[test]
    fn all_dirs_normalises_top() {
        let fs = sample_tree();
        let dirs = all_dirs(&fs, "a\\b\\").expect("all_dirs");
        assert_eq!(dirs, vec!["a/b", "a/b/c", "a/b/c/d", "a/b/c/e"]);
    }

    #[test]
    fn all_dirs_rejects_missing_and_non_directories() {
        let fs = sample_tree();
        assert!(all_dirs(&fs, "no such dir").is_err());
        let err = all_dirs(&fs, "a/b/c/f").unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn relevant_file_must_be_regular() {
        assert!(is_relevant_file(
            &DirEntry::new("foo.go", EntryKind::File),
            match_go_source
        ));
        assert!(!is_relevant_file(
            &DirEntry::new("foo.go", EntryKind::Dir),
            match_go_source
        ));
        assert!(!is_relevant_file(
            &DirEntry::new("foo.go", EntryKind::Other),
            match_go_source
        ));
        assert!(!is_relevant_file(
            &DirEntry::new("foo_test.go", EntryKind::File),
            match_go_source
        ));
    }

    #[test]
    fn includes_relevant_files_is_not_recursive() {
        let fs = MemoryFileSystem::new();
        fs.write_file("a/b/foo.go", "package b");
        assert!(!includes_relevant_files(&fs, "a", match_go_source));
        assert!(includes_relevant_files(&fs, "a/b", match_go_source));
        assert!(!includes_relevant_files(&fs, "missing", match_go_source));
    }

    #[test]
    fn relevant_dirs_skip_test_only_directories() {
        let fs = MemoryFileSystem::new();
        fs.write_file("a/foo_test.go", "test stuff");
        fs.write_file("a/b/foo.go", "source code");
        fs.mkdir_all("a/b/c");

        let dirs = relevant_dirs_under(&fs, "a", match_go_source).expect("relevant dirs");
        assert_eq!(dirs, vec!["b"]);
    }

    #[test]
    fn relevant_dirs_report_root_as_empty() {
        let fs = MemoryFileSystem::new();
        fs.write_file("work/go.mod", "module work");
        fs.write_file("work/tools/go.mod", "module tools");
        fs.write_file("work/tools/main.go", "package main");

        let dirs = relevant_dirs_under(&fs, "work/", match_module_file).expect("relevant dirs");
        assert_eq!(dirs, vec!["", "tools"]);
    }

    #[test]
    fn relevant_dirs_propagate_root_errors() {
        let fs = MemoryFileSystem::new();
        assert!(relevant_dirs_under(&fs, "nowhere", match_go_source).is_err());
    }

    #[test]
    fn unreadable_subdirectory_is_listed_but_not_entered() {
        let fs = sample_tree();
        fs.mkdir_all("a/b/c/d/deep");
        fs.mkdir_all("a/z");
        fs.deny_read("a/b/c/d");

        let dirs = all_dirs(&fs, "a").expect("all_dirs");
        assert_eq!(dirs, vec!["a", "a/b", "a/b/c", "a/b/c/d", "a/b/c/e", "a/z"]);
    }

    #[test]
    fn unreadable_directory_has_no_relevant_files() {
        let fs = MemoryFileSystem::new();
        fs.write_file("a/b/foo.go", "package b");
        fs.write_file("a/c/bar.go", "package c");
        fs.deny_read("a/b");

        assert!(!includes_relevant_files(&fs, "a/b", match_go_source));
        let dirs = relevant_dirs_under(&fs, "a", match_go_source).expect("relevant dirs");
        assert_eq!(dirs, vec!["c"]);
    }
}
