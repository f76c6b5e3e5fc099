//! Filesystem access used by directory discovery and `clean`.
//!
//! Paths are `/`-separated strings, relative to the process's current
//! directory unless absolute.

use std::fs;
use std::io;
use std::path::Path;

use tracing::debug;

/// Kind of a directory entry. Symlinks are reported as [`EntryKind::Other`]
/// and are never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Other,
}

/// One immediate child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

pub trait FileSystem {
    /// Whether `path` is a directory. Errors if `path` cannot be inspected
    /// (for example, it does not exist).
    fn is_dir(&self, path: &str) -> io::Result<bool>;

    /// Immediate children of `path`, sorted by name.
    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>>;

    fn exists(&self, path: &str) -> bool;

    fn remove_file(&self, path: &str) -> io::Result<()>;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn is_dir(&self, path: &str) -> io::Result<bool> {
        Ok(fs::metadata(os_path(path))?.is_dir())
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(os_path(path))? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let kind = if file_type.is_dir() {
                EntryKind::Dir
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                EntryKind::Other
            };
            entries.push(DirEntry::new(
                entry.file_name().to_string_lossy().into_owned(),
                kind,
            ));
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn exists(&self, path: &str) -> bool {
        fs::symlink_metadata(os_path(path)).is_ok()
    }

    fn remove_file(&self, path: &str) -> io::Result<()> {
        debug!(path, "removing file");
        fs::remove_file(os_path(path))
    }
}

fn os_path(path: &str) -> &Path {
    if path.is_empty() {
        Path::new(".")
    } else {
        Path::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_dir_sorts_and_classifies_entries() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::create_dir(temp.path().join("b")).expect("mkdir");
        fs::write(temp.path().join("a.go"), "package a").expect("write");
        fs::write(temp.path().join("c"), "").expect("write");

        let root = temp.path().to_str().expect("utf-8 temp path");
        let entries = OsFileSystem.read_dir(root).expect("read_dir");
        assert_eq!(
            entries,
            vec![
                DirEntry::new("a.go", EntryKind::File),
                DirEntry::new("b", EntryKind::Dir),
                DirEntry::new("c", EntryKind::File),
            ]
        );
    }

    #[test]
    fn is_dir_errors_on_missing_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("missing");
        assert!(OsFileSystem.is_dir(missing.to_str().expect("utf-8")).is_err());
    }

    #[test]
    fn remove_file_deletes_and_exists_reflects_it() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("gone.txt");
        fs::write(&file, "x").expect("write");
        let file = file.to_str().expect("utf-8");

        assert!(OsFileSystem.exists(file));
        OsFileSystem.remove_file(file).expect("remove");
        assert!(!OsFileSystem.exists(file));
    }
}
