//! In-memory fakes for the build collaborators, plus a temporary repository
//! for tests that need the real filesystem.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::build::Toolbox;
use crate::core::path::canonical_path;
use crate::io::env::EnvStore;
use crate::io::fs::{DirEntry, EntryKind, FileSystem};
use crate::io::printer::Printer;
use crate::io::process::{CommandExecutor, ExecRequest};
use crate::io::workdir::Exit;

#[derive(Debug, Clone)]
enum MemNode {
    Dir,
    File(Vec<u8>),
}

/// [`FileSystem`] held in memory. Paths are relative; `""` and `.` are the
/// root, which always exists.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    nodes: RefCell<BTreeMap<String, MemNode>>,
    unreadable: RefCell<BTreeSet<String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` and any missing parents.
    pub fn mkdir_all(&self, path: &str) {
        let path = normalize(path);
        let mut nodes = self.nodes.borrow_mut();
        let mut current = String::new();
        for component in path.split('/').filter(|c| !c.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(component);
            nodes.entry(current.clone()).or_insert(MemNode::Dir);
        }
    }

    /// Write a file, creating missing parent directories.
    pub fn write_file(&self, path: &str, contents: &str) {
        let path = normalize(path);
        if let Some((parent, _)) = path.rsplit_once('/') {
            self.mkdir_all(parent);
        }
        self.nodes
            .borrow_mut()
            .insert(path, MemNode::File(contents.as_bytes().to_vec()));
    }

    /// Make `read_dir` on `path` fail with permission denied. The directory
    /// still exists and reports as one.
    pub fn deny_read(&self, path: &str) {
        self.unreadable.borrow_mut().insert(normalize(path));
    }

    /// Contents of a file, if present.
    pub fn read_file(&self, path: &str) -> Option<String> {
        match self.nodes.borrow().get(&normalize(path)) {
            Some(MemNode::File(bytes)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    fn node(&self, path: &str) -> Option<MemNode> {
        let path = normalize(path);
        if path.is_empty() {
            return Some(MemNode::Dir);
        }
        self.nodes.borrow().get(&path).cloned()
    }
}

impl FileSystem for MemoryFileSystem {
    fn is_dir(&self, path: &str) -> io::Result<bool> {
        match self.node(path) {
            Some(MemNode::Dir) => Ok(true),
            Some(MemNode::File(_)) => Ok(false),
            None => Err(not_found(path)),
        }
    }

    fn read_dir(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        match self.node(path) {
            Some(MemNode::Dir) => {}
            Some(MemNode::File(_)) => {
                return Err(io::Error::other(format!("{path:?} is not a directory")));
            }
            None => return Err(not_found(path)),
        }
        let path = normalize(path);
        if self.unreadable.borrow().contains(&path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{path:?} is not readable"),
            ));
        }
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{path}/")
        };
        let nodes = self.nodes.borrow();
        let entries = nodes
            .iter()
            .filter_map(|(key, node)| {
                let name = key.strip_prefix(&prefix)?;
                if name.is_empty() || name.contains('/') {
                    return None;
                }
                let kind = match node {
                    MemNode::Dir => EntryKind::Dir,
                    MemNode::File(_) => EntryKind::File,
                };
                Some(DirEntry::new(name, kind))
            })
            .collect();
        Ok(entries)
    }

    fn exists(&self, path: &str) -> bool {
        self.node(path).is_some()
    }

    fn remove_file(&self, path: &str) -> io::Result<()> {
        match self.node(path) {
            Some(MemNode::File(_)) => {
                self.nodes.borrow_mut().remove(&normalize(path));
                Ok(())
            }
            Some(MemNode::Dir) => Err(io::Error::other(format!("{path:?} is a directory"))),
            None => Err(not_found(path)),
        }
    }
}

fn normalize(path: &str) -> String {
    let mut path = canonical_path(path);
    while let Some(rest) = path.strip_prefix("./") {
        path = rest.to_string();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed == "." {
        String::new()
    } else {
        trimmed.to_string()
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{path:?} does not exist"))
}

/// [`EnvStore`] backed by a map; counts mutations.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: RefCell<BTreeMap<String, OsString>>,
    mutations: Cell<usize>,
}

impl MapEnv {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(name, value)| (name.to_string(), OsString::from(value)))
            .collect();
        Self {
            vars: RefCell::new(vars),
            mutations: Cell::new(0),
        }
    }

    /// Current variables, for before/after comparisons.
    pub fn snapshot(&self) -> BTreeMap<String, OsString> {
        self.vars.borrow().clone()
    }

    /// A variable's value as text, for assertions.
    pub fn value(&self, name: &str) -> Option<String> {
        self.vars
            .borrow()
            .get(name)
            .map(|value| value.to_string_lossy().into_owned())
    }

    /// Number of `set_var`/`remove_var` calls so far.
    pub fn mutations(&self) -> usize {
        self.mutations.get()
    }
}

impl EnvStore for MapEnv {
    fn var(&self, name: &str) -> Option<OsString> {
        self.vars.borrow().get(name).cloned()
    }

    fn set_var(&self, name: &str, value: &OsStr) {
        self.mutations.set(self.mutations.get() + 1);
        self.vars
            .borrow_mut()
            .insert(name.to_string(), value.to_os_string());
    }

    fn remove_var(&self, name: &str) {
        self.mutations.set(self.mutations.get() + 1);
        self.vars.borrow_mut().remove(name);
    }
}

/// [`Printer`] that keeps every line.
#[derive(Debug, Default)]
pub struct RecordingPrinter {
    lines: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
}

impl RecordingPrinter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl Printer for RecordingPrinter {
    fn println(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }

    fn eprintln(&self, line: &str) {
        self.errors.borrow_mut().push(line.to_string());
    }
}

/// A command the [`ScriptedExecutor`] was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCall {
    pub command_line: String,
    pub workdir: String,
}

/// [`CommandExecutor`] that records calls and replays scripted outcomes.
///
/// Outcomes are consumed in order; once they run out, `default_outcome`
/// applies. Every call writes `output` to the capture buffer.
#[derive(Debug)]
pub struct ScriptedExecutor {
    outcomes: RefCell<VecDeque<bool>>,
    default_outcome: bool,
    output: Vec<u8>,
    calls: RefCell<Vec<ExecCall>>,
}

impl ScriptedExecutor {
    pub fn succeeding() -> Self {
        Self::with_default(true)
    }

    pub fn failing() -> Self {
        Self::with_default(false)
    }

    fn with_default(default_outcome: bool) -> Self {
        Self {
            outcomes: RefCell::new(VecDeque::new()),
            default_outcome,
            output: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Replay `outcomes` first, then fall back to success.
    pub fn scripted(outcomes: &[bool]) -> Self {
        let executor = Self::succeeding();
        executor.outcomes.borrow_mut().extend(outcomes);
        executor
    }

    pub fn with_output(mut self, output: &str) -> Self {
        self.output = output.as_bytes().to_vec();
        self
    }

    pub fn calls(&self) -> Vec<ExecCall> {
        self.calls.borrow().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|call| call.command_line.clone())
            .collect()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn exec(&self, request: &ExecRequest<'_>, output: &mut Vec<u8>) -> Result<bool> {
        self.calls.borrow_mut().push(ExecCall {
            command_line: request.command_line.to_string(),
            workdir: request.workdir.to_string(),
        });
        output.extend_from_slice(&self.output);
        let outcome = self
            .outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.default_outcome);
        Ok(outcome)
    }
}

/// [`Exit`] that panics with `exit(<code>)`, observable with
/// `#[should_panic(expected = "exit(1)")]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicExit;

impl Exit for PanicExit {
    fn exit(&self, code: i32) -> ! {
        panic!("exit({code})")
    }
}

/// One of each fake, lent out as a [`Toolbox`].
#[derive(Debug)]
pub struct Fakes {
    pub fs: MemoryFileSystem,
    pub env: MapEnv,
    pub executor: ScriptedExecutor,
    pub printer: RecordingPrinter,
    pub exit: PanicExit,
}

impl Default for Fakes {
    fn default() -> Self {
        Self::with_executor(ScriptedExecutor::succeeding())
    }
}

impl Fakes {
    pub fn with_executor(executor: ScriptedExecutor) -> Self {
        Self {
            fs: MemoryFileSystem::new(),
            env: MapEnv::default(),
            executor,
            printer: RecordingPrinter::default(),
            exit: PanicExit,
        }
    }

    pub fn toolbox(&self) -> Toolbox<'_> {
        Toolbox {
            fs: &self.fs,
            env: &self.env,
            executor: &self.executor,
            printer: &self.printer,
            exit: &self.exit,
        }
    }
}

/// A temporary directory containing a `.git` marker, usable as a working root
/// on the real filesystem.
pub struct TempRepo {
    dir: tempfile::TempDir,
    root: String,
}

impl TempRepo {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        fs::create_dir(dir.path().join(".git")).context("create .git marker")?;
        let root = dir
            .path()
            .to_str()
            .ok_or_else(|| anyhow!("temp dir path is not UTF-8"))?
            .to_string();
        Ok(Self { dir, root })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The root as a string, ready to use as a working directory.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }
}
