//! The build context: injected collaborators, configuration and the working
//! root they all share.

use std::cell::OnceCell;

use anyhow::Result;
use tracing::warn;

use crate::exit_codes;
use crate::io::config::BuildConfig;
use crate::io::dirs::relevant_dirs_under;
use crate::io::env::{EnvStore, OsEnv};
use crate::io::fs::{FileSystem, OsFileSystem};
use crate::io::printer::{Printer, StdoutPrinter};
use crate::io::process::{CommandExecutor, ProcessExecutor};
use crate::io::workdir::{Exit, ProcessExit, resolve_working_dir};

/// Everything a build step may touch outside its own memory.
#[derive(Clone, Copy)]
pub struct Toolbox<'a> {
    pub fs: &'a dyn FileSystem,
    pub env: &'a dyn EnvStore,
    pub executor: &'a dyn CommandExecutor,
    pub printer: &'a dyn Printer,
    pub exit: &'a dyn Exit,
}

impl Toolbox<'static> {
    /// The real filesystem, environment, processes and console.
    pub fn os() -> Self {
        Self {
            fs: &OsFileSystem,
            env: &OsEnv,
            executor: &ProcessExecutor,
            printer: &StdoutPrinter,
            exit: &ProcessExit,
        }
    }
}

/// Shared state for one build run.
///
/// The working root is resolved on first use and kept for the life of the
/// value.
pub struct Build<'a> {
    tools: Toolbox<'a>,
    config: BuildConfig,
    working_dir: OnceCell<String>,
}

impl<'a> Build<'a> {
    pub fn new(tools: Toolbox<'a>, config: BuildConfig) -> Self {
        Self {
            tools,
            config,
            working_dir: OnceCell::new(),
        }
    }

    /// A build whose working root is already known; it is not validated.
    pub fn with_working_dir(
        tools: Toolbox<'a>,
        config: BuildConfig,
        working_dir: impl Into<String>,
    ) -> Self {
        Self {
            tools,
            config,
            working_dir: OnceCell::from(working_dir.into()),
        }
    }

    pub fn tools(&self) -> &Toolbox<'a> {
        &self.tools
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// The working root. Resolved and validated on first call; if no
    /// acceptable root can be found the build exits with
    /// [`exit_codes::FATAL`].
    pub fn working_dir(&self) -> &str {
        if let Some(dir) = self.working_dir.get() {
            return dir.as_str();
        }
        match resolve_working_dir(self.tools.fs, self.tools.env, &self.config) {
            Ok(dir) => self.working_dir.get_or_init(|| dir).as_str(),
            Err(err) => {
                self.tools.printer.eprintln(&format!("{err:#}"));
                self.tools.exit.exit(exit_codes::FATAL)
            }
        }
    }

    /// Directories under the working root that directly contain a file
    /// accepted by `matcher`, relative to the root (which is `""`).
    pub fn relevant_dirs<M>(&self, matcher: M) -> Result<Vec<String>>
    where
        M: Fn(&str) -> bool,
    {
        relevant_dirs_under(self.tools.fs, self.working_dir(), matcher).inspect_err(|err| {
            warn!(err = %err, "directory discovery failed");
        })
    }

    /// True if the configuration disables `task`.
    pub fn task_disabled(&self, task: &str) -> bool {
        self.config.task_disabled(task)
    }

    pub(crate) fn print(&self, line: &str) {
        self.tools.printer.println(line);
    }
}
