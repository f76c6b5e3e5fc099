//! Task functions: each runs one or more external tools against the working
//! root and reports whether they all succeeded.
//!
//! Tasks that need a tool installed first stop as soon as the install fails.
//! Multi-step tasks stop at the first failing step.

use tracing::{info, warn};

use crate::build::Build;
use crate::core::command_line::{
    self, DEADCODE_PACKAGE, DEPENDENCY_FETCH, DEPENDENCY_TIDY, LINT, LINT_PACKAGE, NIL_AWAY,
    NIL_AWAY_PACKAGE, UNIT_TESTS, VULNERABILITY_CHECK, VULNERABILITY_PACKAGE,
};
use crate::core::env_vars::EnvVarDirective;
use crate::core::matchers::{match_any_go_file, match_go_source, match_module_file};
use crate::core::path::{is_illegal_file_name, join_dir};
use crate::directed::DirectedCommand;
use crate::exit_codes;

impl Build<'_> {
    /// Run `command` in the working root, printing its output.
    pub fn run_command(&self, command: &str) -> bool {
        DirectedCommand::new(command, self.working_dir()).execute(self.tools())
    }

    /// `go install -v <package>@latest`.
    pub fn install(&self, package: &str) -> bool {
        self.print(&format!("installing the latest version of {package}"));
        self.run_command(&command_line::install_command(package))
    }

    /// Reformat every Go file under the working root.
    pub fn format(&self) -> bool {
        self.print("cleaning up source code formatting");
        self.run_command(command_line::FORMAT)
    }

    /// Reformat Go files outside the `exclusions` directories (relative to the
    /// working root). Without exclusions this is [`Build::format`].
    pub fn format_selective(&self, exclusions: &[&str]) -> bool {
        if exclusions.is_empty() {
            return self.format();
        }
        self.print(&format!(
            "cleaning up source code formatting, excluding folders [{}]",
            exclusions.join(" ")
        ));
        let Ok(dirs) = self.relevant_dirs(match_any_go_file) else {
            return false;
        };
        let root_files = self.root_files(match_any_go_file);
        self.run_command(&command_line::selective_format_command(
            &dirs,
            &root_files,
            exclusions,
        ))
    }

    /// `go generate -x ./...`.
    pub fn generate(&self) -> bool {
        self.print("running go generate");
        self.run_command(command_line::GENERATE)
    }

    /// Run the unit tests with a coverage profile written to `coverage_file`
    /// (relative to the working root), then open the HTML report. The report
    /// is only shown if the tests pass.
    pub fn generate_coverage_report(&self, coverage_file: &str) -> bool {
        if is_illegal_file_name(coverage_file) {
            self.tools().printer.eprintln(&format!(
                "cannot accept {coverage_file:?} as a valid file name to which coverage data can be written"
            ));
            return false;
        }
        self.print(&format!(
            "executing unit tests, writing coverage data to {coverage_file:?}"
        ));
        if !self.run_command(&command_line::coverage_profile_command(coverage_file)) {
            return false;
        }
        self.print(&format!("displaying coverage report from {coverage_file:?}"));
        self.run_command(&command_line::coverage_report_command(coverage_file))
    }

    /// `go doc -all` for every directory holding non-test Go source, except
    /// those under `excluded_dirs`.
    pub fn generate_documentation(&self, excluded_dirs: &[&str]) -> bool {
        let Ok(dirs) = self.relevant_dirs(match_go_source) else {
            return false;
        };
        dirs.iter()
            .filter(|dir| !command_line::is_excluded(dir, excluded_dirs))
            .all(|dir| {
                DirectedCommand::new(command_line::doc_command(dir), self.working_dir())
                    .execute(self.tools())
            })
    }

    /// Install gocritic and lint with every check enabled.
    pub fn lint(&self) -> bool {
        if !self.install(LINT_PACKAGE) {
            return false;
        }
        self.print("linting source code");
        self.run_command(LINT)
    }

    /// Install nilaway and look for possible nil dereferences.
    pub fn nil_away(&self) -> bool {
        if !self.install(NIL_AWAY_PACKAGE) {
            return false;
        }
        self.print("running nilaway analysis");
        self.run_command(NIL_AWAY)
    }

    /// `go test -cover ./...`.
    pub fn unit_tests(&self) -> bool {
        self.print("running all unit tests");
        self.run_command(UNIT_TESTS)
    }

    /// Install govulncheck and check dependencies for known vulnerabilities.
    pub fn vulnerability_check(&self) -> bool {
        if !self.install(VULNERABILITY_PACKAGE) {
            return false;
        }
        self.print("running vulnerability checks");
        self.run_command(VULNERABILITY_CHECK)
    }

    /// Install deadcode and report unreachable functions. The `-f` template and
    /// `-test` flag follow the `[deadcode]` configuration.
    pub fn deadcode(&self) -> bool {
        if !self.install(DEADCODE_PACKAGE) {
            return false;
        }
        let deadcode = &self.config().deadcode;
        let template = deadcode.format.then_some(deadcode.template.as_str());
        self.print("running dead code analysis");
        self.run_command(&command_line::deadcode_command(
            template,
            deadcode.include_tests,
        ))
    }

    /// Update and tidy every module under the working root.
    ///
    /// With `aggressive` set, the fetch bypasses the module proxy for that
    /// command only.
    pub fn update_dependencies(&self) -> bool {
        let Ok(dirs) = self.relevant_dirs(match_module_file) else {
            return false;
        };
        for dir in &dirs {
            let path = self.root_path(dir);
            let mut fetch = DirectedCommand::new(DEPENDENCY_FETCH, path.as_str());
            if self.config().aggressive {
                fetch = fetch.with_env_var(EnvVarDirective::set("GOPROXY", "direct"));
            }
            self.print(&format!("{path:?}: updating dependencies"));
            if !fetch.execute(self.tools()) {
                return false;
            }
            self.print(&format!("{path:?}: pruning go.mod and go.sum"));
            if !DirectedCommand::new(DEPENDENCY_TIDY, path.as_str()).execute(self.tools()) {
                return false;
            }
        }
        true
    }

    /// Delete `files` (relative to the working root). Files that do not exist
    /// are skipped.
    ///
    /// Every name is checked before anything is deleted; an empty name, an
    /// absolute path or one with a `..` component ends the build.
    pub fn clean(&self, files: &[&str]) {
        if let Some(file) = files.iter().find(|file| is_illegal_file_name(file)) {
            self.tools().printer.eprintln(&format!(
                "file {file:?} will not be removed, exiting the build"
            ));
            self.tools().exit.exit(exit_codes::FATAL);
        }
        let fs = self.tools().fs;
        for file in files {
            let path = join_dir(self.working_dir(), file);
            if !fs.exists(&path) {
                continue;
            }
            match fs.remove_file(&path) {
                Ok(()) => info!(path = %path, "removed"),
                Err(err) => warn!(path = %path, err = %err, "could not remove"),
            }
        }
    }

    fn root_path(&self, dir: &str) -> String {
        if dir.is_empty() {
            self.working_dir().to_string()
        } else {
            join_dir(self.working_dir(), dir)
        }
    }

    /// Names of non-directory entries directly in the working root accepted
    /// by `matcher`.
    fn root_files<M>(&self, matcher: M) -> Vec<String>
    where
        M: Fn(&str) -> bool,
    {
        self.tools()
            .fs
            .read_dir(self.working_dir())
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| !entry.is_dir() && matcher(&entry.name))
            .map(|entry| entry.name)
            .collect()
    }
}
