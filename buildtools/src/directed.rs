//! One external command bound to a directory and an environment scope.

use tracing::{instrument, warn};

use crate::build::Toolbox;
use crate::core::env_vars::EnvVarDirective;
use crate::io::env::EnvScope;
use crate::io::printer::print_buffer;
use crate::io::process::ExecRequest;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectedCommand {
    pub command: String,
    pub dir: String,
    pub env_vars: Vec<EnvVarDirective>,
}

impl DirectedCommand {
    pub fn new(command: impl Into<String>, dir: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            dir: dir.into(),
            env_vars: Vec::new(),
        }
    }

    pub fn with_env_var(mut self, directive: EnvVarDirective) -> Self {
        self.env_vars.push(directive);
        self
    }

    /// Run the command and print what it wrote. Returns true if it exited
    /// successfully.
    ///
    /// The environment directives apply only while the command runs; they are
    /// reverted before the captured output is printed, even if the executor
    /// panics. A rejected directive batch means the command never runs.
    #[instrument(skip_all, fields(command = %self.command, dir = %self.dir))]
    pub fn execute(&self, tools: &Toolbox<'_>) -> bool {
        let mut output = Vec::new();
        let succeeded = self.run_in_scope(tools, &mut output);
        print_buffer(tools.printer, &output);
        succeeded
    }

    fn run_in_scope(&self, tools: &Toolbox<'_>, output: &mut Vec<u8>) -> bool {
        let Ok(_scope) = EnvScope::enter(tools.env, tools.printer, &self.env_vars) else {
            return false;
        };
        let request = ExecRequest {
            command_line: &self.command,
            workdir: &self.dir,
        };
        match tools.executor.exec(&request, output) {
            Ok(true) => true,
            Ok(false) => {
                warn!("command failed");
                false
            }
            Err(err) => {
                warn!(err = %err, "command could not be run");
                tools.printer.eprintln(&format!("{err:#}"));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::process::CommandExecutor;
    use crate::test_support::{Fakes, MapEnv, ScriptedExecutor};
    use anyhow::{Result, anyhow};
    use std::cell::RefCell;

    #[test]
    fn successful_command_prints_trimmed_output() {
        let fakes = Fakes::with_executor(ScriptedExecutor::succeeding().with_output("ok\n\n"));
        let command = DirectedCommand::new("go test ./...", "repo");

        assert!(command.execute(&fakes.toolbox()));
        assert_eq!(fakes.executor.calls().len(), 1);
        assert_eq!(fakes.executor.calls()[0].workdir, "repo");
        assert_eq!(fakes.printer.lines(), vec!["ok"]);
    }

    #[test]
    fn failing_command_still_prints_output() {
        let fakes = Fakes::with_executor(ScriptedExecutor::failing().with_output("FAIL\n"));
        assert!(!DirectedCommand::new("go vet", "").execute(&fakes.toolbox()));
        assert_eq!(fakes.printer.lines(), vec!["FAIL"]);
    }

    #[test]
    fn duplicate_env_batch_never_runs_the_command() {
        let fakes = Fakes::default();
        let command = DirectedCommand::new("go env", "")
            .with_env_var(EnvVarDirective::set("HOME", "/home"))
            .with_env_var(EnvVarDirective::set("HOME", "/home"));

        assert!(!command.execute(&fakes.toolbox()));
        assert!(fakes.executor.calls().is_empty());
        assert_eq!(fakes.env.mutations(), 0);
    }

    /// Records the value of one variable at the moment the command runs.
    struct ProbeExecutor<'a> {
        env: &'a MapEnv,
        name: &'static str,
        seen: RefCell<Vec<Option<String>>>,
        outcome: Result<bool, &'static str>,
    }

    impl CommandExecutor for ProbeExecutor<'_> {
        fn exec(&self, _request: &ExecRequest<'_>, _output: &mut Vec<u8>) -> Result<bool> {
            self.seen.borrow_mut().push(self.env.value(self.name));
            self.outcome.map_err(|msg| anyhow!(msg))
        }
    }

    fn probe_run(outcome: Result<bool, &'static str>) -> (bool, Fakes, Vec<Option<String>>) {
        let fakes = Fakes {
            env: MapEnv::from_pairs(&[("GOPROXY", "https://proxy.golang.org")]),
            ..Fakes::default()
        };
        let probe = ProbeExecutor {
            env: &fakes.env,
            name: "GOPROXY",
            seen: RefCell::new(Vec::new()),
            outcome,
        };
        let tools = Toolbox {
            executor: &probe,
            ..fakes.toolbox()
        };
        let command = DirectedCommand::new("go get -u ./...", "repo")
            .with_env_var(EnvVarDirective::set("GOPROXY", "direct"));
        let succeeded = command.execute(&tools);
        let seen = probe.seen.into_inner();
        (succeeded, fakes, seen)
    }

    #[test]
    fn env_applies_during_run_and_is_restored_after_failure() {
        for outcome in [Ok(true), Ok(false), Err("spawn failed")] {
            let expected = outcome == Ok(true);
            let (succeeded, fakes, seen) = probe_run(outcome);
            assert_eq!(succeeded, expected);
            assert_eq!(seen, vec![Some("direct".to_string())]);
            assert_eq!(
                fakes.env.value("GOPROXY").as_deref(),
                Some("https://proxy.golang.org")
            );
        }
    }

    #[test]
    fn env_is_restored_before_output_is_printed() {
        let fakes = Fakes::with_executor(ScriptedExecutor::succeeding().with_output("done\n"));
        let command = DirectedCommand::new("go mod tidy", "")
            .with_env_var(EnvVarDirective::unset("GOFLAGS"));

        assert!(command.execute(&fakes.toolbox()));
        assert_eq!(
            fakes.printer.lines(),
            vec![
                "GOFLAGS was not set",
                "unsetting GOFLAGS",
                "restoring (unsetting): GOFLAGS",
                "done",
            ]
        );
    }

    #[test]
    fn spawn_errors_are_reported() {
        let (succeeded, fakes, _) = probe_run(Err("spawn go: not found"));
        assert!(!succeeded);
        assert_eq!(fakes.printer.errors(), vec!["spawn go: not found"]);
    }
}
