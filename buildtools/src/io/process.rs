//! Running external tools with their combined output captured.

use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument};

/// One external command invocation.
#[derive(Debug, Clone, Copy)]
pub struct ExecRequest<'a> {
    /// Program and arguments, quoted with POSIX shell rules.
    pub command_line: &'a str,
    /// Directory to run in; empty means the current directory.
    pub workdir: &'a str,
}

/// Abstraction over process execution, so task logic can be tested without
/// spawning tools.
pub trait CommandExecutor {
    /// Run the command to completion, appending everything it writes to stdout
    /// and stderr to `output`. Returns whether it exited successfully; errors
    /// mean it could not be run at all.
    fn exec(&self, request: &ExecRequest<'_>, output: &mut Vec<u8>) -> Result<bool>;
}

/// [`CommandExecutor`] that spawns the program directly (no shell).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    #[instrument(skip_all, fields(command = request.command_line, workdir = request.workdir))]
    fn exec(&self, request: &ExecRequest<'_>, output: &mut Vec<u8>) -> Result<bool> {
        let argv = split_command_line(request.command_line)?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| anyhow!("empty command line"))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if !request.workdir.is_empty() {
            cmd.current_dir(request.workdir);
        }

        debug!("spawning child process");
        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(e) => {
                error!(err = %e, "failed to spawn command");
                return Err(e).with_context(|| format!("spawn {program}"));
            }
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout was not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("stderr was not piped"))?;

        // Both streams feed one buffer, interleaved in arrival order.
        let captured = Arc::new(Mutex::new(Vec::new()));
        let stdout_sink = Arc::clone(&captured);
        let stderr_sink = Arc::clone(&captured);
        let stdout_handle = thread::spawn(move || drain_into(stdout, &stdout_sink));
        let stderr_handle = thread::spawn(move || drain_into(stderr, &stderr_sink));

        let status = child.wait().context("wait for command")?;
        join_output(stdout_handle).context("join stdout")?;
        join_output(stderr_handle).context("join stderr")?;

        let captured = captured
            .lock()
            .map_err(|_| anyhow!("output buffer poisoned"))?;
        output.extend_from_slice(&captured);

        debug!(exit_code = ?status.code(), "command finished");
        Ok(status.success())
    }
}

/// Split a command line into program and arguments.
pub fn split_command_line(command_line: &str) -> Result<Vec<String>> {
    shlex::split(command_line).ok_or_else(|| anyhow!("unbalanced quoting in {command_line:?}"))
}

fn join_output(handle: thread::JoinHandle<Result<()>>) -> Result<()> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn drain_into<R: Read>(mut reader: R, sink: &Mutex<Vec<u8>>) -> Result<()> {
    let mut chunk = [0u8; 8192];
    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        sink.lock()
            .map_err(|_| anyhow!("output buffer poisoned"))?
            .extend_from_slice(&chunk[..n]);
    }
    Ok(())
}
