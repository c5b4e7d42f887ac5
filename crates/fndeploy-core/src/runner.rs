//! Synchronous invocation of external executables.
//!
//! Every pipeline component talks to the outside world through
//! [`CommandRunner`], so tests can swap in a scripted implementation while
//! production uses [`ProcessRunner`]. One call spawns exactly one child
//! process; nothing here retries.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::config::CliConfig;
use crate::error::{DeployError, Result};
use crate::types::CommandResult;

pub trait CommandRunner: Send + Sync {
    /// Name of the executable, used when describing commands in errors.
    fn program(&self) -> &str;

    /// Run `program args...` and capture its exit status and both streams.
    /// Only spawn problems and timeouts are errors here; a non-zero exit is
    /// reported through [`CommandResult::code`].
    fn exec(&self, args: &[String], cwd: Option<&Path>) -> Result<CommandResult>;

    /// Like [`exec`](Self::exec) but a non-zero exit becomes
    /// [`DeployError::CommandFailed`]. Returns trimmed stdout.
    fn run(&self, args: &[String], cwd: Option<&Path>) -> Result<String> {
        let result = self.exec(args, cwd)?;
        if !result.success() {
            return Err(DeployError::CommandFailed {
                command: describe(self.program(), args),
                code: result.code,
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(result.stdout.trim().to_string())
    }
}

/// Render a command line for logs and error messages.
pub fn describe(program: &str, args: &[String]) -> String {
    let mut out = program.to_string();
    for arg in args {
        out.push(' ');
        out.push_str(arg);
    }
    out
}

// ---------------------------------------------------------------------------
// ProcessRunner
// ---------------------------------------------------------------------------

/// Runs commands as real child processes.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    binary: String,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            env: BTreeMap::new(),
            timeout: None,
        }
    }

    pub fn from_config(cli: &CliConfig) -> Self {
        Self {
            env: cli.env.clone(),
            timeout: cli.timeout_seconds.map(Duration::from_secs),
            ..Self::new(cli.binary.clone())
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn program(&self) -> &str {
        &self.binary
    }

    fn exec(&self, args: &[String], cwd: Option<&Path>) -> Result<CommandResult> {
        let command = describe(&self.binary, args);
        tracing::debug!(command = %command, cwd = ?cwd, "exec");

        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| DeployError::CommandSpawn {
            command: command.clone(),
            message: e.to_string(),
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            None => child.wait()?,
            Some(limit) => match wait_with_timeout(child, limit)? {
                Some(status) => status,
                None => {
                    tracing::warn!(command = %command, seconds = limit.as_secs(), "command timed out");
                    return Err(DeployError::CommandTimedOut {
                        command,
                        seconds: limit.as_secs(),
                    });
                }
            },
        };

        let result = CommandResult {
            code: status.code(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        };
        tracing::debug!(command = %command, code = ?result.code, "exit");
        Ok(result)
    }
}

/// Read a child stream to completion on a helper thread so neither pipe can
/// fill up and block the child while we wait on the other.
fn drain<R: Read + Send + 'static>(stream: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut r) = stream {
            let _ = r.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Wait for `child` on a helper thread so the timeout is a plain
/// `recv_timeout`. On expiry the child is killed by pid and `None` is
/// returned; the helper thread reaps it once it dies.
fn wait_with_timeout(mut child: Child, limit: Duration) -> Result<Option<ExitStatus>> {
    let pid = child.id();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(child.wait());
    });

    match rx.recv_timeout(limit) {
        Ok(status) => Ok(Some(status?)),
        Err(_) => {
            kill_process(pid);
            Ok(None)
        }
    }
}

/// SIGKILL by pid. Best-effort; errors are ignored.
#[cfg(unix)]
fn kill_process(pid: u32) {
    let _ = Command::new("kill")
        .args(["-9", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}

#[cfg(windows)]
fn kill_process(pid: u32) {
    let _ = Command::new("taskkill")
        .args(["/F", "/PID", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
}
