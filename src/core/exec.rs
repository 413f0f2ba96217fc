//! External command execution with a hard timeout.

use crate::core::coordinator::CancelToken;
use crate::core::error::DeployCheckError;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Discard stdout/stderr.
    Suppress,
    /// Collect stdout/stderr into the outcome.
    Capture,
}

#[derive(Debug)]
pub struct CommandOutcome {
    pub status: ExitStatus,
    pub elapsed: Duration,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn exit_label(&self) -> String {
        match self.status.code() {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }

    /// Last `max_lines` non-empty lines of stderr, falling back to stdout.
    pub fn output_tail(&self, max_lines: usize) -> Vec<String> {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let lines: Vec<&str> = source.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(max_lines);
        lines[start..].iter().map(|l| l.trim_end().to_string()).collect()
    }
}

pub fn display_command(argv: &[String]) -> String {
    argv.join(" ")
}

fn stdio_for(mode: OutputMode) -> (Stdio, Stdio) {
    match mode {
        OutputMode::Suppress => (Stdio::null(), Stdio::null()),
        OutputMode::Capture => (Stdio::piped(), Stdio::piped()),
    }
}

fn drain<R: Read + Send + 'static>(source: Option<R>) -> Option<JoinHandle<String>> {
    source.map(|mut r| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = r.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Put the child in a fresh process group so the whole tree it spawns can be
/// signalled at once.
#[cfg(unix)]
fn own_process_group(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(unix))]
fn own_process_group(_command: &mut Command) {}

#[cfg(unix)]
fn kill_group(child: &Child) {
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: plain syscall; the group was created by `own_process_group`.
        unsafe {
            libc::kill(-pgid, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

fn kill_and_reap(child: &mut Child) {
    kill_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

/// Run `argv` in `cwd`, blocking until it exits or `timeout` elapses.
///
/// On timeout the child's whole process group is killed and `Timeout` is
/// returned. A cancelled `cancel` token kills it the same way. Captured output
/// is drained on helper threads so a chatty child cannot stall on a full pipe.
pub fn run_with_timeout(
    argv: &[String],
    cwd: &Path,
    timeout: Duration,
    mode: OutputMode,
    cancel: Option<&CancelToken>,
) -> Result<CommandOutcome, DeployCheckError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| DeployCheckError::ConfigError("empty command".to_string()))?;
    let command = display_command(argv);

    let (stdout, stderr) = stdio_for(mode);
    let start = Instant::now();
    let mut builder = Command::new(program);
    builder
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr);
    own_process_group(&mut builder);
    let mut child = builder
        .spawn()
        .map_err(|e| DeployCheckError::SubprocessFailure {
            command: command.clone(),
            detail: format!("failed to start: {}", e),
        })?;

    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if start.elapsed() > timeout {
            kill_and_reap(&mut child);
            return Err(DeployCheckError::Timeout {
                command,
                limit: timeout,
            });
        }
        if cancel.is_some_and(CancelToken::is_cancelled) {
            kill_and_reap(&mut child);
            return Err(DeployCheckError::SubprocessFailure {
                command,
                detail: "cancelled".to_string(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };
    let elapsed = start.elapsed();

    Ok(CommandOutcome {
        status,
        elapsed,
        stdout: collect(stdout_reader),
        stderr: collect(stderr_reader),
    })
}
