//! Process runner abstraction and the shell-backed implementation.
//!
//! The step executor only needs three things from a running command: its
//! output lines, its eventual exit code, and the ability to wait for either
//! with a timeout so it can interleave progress ticks. [`ProcessRunner`]
//! captures exactly that, and [`ShellRunner`] provides it for real child
//! processes.

use crate::error::{PrereqError, Result};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::platform::{shell_executable, shell_flag, ShellType};

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,
}

/// Output line from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

impl OutputLine {
    /// Line text regardless of stream.
    pub fn text(&self) -> &str {
        match self {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => s,
        }
    }
}

/// Something observed while waiting on a running command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// A line of output.
    Output(OutputLine),

    /// The command exited; `None` if killed by a signal.
    Exited(Option<i32>),

    /// The wait timed out with nothing to report.
    Pending,
}

/// A command that has been started.
pub trait RunningProcess {
    /// Wait up to `timeout` for the next output line or the exit.
    ///
    /// Output produced before the exit is reported before `Exited`. Once
    /// `Exited` has been returned, later calls return it again.
    fn next_event(&mut self, timeout: Duration) -> Result<ProcessEvent>;
}

/// Starts commands.
pub trait ProcessRunner {
    /// Start `command` as a shell command line.
    fn spawn(&self, command: &str, options: &CommandOptions) -> Result<Box<dyn RunningProcess>>;
}

/// Runs commands through the user's shell.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: PathBuf,
    flag: &'static str,
}

impl ShellRunner {
    /// Use the shell from `$SHELL` (`%COMSPEC%` on Windows).
    pub fn new() -> Self {
        Self::with_shell(shell_executable())
    }

    /// Use a specific shell executable.
    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        let shell = shell.into();
        let flag = shell_flag(ShellType::from_executable(&shell.to_string_lossy()));
        Self { shell, flag }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for ShellRunner {
    fn spawn(&self, command: &str, options: &CommandOptions) -> Result<Box<dyn RunningProcess>> {
        let spawn_failed = |message: String| PrereqError::SpawnFailed {
            command: command.to_string(),
            message,
        };

        let mut cmd = Command::new(&self.shell);
        cmd.arg(self.flag);
        cmd.arg(command);

        if let Some(cwd) = &options.cwd {
            cmd.current_dir(cwd);
        }

        for (key, value) in &options.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| spawn_failed(e.to_string()))?;
        debug!("Spawned '{}' (pid {})", command, child.id());

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_failed("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| spawn_failed("stderr was not captured".to_string()))?;

        let (tx, rx) = mpsc::channel();
        forward_lines(stdout, tx.clone(), OutputLine::Stdout);
        forward_lines(stderr, tx, OutputLine::Stderr);

        Ok(Box::new(ShellProcess {
            child,
            rx,
            exit: None,
        }))
    }
}

/// Poll interval for a command whose output streams are already closed.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Read lines on a background thread until EOF. The sender is dropped at
/// EOF, so the channel disconnects once both streams are closed.
fn forward_lines<R, F>(stream: R, tx: Sender<OutputLine>, wrap: F)
where
    R: Read + Send + 'static,
    F: Fn(String) -> OutputLine + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines().map_while(std::result::Result::ok) {
            if tx.send(wrap(line)).is_err() {
                break;
            }
        }
    });
}

struct ShellProcess {
    child: Child,
    rx: Receiver<OutputLine>,
    exit: Option<Option<i32>>,
}

impl ShellProcess {
    fn finish(&mut self, status: ExitStatus) -> ProcessEvent {
        let code = status.code();
        debug!("Process {} exited with {:?}", self.child.id(), code);
        self.exit = Some(code);
        ProcessEvent::Exited(code)
    }

    /// Wait for the exit without blocking past `deadline`. Used once both
    /// output streams have closed, which a command may do long before it
    /// exits.
    fn wait_until(&mut self, deadline: Instant) -> Result<ProcessEvent> {
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(self.finish(status));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(ProcessEvent::Pending);
            }
            thread::sleep(EXIT_POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl Drop for ShellProcess {
    fn drop(&mut self) {
        // Reap the child if it already exited so no zombie is left behind.
        if self.exit.is_none() {
            let _ = self.child.try_wait();
        }
    }
}

impl RunningProcess for ShellProcess {
    fn next_event(&mut self, timeout: Duration) -> Result<ProcessEvent> {
        if let Some(code) = self.exit {
            return Ok(ProcessEvent::Exited(code));
        }

        let deadline = Instant::now() + timeout;
        match self.rx.recv_timeout(timeout) {
            Ok(line) => Ok(ProcessEvent::Output(line)),
            Err(RecvTimeoutError::Disconnected) => self.wait_until(deadline),
            Err(RecvTimeoutError::Timeout) => {
                // A background grandchild can hold the pipes open after the
                // command itself has exited.
                match self.child.try_wait()? {
                    Some(status) => match self.rx.try_recv() {
                        Ok(line) => Ok(ProcessEvent::Output(line)),
                        Err(TryRecvError::Empty | TryRecvError::Disconnected) => {
                            Ok(self.finish(status))
                        }
                    },
                    None => Ok(ProcessEvent::Pending),
                }
            }
        }
    }
}
