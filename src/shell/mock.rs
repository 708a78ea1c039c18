//! Scripted process runner for testing.
//!
//! `MockRunner` implements [`ProcessRunner`] with commands that emit
//! scripted output and exit at scripted points in virtual time. It shares a
//! [`MockTimer`] with the code under test: waiting on a mock process
//! advances the clock instead of sleeping.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use prereqs::shell::{CommandOptions, MockRunner, ProcessEvent, ProcessRunner, ScriptedCommand};
//! use prereqs::timer::{MockTimer, TimerSource};
//!
//! let timer = MockTimer::new();
//! let runner = MockRunner::new(timer.clone());
//! runner.script("fnm install 20", ScriptedCommand::exits_after(Duration::from_secs(5)));
//!
//! let mut process = runner.spawn("fnm install 20", &CommandOptions::default()).unwrap();
//! assert_eq!(process.next_event(Duration::from_secs(1)).unwrap(), ProcessEvent::Pending);
//! assert_eq!(timer.now(), Duration::from_secs(1));
//!
//! assert_eq!(process.next_event(Duration::from_secs(10)).unwrap(), ProcessEvent::Exited(Some(0)));
//! assert_eq!(timer.now(), Duration::from_secs(5));
//! assert_eq!(runner.spawned(), vec!["fnm install 20".to_string()]);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{PrereqError, Result};
use crate::timer::{MockTimer, TimerSource};

use super::command::{CommandOptions, OutputLine, ProcessEvent, ProcessRunner, RunningProcess};

/// How a scripted command behaves once spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCommand {
    /// Output lines and their offsets from the spawn time.
    pub output: Vec<(Duration, OutputLine)>,

    /// Offset from the spawn time at which the command exits.
    pub exit_after: Duration,

    /// Exit code; `None` simulates death by signal.
    pub exit_code: Option<i32>,

    /// Fail at spawn time with this message instead of running.
    pub spawn_error: Option<String>,
}

impl ScriptedCommand {
    /// Exit with code 0 after `after`.
    pub fn exits_after(after: Duration) -> Self {
        Self {
            output: Vec::new(),
            exit_after: after,
            exit_code: Some(0),
            spawn_error: None,
        }
    }

    /// Exit with `code` after `after`.
    pub fn fails_after(after: Duration, code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::exits_after(after)
        }
    }

    /// Refuse to start.
    pub fn spawn_error(message: &str) -> Self {
        Self {
            spawn_error: Some(message.to_string()),
            ..Self::exits_after(Duration::ZERO)
        }
    }

    /// Emit a stdout line `at` after spawning.
    pub fn with_output(mut self, at: Duration, line: &str) -> Self {
        self.output.push((at, OutputLine::Stdout(line.to_string())));
        self
    }
}

#[derive(Debug, Default)]
struct RunnerState {
    scripts: HashMap<String, VecDeque<ScriptedCommand>>,
    spawned: Vec<String>,
    options: Vec<CommandOptions>,
}

/// Process runner driven by scripts and virtual time.
///
/// Commands without a script exit immediately with code 0. Scripts queued
/// for the same command line are used in order, the last one repeating.
#[derive(Debug, Clone)]
pub struct MockRunner {
    timer: MockTimer,
    state: Arc<Mutex<RunnerState>>,
}

impl MockRunner {
    /// Create a runner that advances `timer` while waiting.
    pub fn new(timer: MockTimer) -> Self {
        Self {
            timer,
            state: Arc::new(Mutex::new(RunnerState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, RunnerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a script for a command line.
    pub fn script(&self, command: &str, script: ScriptedCommand) {
        self.state()
            .scripts
            .entry(command.to_string())
            .or_default()
            .push_back(script);
    }

    /// Command lines spawned so far, in order.
    pub fn spawned(&self) -> Vec<String> {
        self.state().spawned.clone()
    }

    /// Options passed with each spawn, in order.
    pub fn spawn_options(&self) -> Vec<CommandOptions> {
        self.state().options.clone()
    }

    fn next_script(&self, command: &str) -> ScriptedCommand {
        let mut state = self.state();
        match state.scripts.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(default_script),
            Some(queue) => queue.front().cloned().unwrap_or_else(default_script),
            None => default_script(),
        }
    }
}

fn default_script() -> ScriptedCommand {
    ScriptedCommand::exits_after(Duration::ZERO)
}

impl ProcessRunner for MockRunner {
    fn spawn(&self, command: &str, options: &CommandOptions) -> Result<Box<dyn RunningProcess>> {
        let script = self.next_script(command);
        {
            let mut state = self.state();
            state.spawned.push(command.to_string());
            state.options.push(options.clone());
        }

        if let Some(message) = script.spawn_error {
            return Err(PrereqError::SpawnFailed {
                command: command.to_string(),
                message,
            });
        }

        let started = self.timer.now();
        let mut events: Vec<(Duration, ProcessEvent)> = script
            .output
            .into_iter()
            .filter(|(at, _)| *at <= script.exit_after)
            .map(|(at, line)| (started + at, ProcessEvent::Output(line)))
            .collect();
        // Stable sort keeps declaration order for simultaneous lines.
        events.sort_by_key(|(at, _)| *at);
        events.push((
            started + script.exit_after,
            ProcessEvent::Exited(script.exit_code),
        ));

        Ok(Box::new(MockProcess {
            timer: self.timer.clone(),
            events: events.into(),
            exit: None,
        }))
    }
}

struct MockProcess {
    timer: MockTimer,
    events: VecDeque<(Duration, ProcessEvent)>,
    exit: Option<Option<i32>>,
}

impl RunningProcess for MockProcess {
    fn next_event(&mut self, timeout: Duration) -> Result<ProcessEvent> {
        if let Some(code) = self.exit {
            return Ok(ProcessEvent::Exited(code));
        }

        let deadline = self.timer.now() + timeout;
        match self.events.front() {
            Some((at, _)) if *at <= deadline => {
                let at = *at;
                let event = self
                    .events
                    .pop_front()
                    .map(|(_, event)| event)
                    .unwrap_or(ProcessEvent::Pending);
                self.timer.advance_to(at);
                if let ProcessEvent::Exited(code) = event {
                    self.exit = Some(code);
                }
                Ok(event)
            }
            _ => {
                self.timer.advance_to(deadline);
                Ok(ProcessEvent::Pending)
            }
        }
    }
}
