//! Step execution.
//!
//! [`StepExecutor`] runs the commands of one step in order and reports
//! progress as it goes. While a command runs, the executor alternates
//! between waiting on the process and firing progress ticks: each wait is
//! bounded by the time left until the next tick, so neither blocks the
//! other.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::config::{InstallStep, Settings};
use crate::error::{PrereqError, Result};
use crate::progress::{
    aggregate_percent, annotate, split_percent, CommandProgress, OverallProgress,
    ProgressEstimator, ProgressSink, StepStatus, UnifiedProgress,
};
use crate::shell::{CommandOptions, ProcessEvent, ProcessRunner, RunningProcess};
use crate::timer::{TickGuard, TimerSource};

use super::template::{resolve_commands, substitute_version, ResolvedCommand};

/// Timing knobs for step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorSettings {
    /// Interval between progress ticks while a command runs.
    pub tick_interval: Duration,

    /// Elapsed step time after which running updates carry a timer suffix.
    pub elapsed_threshold: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for ExecutorSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            tick_interval: Duration::from_millis(settings.tick_interval_ms.max(1)),
            elapsed_threshold: Duration::from_secs(settings.elapsed_threshold_secs),
        }
    }
}

/// Per-invocation inputs to a step.
#[derive(Debug, Clone, Default)]
pub struct StepContext {
    /// Version substituted into the step's template and display text.
    pub version: Option<String>,

    /// Working directory and environment for the step's commands.
    pub options: CommandOptions,
}

impl StepContext {
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            ..Default::default()
        }
    }
}

/// Result of a step that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Display name, version substituted.
    pub name: String,

    /// `Completed`, or `Skipped` when there was nothing to run.
    pub status: StepStatus,

    /// Number of commands run.
    pub commands_run: usize,

    /// Execution duration.
    pub duration: Duration,
}

impl StepOutcome {
    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        match self.status {
            StepStatus::Skipped => {
                format!("{} {} (nothing to run)", self.status.display_char(), self.name)
            }
            _ => format!(
                "{} {} ({})",
                self.status.display_char(),
                self.name,
                format_duration(self.duration)
            ),
        }
    }
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs == 0 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{}.{}s", secs, millis / 100)
    } else {
        let mins = secs / 60;
        let secs = secs % 60;
        format!("{}m {}s", mins, secs)
    }
}

/// Builds progress updates for one step invocation.
struct Reporter<'s> {
    sink: &'s mut dyn ProgressSink,
    step_index: usize,
    step_count: usize,
    name: String,
    message: String,
    elapsed_threshold: Duration,
}

impl Reporter<'_> {
    fn emit(
        &mut self,
        status: StepStatus,
        step_percent: u8,
        command: Option<(usize, usize, &str)>,
        elapsed: Option<Duration>,
    ) {
        let decorate = |text: &str| match elapsed {
            Some(elapsed) => annotate(text, elapsed, self.elapsed_threshold),
            None => text.to_string(),
        };

        let update = UnifiedProgress {
            overall: OverallProgress {
                step_index: self.step_index,
                step_count: self.step_count,
                step_name: decorate(&self.name),
                percent: aggregate_percent(self.step_index, self.step_count, step_percent),
            },
            step_percent,
            status,
            command: command.map(|(index, count, detail)| CommandProgress {
                index,
                count,
                detail: decorate(detail),
            }),
        };
        self.sink.emit(&update);
    }
}

/// Runs steps through a process runner, timed by a timer source.
pub struct StepExecutor<'a> {
    runner: &'a dyn ProcessRunner,
    timer: &'a dyn TimerSource,
    settings: ExecutorSettings,
}

impl<'a> StepExecutor<'a> {
    /// Create an executor with default settings.
    pub fn new(runner: &'a dyn ProcessRunner, timer: &'a dyn TimerSource) -> Self {
        Self::with_settings(runner, timer, ExecutorSettings::default())
    }

    pub fn with_settings(
        runner: &'a dyn ProcessRunner,
        timer: &'a dyn TimerSource,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            runner,
            timer,
            settings,
        }
    }

    /// Execute one step as invocation `step_index` of `step_count`.
    ///
    /// Emits a `running` update before each command, then one per tick for
    /// strategies that estimate progress over time, and finally exactly one
    /// terminal update. A step with no commands emits a single `skipped`
    /// update. No tick timer is left armed when this returns.
    pub fn execute_step(
        &self,
        step: &InstallStep,
        step_index: usize,
        step_count: usize,
        sink: &mut dyn ProgressSink,
        context: &StepContext,
    ) -> Result<StepOutcome> {
        step.validate()?;

        let version = context.version.as_deref();
        let name = substitute_version(&step.name, version);
        let mut reporter = Reporter {
            sink,
            step_index,
            step_count,
            name: name.clone(),
            message: substitute_version(&step.message, version),
            elapsed_threshold: self.settings.elapsed_threshold,
        };

        let commands = resolve_commands(step, version);
        if commands.is_empty() {
            info!("Skipping step '{}': no commands to run", name);
            reporter.emit(StepStatus::Skipped, 100, None, None);
            return Ok(StepOutcome {
                name,
                status: StepStatus::Skipped,
                commands_run: 0,
                duration: Duration::ZERO,
            });
        }

        info!(
            "Running step '{}' ({} command(s), {} strategy)",
            name,
            commands.len(),
            step.strategy
        );

        let started = self.timer.now();
        let count = commands.len();
        let mut watermark = 0u8;

        for (index, command) in commands.iter().enumerate() {
            let mut estimator = ProgressEstimator::new(step, count)?;
            watermark = watermark.max(split_percent(index, count, 0));
            let detail = reporter.message.clone();
            reporter.emit(
                StepStatus::Running,
                watermark,
                Some((index, count, &detail)),
                Some(self.timer.now().saturating_sub(started)),
            );

            let result = self.run_command(
                command,
                &context.options,
                &mut estimator,
                |estimator, command_percent| {
                    let step_percent = split_percent(index, count, command_percent);
                    watermark = watermark.max(step_percent);
                    let detail = substitute_version(
                        estimator.detail().unwrap_or(&reporter.message),
                        version,
                    );
                    reporter.emit(
                        StepStatus::Running,
                        watermark,
                        Some((index, count, &detail)),
                        Some(self.timer.now().saturating_sub(started)),
                    );
                },
            );

            let failure = match result {
                Ok(Some(0)) => {
                    estimator.complete();
                    watermark = watermark.max(split_percent(index, count, 100));
                    continue;
                }
                Ok(Some(code)) => PrereqError::StepFailed {
                    step: name.clone(),
                    command: command.to_string(),
                    exit_code: Some(code),
                    message: format!("'{}' exited with code {}", command, code),
                },
                Ok(None) => PrereqError::StepFailed {
                    step: name.clone(),
                    command: command.to_string(),
                    exit_code: None,
                    message: format!("'{}' was terminated by a signal", command),
                },
                Err(e) => PrereqError::StepFailed {
                    step: name.clone(),
                    command: command.to_string(),
                    exit_code: None,
                    message: e.to_string(),
                },
            };

            warn!("{}", failure);
            let detail = reporter.message.clone();
            reporter.emit(StepStatus::Failed, watermark, Some((index, count, &detail)), None);
            return Err(failure);
        }

        let detail = reporter.message.clone();
        reporter.emit(
            StepStatus::Completed,
            100,
            Some((count - 1, count, &detail)),
            None,
        );

        let duration = self.timer.now().saturating_sub(started);
        debug!("Step '{}' completed in {}", name, format_duration(duration));
        Ok(StepOutcome {
            name,
            status: StepStatus::Completed,
            commands_run: count,
            duration,
        })
    }

    /// Run one command to exit, calling `on_tick` with the command's
    /// percentage whenever a tick fires for a time-aware strategy.
    ///
    /// Returns the exit code, `None` for death by signal.
    fn run_command<F>(
        &self,
        command: &ResolvedCommand,
        options: &CommandOptions,
        estimator: &mut ProgressEstimator,
        mut on_tick: F,
    ) -> Result<Option<i32>>
    where
        F: FnMut(&ProgressEstimator, u8),
    {
        debug!("Spawning '{}'", command);
        let started = self.timer.now();
        let mut process: Box<dyn RunningProcess> = self.runner.spawn(command.as_str(), options)?;
        let mut tick = TickGuard::start(self.timer, self.settings.tick_interval);

        let code = loop {
            match process.next_event(tick.remaining())? {
                ProcessEvent::Output(line) => {
                    trace!("{}", line.text());
                    estimator.observe(line.text());
                }
                ProcessEvent::Exited(code) => break code,
                ProcessEvent::Pending => {}
            }

            if tick.is_due() {
                tick.rearm();
                let percent = estimator.on_tick(self.timer.now().saturating_sub(started));
                if estimator.reports_ticks() {
                    on_tick(estimator, percent);
                }
            }
        };

        tick.stop();
        debug!("'{}' exited with {:?}", command, code);
        Ok(code)
    }
}
