//! Progress update types shared by the executor, orchestrator, and renderers.

use serde::Serialize;

/// Status of a step within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// Step is waiting to run.
    Pending,

    /// Step is currently executing.
    Running,

    /// Step completed successfully.
    Completed,

    /// Step failed.
    Failed,

    /// Step had nothing to run.
    Skipped,
}

impl StepStatus {
    /// Check if this is a terminal state (no more changes expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Failed | StepStatus::Skipped
        )
    }

    /// Get a display character for this status.
    pub fn display_char(&self) -> char {
        match self {
            StepStatus::Pending => '○',
            StepStatus::Running => '◉',
            StepStatus::Completed => '✓',
            StepStatus::Failed => '✗',
            StepStatus::Skipped => '⊘',
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        };
        write!(f, "{}", s)
    }
}

/// Position of the current step within the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallProgress {
    /// Zero-based index of the current step invocation.
    pub step_index: usize,

    /// Number of step invocations in the run.
    pub step_count: usize,

    /// Display name, version substituted, possibly with an elapsed suffix.
    pub step_name: String,

    /// Aggregate run progress, 0..=100.
    pub percent: u8,
}

/// The command currently running within a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandProgress {
    /// Zero-based index of the command within the step.
    pub index: usize,

    /// Number of commands in the step.
    pub count: usize,

    /// Status text, possibly with an elapsed suffix.
    pub detail: String,
}

/// One progress emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnifiedProgress {
    pub overall: OverallProgress,
    pub step_percent: u8,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandProgress>,
}

/// Receives progress updates.
///
/// Any `FnMut(&UnifiedProgress)` closure is a sink.
pub trait ProgressSink {
    fn emit(&mut self, update: &UnifiedProgress);
}

impl<F> ProgressSink for F
where
    F: FnMut(&UnifiedProgress),
{
    fn emit(&mut self, update: &UnifiedProgress) {
        self(update)
    }
}

/// Sink that drops every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&mut self, _update: &UnifiedProgress) {}
}

/// Aggregate run progress when step `step_index` of `step_count` is at
/// `step_percent`.
pub fn aggregate_percent(step_index: usize, step_count: usize, step_percent: u8) -> u8 {
    if step_count == 0 {
        return 100;
    }
    let done = step_index.min(step_count) * 100 + usize::from(step_percent.min(100));
    (done / step_count).min(100) as u8
}

/// Step progress when command `index` of `count` is at `command_percent`.
pub fn split_percent(index: usize, count: usize, command_percent: u8) -> u8 {
    aggregate_percent(index, count, command_percent)
}
