//! Progress model: update types, estimation strategies, and elapsed-time
//! annotation.

pub mod elapsed;
pub mod estimator;
pub mod types;

pub use elapsed::{annotate, format_elapsed};
pub use estimator::{ProgressEstimator, DEFAULT_PROGRESS_PATTERN, SYNTHETIC_CAP};
pub use types::{
    aggregate_percent, split_percent, CommandProgress, NullSink, OverallProgress, ProgressSink,
    StepStatus, UnifiedProgress,
};
