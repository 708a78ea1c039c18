//! Per-command progress estimation.
//!
//! A [`ProgressEstimator`] turns what a running command does (output lines,
//! time passing) into a percentage according to the step's strategy. The
//! percentage never goes down, and only [`ProgressEstimator::complete`]
//! reaches 100 for the synthetic strategy.

use std::time::Duration;

use regex::Regex;

use crate::config::{InstallStep, Milestone, ProgressStrategy};
use crate::error::{PrereqError, Result};

/// Default pattern for the exact strategy: a number followed by `%`.
pub const DEFAULT_PROGRESS_PATTERN: &str = r"(\d{1,3}(?:\.\d+)?)\s*%";

/// Highest percentage a synthetic estimate reports before the command exits.
pub const SYNTHETIC_CAP: u8 = 95;

#[derive(Debug)]
enum Mode {
    Immediate,
    Exact(Regex),
    Milestones {
        milestones: Vec<Milestone>,
        reached: Option<usize>,
    },
    Synthetic {
        budget: Duration,
    },
}

/// Tracks progress for one command of a step.
#[derive(Debug)]
pub struct ProgressEstimator {
    mode: Mode,
    percent: u8,
    detail: Option<String>,
}

impl ProgressEstimator {
    /// Build an estimator for one of `command_count` commands of `step`.
    ///
    /// For the synthetic strategy the step's estimate is shared evenly
    /// between its commands.
    pub fn new(step: &InstallStep, command_count: usize) -> Result<Self> {
        let mode = match step.strategy {
            ProgressStrategy::Immediate => Mode::Immediate,
            ProgressStrategy::Exact => {
                let pattern = step
                    .progress_pattern
                    .as_deref()
                    .unwrap_or(DEFAULT_PROGRESS_PATTERN);
                let regex = Regex::new(pattern).map_err(|e| PrereqError::InvalidStep {
                    step: step.name.clone(),
                    message: format!("invalid progress_pattern: {}", e),
                })?;
                Mode::Exact(regex)
            }
            ProgressStrategy::Milestones => Mode::Milestones {
                milestones: step.milestones.clone(),
                reached: None,
            },
            ProgressStrategy::Synthetic => {
                let estimate = step
                    .estimated_duration()
                    .filter(|d| !d.is_zero())
                    .ok_or_else(|| PrereqError::InvalidStep {
                        step: step.name.clone(),
                        message: "synthetic strategy needs a positive estimated_duration_ms"
                            .to_string(),
                    })?;
                let shares = u32::try_from(command_count.max(1)).unwrap_or(u32::MAX);
                Mode::Synthetic {
                    budget: (estimate / shares).max(Duration::from_millis(1)),
                }
            }
        };

        Ok(Self {
            mode,
            percent: 0,
            detail: None,
        })
    }

    /// Current percentage, 0..=100.
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// Status text set by the last milestone reached, if it had one.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Whether time passing alone can move the estimate.
    pub fn reports_ticks(&self) -> bool {
        !matches!(self.mode, Mode::Immediate)
    }

    /// Feed one line of command output. Returns true if progress moved.
    pub fn observe(&mut self, line: &str) -> bool {
        let candidate = match &mut self.mode {
            Mode::Exact(regex) => regex
                .captures_iter(line)
                .filter_map(|c| c.get(1))
                .filter_map(|m| m.as_str().trim().parse::<f64>().ok())
                .last()
                .map(|p| p.clamp(0.0, 100.0).floor() as u8),
            Mode::Milestones {
                milestones,
                reached,
            } => {
                let start = reached.map_or(0, |i| i + 1);
                let hit = milestones
                    .iter()
                    .enumerate()
                    .skip(start)
                    .filter(|(_, m)| line.contains(&m.pattern))
                    .map(|(i, _)| i)
                    .last();
                match hit {
                    Some(i) => {
                        *reached = Some(i);
                        if let Some(message) = &milestones[i].message {
                            self.detail = Some(message.clone());
                        }
                        Some(milestones[i].percent.min(100))
                    }
                    None => None,
                }
            }
            Mode::Immediate | Mode::Synthetic { .. } => None,
        };

        candidate.is_some_and(|p| self.raise(p))
    }

    /// Advance time-based estimates to `elapsed` since the command started.
    /// Returns the current percentage.
    pub fn on_tick(&mut self, elapsed: Duration) -> u8 {
        if let Mode::Synthetic { budget } = self.mode {
            let estimate = (elapsed.as_millis() * 100 / budget.as_millis().max(1))
                .min(u128::from(SYNTHETIC_CAP));
            self.raise(estimate as u8);
        }
        self.percent
    }

    /// The command exited successfully.
    pub fn complete(&mut self) -> u8 {
        self.percent = 100;
        self.percent
    }

    fn raise(&mut self, percent: u8) -> bool {
        if percent > self.percent {
            self.percent = percent;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn synthetic(estimate: u64) -> InstallStep {
        InstallStep::new("Install", "Installing")
            .with_strategy(ProgressStrategy::Synthetic)
            .with_estimate(secs(estimate))
    }

    #[test]
    fn immediate_stays_at_zero_until_complete() {
        let step = InstallStep::new("Check", "");
        let mut est = ProgressEstimator::new(&step, 1).unwrap();
        assert!(!est.reports_ticks());
        assert!(!est.observe("50%"));
        assert_eq!(est.on_tick(secs(100)), 0);
        assert_eq!(est.complete(), 100);
    }

    #[test]
    fn synthetic_is_linear_and_capped() {
        let mut est = ProgressEstimator::new(&synthetic(60), 1).unwrap();
        assert_eq!(est.on_tick(secs(0)), 0);
        assert_eq!(est.on_tick(secs(6)), 10);
        assert_eq!(est.on_tick(secs(30)), 50);
        assert_eq!(est.on_tick(secs(57)), 95);
        assert_eq!(est.on_tick(secs(600)), 95);
        assert_eq!(est.complete(), 100);
    }

    #[test]
    fn synthetic_splits_estimate_between_commands() {
        let mut est = ProgressEstimator::new(&synthetic(60), 2).unwrap();
        assert_eq!(est.on_tick(secs(15)), 50);
    }

    #[test]
    fn synthetic_without_estimate_is_invalid() {
        let step = InstallStep::new("Install", "").with_strategy(ProgressStrategy::Synthetic);
        assert!(matches!(
            ProgressEstimator::new(&step, 1),
            Err(PrereqError::InvalidStep { .. })
        ));
    }

    #[test]
    fn exact_follows_output_without_regressing() {
        let step = InstallStep::new("Download", "").with_strategy(ProgressStrategy::Exact);
        let mut est = ProgressEstimator::new(&step, 1).unwrap();

        assert!(est.observe("Downloading... 12%"));
        assert_eq!(est.percent(), 12);
        assert!(est.observe("[####      ] 40.7 %"));
        assert_eq!(est.percent(), 40);
        assert!(!est.observe("retrying at 10%"));
        assert_eq!(est.percent(), 40);
        assert!(!est.observe("no numbers here"));
        assert!(est.observe("250%"));
        assert_eq!(est.percent(), 100);
    }

    #[test]
    fn exact_uses_last_match_on_a_line() {
        let step = InstallStep::new("Download", "").with_strategy(ProgressStrategy::Exact);
        let mut est = ProgressEstimator::new(&step, 1).unwrap();
        est.observe("10% 20% 30%");
        assert_eq!(est.percent(), 30);
    }

    #[test]
    fn exact_with_custom_pattern() {
        let mut step = InstallStep::new("Build", "").with_strategy(ProgressStrategy::Exact);
        step.progress_pattern = Some(r"\[(\d+)/100\]".to_string());
        let mut est = ProgressEstimator::new(&step, 1).unwrap();
        est.observe("[42/100] compiling");
        assert_eq!(est.percent(), 42);
        assert_eq!(est.on_tick(secs(100)), 42);
    }

    #[test]
    fn milestones_jump_forward_and_never_regress() {
        let mut step = InstallStep::new("Install", "Installing")
            .with_strategy(ProgressStrategy::Milestones)
            .with_milestone("Resolving", 10)
            .with_milestone("Downloading", 40)
            .with_milestone("Linking", 90);
        step.milestones[1].message = Some("Fetching packages".to_string());
        let mut est = ProgressEstimator::new(&step, 1).unwrap();

        assert!(est.observe("Downloading lodash"));
        assert_eq!(est.percent(), 40);
        assert_eq!(est.detail(), Some("Fetching packages"));

        assert!(!est.observe("Resolving again"));
        assert_eq!(est.percent(), 40);

        assert!(est.observe("Linking dependencies"));
        assert_eq!(est.percent(), 90);
        assert_eq!(est.detail(), Some("Fetching packages"));
    }

    #[test]
    fn milestones_take_furthest_match_on_a_line() {
        let step = InstallStep::new("Install", "")
            .with_strategy(ProgressStrategy::Milestones)
            .with_milestone("a", 10)
            .with_milestone("b", 50);
        let mut est = ProgressEstimator::new(&step, 1).unwrap();
        est.observe("a then b");
        assert_eq!(est.percent(), 50);
    }
}
