//! Run orchestration.
//!
//! Expands the declared steps against a version plan and runs the
//! resulting invocations in order through a [`StepExecutor`].

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::InstallStep;
use crate::error::Result;
use crate::progress::{ProgressSink, StepStatus};
use crate::shell::CommandOptions;
use crate::steps::{substitute_version, StepContext, StepExecutor, StepOutcome};
use crate::versions::{Version, VersionConstraint, VersionPlan, VersionResolver};

/// One scheduled execution of a step.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation<'s> {
    /// The step definition.
    pub step: &'s InstallStep,

    /// Plan family this invocation runs for, if the step has a selector.
    pub family: Option<String>,

    /// Version substituted into the step.
    pub version: Option<Version>,
}

impl Invocation<'_> {
    /// Step name with the version substituted.
    pub fn display_name(&self) -> String {
        let version = self.version.map(|v| v.to_string());
        substitute_version(&self.step.name, version.as_deref())
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// The plan the run used.
    pub plan: VersionPlan,

    /// Outcome of each invocation, in order.
    pub steps: Vec<StepOutcome>,

    /// Total duration.
    pub duration: Duration,
}

impl RunReport {
    /// Number of invocations that ran commands.
    pub fn completed(&self) -> usize {
        self.count(StepStatus::Completed)
    }

    /// Number of invocations with nothing to run.
    pub fn skipped(&self) -> usize {
        self.count(StepStatus::Skipped)
    }

    fn count(&self, status: StepStatus) -> usize {
        self.steps.iter().filter(|s| s.status == status).count()
    }
}

/// Sequences step invocations across a version plan.
pub struct Orchestrator<'a> {
    executor: StepExecutor<'a>,
    resolver: VersionResolver,
    options: CommandOptions,
}

impl<'a> Orchestrator<'a> {
    pub fn new(executor: StepExecutor<'a>) -> Self {
        Self {
            executor,
            resolver: VersionResolver::new(),
            options: CommandOptions::default(),
        }
    }

    /// Resolve constraints with `resolver` in [`Orchestrator::run_constraints`].
    pub fn with_resolver(mut self, resolver: VersionResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Working directory and environment for every command.
    pub fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }

    /// Expand `steps` against `plan`.
    ///
    /// Steps without a family selector run once without a version. Steps
    /// with one run once per matching plan family, lowest version first; a
    /// selector that matches nothing contributes no invocations.
    pub fn invocations<'s>(plan: &VersionPlan, steps: &'s [InstallStep]) -> Vec<Invocation<'s>> {
        let mut invocations = Vec::new();
        for step in steps {
            match &step.family {
                None => invocations.push(Invocation {
                    step,
                    family: None,
                    version: None,
                }),
                Some(selector) => {
                    let matched = plan.matching(selector);
                    if matched.is_empty() {
                        warn!(
                            "Step '{}' selects family '{}', which is not in the plan",
                            step.name, selector
                        );
                    }
                    invocations.extend(matched.into_iter().map(|(family, version)| Invocation {
                        step,
                        family: Some(family.to_string()),
                        version: Some(*version),
                    }));
                }
            }
        }
        invocations
    }

    /// Run every invocation of `steps` against `plan`.
    ///
    /// Stops at the first failure and returns it. Steps that already ran
    /// are not undone.
    pub fn run(
        &self,
        plan: &VersionPlan,
        steps: &[InstallStep],
        sink: &mut dyn ProgressSink,
    ) -> Result<RunReport> {
        let invocations = Self::invocations(plan, steps);
        let total = invocations.len();
        info!("Running {} step invocation(s)", total);

        let mut outcomes = Vec::with_capacity(total);
        let mut duration = Duration::ZERO;
        for (index, invocation) in invocations.iter().enumerate() {
            let context = StepContext {
                version: invocation.version.map(|v| v.to_string()),
                options: self.options.clone(),
            };
            if let Some(family) = &invocation.family {
                debug!("Invocation {} runs for {}", index, family);
            }

            let outcome = self
                .executor
                .execute_step(invocation.step, index, total, sink, &context)?;
            duration += outcome.duration;
            outcomes.push(outcome);
        }

        Ok(RunReport {
            plan: plan.clone(),
            steps: outcomes,
            duration,
        })
    }

    /// Resolve `constraints` into a plan, then run `steps` against it.
    ///
    /// A version conflict is returned before any step runs.
    pub fn run_constraints(
        &self,
        constraints: &[VersionConstraint],
        steps: &[InstallStep],
        sink: &mut dyn ProgressSink,
    ) -> Result<RunReport> {
        let plan = self.resolver.resolve(constraints)?;
        self.run(&plan, steps, sink)
    }
}
