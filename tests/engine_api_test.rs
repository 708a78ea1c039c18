//! Integration tests for the install engine public API.

use std::time::Duration;

use prereqs::config::{parse_manifest, InstallStep, ProgressStrategy};
use prereqs::progress::{StepStatus, UnifiedProgress};
use prereqs::runner::Orchestrator;
use prereqs::shell::{MockRunner, ScriptedCommand};
use prereqs::steps::{ExecutorSettings, StepContext, StepExecutor};
use prereqs::timer::{MockTimer, TimerSource};
use prereqs::versions::{resolve_plan, Version, VersionConflict, VersionConstraint};
use prereqs::PrereqError;

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn two_step_plan() -> Vec<InstallStep> {
    vec![
        InstallStep::new("Check git", "Checking git").with_commands(&["git --version"]),
        InstallStep::new("Install Node {version}", "Installing Node.js {version}")
            .with_strategy(ProgressStrategy::Synthetic)
            .with_estimate(secs(60))
            .with_template("fnm install {version}")
            .with_family("node"),
    ]
}

#[test]
fn two_step_run_reports_progress_in_virtual_time() {
    let timer = MockTimer::new();
    let runner = MockRunner::new(timer.clone());
    runner.script("git --version", ScriptedCommand::exits_after(secs(2)));
    runner.script("fnm install 20", ScriptedCommand::exits_after(secs(40)));

    let plan = resolve_plan(&[VersionConstraint::new("node", Version::new(20))]).unwrap();
    let orchestrator = Orchestrator::new(StepExecutor::new(&runner, &timer));

    let mut updates: Vec<UnifiedProgress> = Vec::new();
    let report = orchestrator
        .run(&plan, &two_step_plan(), &mut |u: &UnifiedProgress| {
            updates.push(u.clone())
        })
        .unwrap();

    assert_eq!(report.completed(), 2);
    assert_eq!(timer.now(), secs(42));
    assert_eq!(timer.active_timers(), 0);

    // Immediate step: start and finish only.
    assert_eq!(updates[0].status, StepStatus::Running);
    assert_eq!(updates[0].overall.percent, 0);
    assert_eq!(updates[1].status, StepStatus::Completed);
    assert_eq!(updates[1].overall.percent, 50);

    // Synthetic step: start, one tick per second until exit, finish.
    assert_eq!(updates.len(), 2 + 1 + 39 + 1);
    assert_eq!(updates[2].step_percent, 0);
    assert_eq!(updates[2].overall.step_name, "Install Node 20");
    assert_eq!(updates[32].step_percent, 50);
    assert_eq!(updates[41].step_percent, 65);

    let last = updates.last().unwrap();
    assert_eq!(last.status, StepStatus::Completed);
    assert_eq!(last.step_percent, 100);
    assert_eq!(last.overall.percent, 100);
    assert_eq!(last.overall.step_name, "Install Node 20");

    assert!(updates
        .windows(2)
        .all(|w| w[0].overall.percent <= w[1].overall.percent));
    assert!(updates.iter().all(|u| u.overall.step_index < u.overall.step_count));
}

#[test]
fn long_running_update_carries_elapsed_suffix() {
    let timer = MockTimer::new();
    let runner = MockRunner::new(timer.clone());
    runner.script("git --version", ScriptedCommand::exits_after(secs(2)));
    runner.script("fnm install 20", ScriptedCommand::exits_after(secs(40)));

    let plan = resolve_plan(&[VersionConstraint::new("node", Version::new(20))]).unwrap();
    let orchestrator = Orchestrator::new(StepExecutor::new(&runner, &timer));

    let mut updates: Vec<UnifiedProgress> = Vec::new();
    orchestrator
        .run(&plan, &two_step_plan(), &mut |u: &UnifiedProgress| {
            updates.push(u.clone())
        })
        .unwrap();

    assert_eq!(updates[31].overall.step_name, "Install Node 20");
    insta::assert_json_snapshot!(updates[33], @r#"
    {
      "overall": {
        "step_index": 1,
        "step_count": 2,
        "step_name": "Install Node 20 (31s)",
        "percent": 75
      },
      "step_percent": 51,
      "status": "running",
      "command": {
        "index": 0,
        "count": 1,
        "detail": "Installing Node.js 20 (31s)"
      }
    }
    "#);
}

#[test]
fn conflicting_constraints_stop_before_any_step() {
    let timer = MockTimer::new();
    let runner = MockRunner::new(timer.clone());
    let orchestrator = Orchestrator::new(StepExecutor::new(&runner, &timer));

    let constraints = vec![
        VersionConstraint::new("node", Version::new(20)).with_source("frontend"),
        VersionConstraint::new("node", Version::new(16))
            .with_max(Version::new(18))
            .with_source("legacy-api"),
    ];

    let mut emitted = 0;
    let err = orchestrator
        .run_constraints(&constraints, &two_step_plan(), &mut |_: &UnifiedProgress| {
            emitted += 1
        })
        .unwrap_err();

    match err {
        PrereqError::VersionConflict(VersionConflict::Incompatible {
            family,
            first,
            second,
        }) => {
            assert_eq!(family, "node");
            assert_eq!(first.source.as_deref(), Some("frontend"));
            assert_eq!(second.source.as_deref(), Some("legacy-api"));
        }
        other => panic!("expected incompatible constraints, got {:?}", other),
    }
    assert_eq!(emitted, 0);
    assert!(runner.spawned().is_empty());
}

#[test]
fn failed_step_aborts_run_without_leaking_timers() {
    let timer = MockTimer::new();
    let runner = MockRunner::new(timer.clone());
    runner.script("git --version", ScriptedCommand::fails_after(secs(1), 127));

    let plan = resolve_plan(&[VersionConstraint::new("node", Version::new(20))]).unwrap();
    let orchestrator = Orchestrator::new(StepExecutor::new(&runner, &timer));

    let mut statuses = Vec::new();
    let err = orchestrator
        .run(&plan, &two_step_plan(), &mut |u: &UnifiedProgress| {
            statuses.push(u.status)
        })
        .unwrap_err();

    assert_eq!(err.exit_code(), Some(127));
    assert_eq!(statuses, vec![StepStatus::Running, StepStatus::Failed]);
    assert_eq!(runner.spawned(), vec!["git --version"]);
    assert_eq!(timer.active_timers(), 0);
}

#[test]
fn manifest_drives_a_multi_version_run() {
    let manifest = parse_manifest(
        r#"
constraints:
  - family: node@18
    min_version: 18
    source: legacy
  - family: node@20
    min_version: 20
available:
  node@18: ["18.19.0", "18.20.4"]
  node@20: ["20.11.1"]
steps:
  - name: Install Node {version}
    message: Downloading Node.js {version}
    strategy: milestones
    command_template: fnm install {version}
    family: node
    milestones:
      - pattern: Downloading
        percent: 40
      - pattern: Installed
        percent: 90
"#,
        std::path::Path::new("prereqs.yml"),
    )
    .unwrap();
    manifest.validate().unwrap();

    let timer = MockTimer::new();
    let runner = MockRunner::new(timer.clone());
    runner.script(
        "fnm install 18.19.0",
        ScriptedCommand::exits_after(secs(4))
            .with_output(Duration::from_millis(100), "Downloading v18.19.0")
            .with_output(Duration::from_millis(2100), "Installed v18.19.0"),
    );

    let orchestrator =
        Orchestrator::new(StepExecutor::new(&runner, &timer)).with_resolver(manifest.resolver());
    let mut updates: Vec<UnifiedProgress> = Vec::new();
    let report = orchestrator
        .run_constraints(
            &manifest.constraints,
            &manifest.steps,
            &mut |u: &UnifiedProgress| updates.push(u.clone()),
        )
        .unwrap();

    assert_eq!(
        runner.spawned(),
        vec!["fnm install 18.19.0", "fnm install 20.11.1"]
    );
    assert_eq!(report.steps.len(), 2);

    let first_step: Vec<u8> = updates
        .iter()
        .filter(|u| u.overall.step_index == 0)
        .map(|u| u.step_percent)
        .collect();
    assert_eq!(first_step, vec![0, 40, 40, 90, 100]);
}

#[test]
#[cfg(unix)]
fn real_shell_keeps_ticking_after_output_closes() {
    use prereqs::shell::ShellRunner;
    use prereqs::timer::SystemTimer;

    let runner = ShellRunner::with_shell("/bin/sh");
    let timer = SystemTimer::new();
    let executor = StepExecutor::with_settings(
        &runner,
        &timer,
        ExecutorSettings {
            tick_interval: Duration::from_millis(50),
            elapsed_threshold: secs(30),
        },
    );
    let step = InstallStep::new("Quiet install", "Installing quietly")
        .with_strategy(ProgressStrategy::Synthetic)
        .with_estimate(secs(2))
        .with_commands(&["exec >/dev/null 2>&1; sleep 1"]);

    let mut updates: Vec<UnifiedProgress> = Vec::new();
    let outcome = executor
        .execute_step(
            &step,
            0,
            1,
            &mut |u: &UnifiedProgress| updates.push(u.clone()),
            &StepContext::default(),
        )
        .unwrap();

    assert_eq!(outcome.status, StepStatus::Completed);
    let ticks = updates
        .iter()
        .filter(|u| u.status == StepStatus::Running && u.step_percent > 0)
        .count();
    assert!(ticks >= 5, "expected running ticks, got {}", ticks);
    assert_eq!(updates.last().unwrap().step_percent, 100);
    assert_eq!(timer.active_timers(), 0);
}
