use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hostup_core::adapters::{
    ManagerAdapter, ManagerProfile, ProcessManagerSource, UpgradeAdapter,
    WINGET_UPDATE_NOT_APPLICABLE,
};
use hostup_core::audit::{AuditLevel, MemoryAuditLog};
use hostup_core::execution::{
    CommandSpec, ExecutionResult, ProcessExecutor, ProcessExitStatus, ProcessOutput,
    ProcessSpawnRequest, ProcessWaitFuture, RunningProcess,
};
use hostup_core::models::{
    CoreError, CoreErrorKind, ExclusionSet, ManagerAction, ManagerKind, UpgradeStatus,
};
use hostup_core::orchestration::{RunOptions, RunOutcome, UpdatePipeline};

const WINGET_TABLE: &str = include_str!("fixtures/winget/upgrade_table.txt");
const WINGET_JSON: &str = include_str!("fixtures/winget/upgrade_json.txt");
const CHOCO_TABLE: &str = include_str!("fixtures/choco/outdated_table.txt");

#[derive(Default)]
struct RoutingFakeExecutor {
    winget_available: bool,
    choco_available: bool,
    winget_supports_json: bool,
    choco_query_fails: bool,
    upgrade_outcomes: HashMap<String, (i32, &'static str)>,
    spawn_failures: Vec<String>,
    timeouts: Vec<String>,
    spawned: Mutex<Vec<(ManagerAction, CommandSpec)>>,
}

impl RoutingFakeExecutor {
    fn primary_only() -> Self {
        Self {
            winget_available: true,
            ..Self::default()
        }
    }

    fn both() -> Self {
        Self {
            winget_available: true,
            choco_available: true,
            ..Self::default()
        }
    }

    fn upgrade_outcome(mut self, id: &str, exit_code: i32, output: &'static str) -> Self {
        self.upgrade_outcomes
            .insert(id.to_string(), (exit_code, output));
        self
    }

    fn upgrades_run(&self) -> Vec<Vec<String>> {
        self.spawned
            .lock()
            .unwrap()
            .iter()
            .filter(|(action, _)| *action == ManagerAction::Upgrade)
            .map(|(_, spec)| spec.args.clone())
            .collect()
    }

    fn respond(&self, program: &str, args: &[String]) -> (i32, String) {
        let first = args.first().map(String::as_str);

        if program == "which" || program == "where.exe" {
            return match first {
                Some("winget") if self.winget_available => (0, "/fake/bin/winget\n".to_string()),
                Some("choco") if self.choco_available => (0, "/fake/bin/choco\n".to_string()),
                _ => (1, String::new()),
            };
        }

        if program.ends_with("winget") {
            if let Some(position) = args.iter().position(|arg| arg == "--id") {
                let id = &args[position + 1];
                let (code, text) = self
                    .upgrade_outcomes
                    .get(id)
                    .copied()
                    .unwrap_or((0, "Successfully installed"));
                return (code, text.to_string());
            }
            if args.iter().any(|arg| arg == "--output") {
                return if self.winget_supports_json {
                    (0, WINGET_JSON.to_string())
                } else {
                    (
                        -1978335222,
                        "Argument name was not recognized for the current command: '--output'"
                            .to_string(),
                    )
                };
            }
            return (0, WINGET_TABLE.to_string());
        }

        if program.ends_with("choco") {
            if self.choco_query_fails && first == Some("outdated") {
                return (1, "Chocolatey encountered an unexpected error".to_string());
            }
            return match first {
                Some("outdated") if args.iter().any(|arg| arg == "--format") => {
                    (1, "ERROR: Unknown option '--format'".to_string())
                }
                Some("outdated") => (2, CHOCO_TABLE.to_string()),
                Some("upgrade") => {
                    let id = &args[1];
                    let (code, text) = self
                        .upgrade_outcomes
                        .get(id)
                        .copied()
                        .unwrap_or((0, "upgraded 1/1 packages"));
                    (code, text.to_string())
                }
                _ => (1, String::new()),
            };
        }

        (127, format!("{program}: command not found"))
    }
}

struct FakeProcess {
    result: ExecutionResult<ProcessOutput>,
}

impl RunningProcess for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn wait(self: Box<Self>) -> ProcessWaitFuture {
        let result = self.result;
        Box::pin(async move { result })
    }
}

impl ProcessExecutor for RoutingFakeExecutor {
    fn spawn(&self, request: ProcessSpawnRequest) -> ExecutionResult<Box<dyn RunningProcess>> {
        let program = request.command.program.to_string_lossy().to_string();
        let args = request.command.args.clone();
        self.spawned
            .lock()
            .unwrap()
            .push((request.action, request.command.clone()));

        if request.action == ManagerAction::Upgrade
            && args
                .iter()
                .any(|arg| self.spawn_failures.iter().any(|id| id == arg))
        {
            return Err(CoreError::for_action(
                request.manager,
                request.action,
                CoreErrorKind::ProcessFailure,
                "failed to spawn process: access is denied",
            ));
        }

        // The child starts but never finishes within its limit.
        if request.action == ManagerAction::Upgrade
            && args
                .iter()
                .any(|arg| self.timeouts.iter().any(|id| id == arg))
        {
            return Ok(Box::new(FakeProcess {
                result: Err(CoreError::for_action(
                    request.manager,
                    request.action,
                    CoreErrorKind::Timeout,
                    format!("'{program}' timed out after 1800s"),
                )),
            }));
        }

        let (code, stdout) = self.respond(&program, &args);
        Ok(Box::new(FakeProcess {
            result: Ok(ProcessOutput {
                status: ProcessExitStatus::ExitCode(code),
                stdout: stdout.into_bytes(),
                stderr: Vec::new(),
            }),
        }))
    }
}

fn build_pipeline(
    executor: Arc<RoutingFakeExecutor>,
    exclusions: ExclusionSet,
    audit: Arc<MemoryAuditLog>,
) -> UpdatePipeline {
    let profiles = [ManagerProfile::chocolatey(), ManagerProfile::winget()];
    let adapters: Vec<Arc<dyn ManagerAdapter>> = profiles
        .into_iter()
        .map(|profile| {
            let source = ProcessManagerSource::new(profile, executor.clone());
            Arc::new(UpgradeAdapter::new(source, audit.clone())) as Arc<dyn ManagerAdapter>
        })
        .collect();

    UpdatePipeline::new(adapters, exclusions, audit).expect("pipeline creation should succeed")
}

#[tokio::test]
async fn table_fallback_discovers_primary_upgrades() {
    let executor = Arc::new(RoutingFakeExecutor::primary_only());
    let audit = Arc::new(MemoryAuditLog::new());
    let pipeline = build_pipeline(executor, ExclusionSet::empty(), audit);

    let plan = pipeline.plan().await;
    let ids: Vec<&str> = plan.accepted.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "Microsoft.Edge",
            "Mozilla.Firefox",
            "Microsoft.VisualStudioCode",
            "7zip.7zip",
            "Notepad++.Notepad++",
        ]
    );
    assert_eq!(plan.accepted[1].name, "Mozilla Firefox (x64 en-US)");
    assert_eq!(plan.accepted[2].name, "Visual Studio Code");
    assert_eq!(plan.accepted[4].available_version, None);
    assert!(plan.accepted.iter().all(|c| c.manager == ManagerKind::Primary));
}

#[tokio::test]
async fn structured_output_is_used_when_supported() {
    let executor = Arc::new(RoutingFakeExecutor {
        winget_supports_json: true,
        ..RoutingFakeExecutor::primary_only()
    });
    let audit = Arc::new(MemoryAuditLog::new());
    let pipeline = build_pipeline(executor.clone(), ExclusionSet::empty(), audit);

    let plan = pipeline.plan().await;
    assert_eq!(plan.accepted.len(), 3);
    assert_eq!(plan.accepted[1].id, "Mozilla.Firefox");
    assert_eq!(plan.accepted[1].name, "Mozilla Firefox (x64 en-US)");

    let table_queries = executor
        .spawned
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, spec)| {
            spec.program.to_string_lossy().ends_with("winget")
                && !spec.args.iter().any(|arg| arg == "--output")
        })
        .count();
    assert_eq!(table_queries, 0);
}

#[tokio::test]
async fn secondary_candidates_follow_primary_and_keep_duplicates() {
    let executor = Arc::new(RoutingFakeExecutor::both());
    let audit = Arc::new(MemoryAuditLog::new());
    let pipeline = build_pipeline(executor, ExclusionSet::empty(), audit);

    let plan = pipeline.plan().await;
    assert_eq!(plan.accepted.len(), 7);
    assert_eq!(plan.accepted[5].id, "git");
    assert_eq!(plan.accepted[5].manager, ManagerKind::Secondary);
    assert_eq!(plan.accepted[6].name, "nodejs-lts");
    assert_eq!(plan.accepted[6].available_version.as_deref(), Some("20.15.1"));
    assert!(plan.accepted.iter().all(|candidate| candidate.id != "python"));
}

#[tokio::test]
async fn secondary_failure_leaves_primary_plan_unchanged() {
    let audit = Arc::new(MemoryAuditLog::new());

    let primary_only = build_pipeline(
        Arc::new(RoutingFakeExecutor::primary_only()),
        ExclusionSet::empty(),
        audit.clone(),
    )
    .plan()
    .await;

    let failing_secondary = build_pipeline(
        Arc::new(RoutingFakeExecutor {
            choco_query_fails: true,
            ..RoutingFakeExecutor::both()
        }),
        ExclusionSet::empty(),
        audit.clone(),
    )
    .plan()
    .await;

    assert_eq!(primary_only.accepted, failing_secondary.accepted);
    assert!(audit.contains(AuditLevel::Info, "Chocolatey (choco) not found"));
    assert!(audit.contains(AuditLevel::Warn, "Chocolatey"));
}

#[tokio::test]
async fn exclusions_filter_annotated_and_case_variant_ids() {
    let executor = Arc::new(RoutingFakeExecutor::both());
    let audit = Arc::new(MemoryAuditLog::new());
    let exclusions = ExclusionSet::new(["microsoft.edge", "GIT", "7zip.7zip"]);
    let pipeline = build_pipeline(executor, exclusions, audit);

    let plan = pipeline.plan().await;
    let ids: Vec<&str> = plan.accepted.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "Mozilla.Firefox",
            "Microsoft.VisualStudioCode",
            "Notepad++.Notepad++",
            "nodejs-lts",
        ]
    );
    assert_eq!(plan.excluded.len(), 3);
}

#[tokio::test]
async fn all_excluded_runs_nothing() {
    let executor = Arc::new(RoutingFakeExecutor::primary_only());
    let audit = Arc::new(MemoryAuditLog::new());
    let exclusions = ExclusionSet::new([
        "Microsoft.Edge",
        "Mozilla.Firefox",
        "Microsoft.VisualStudioCode",
        "7zip.7zip",
        "Notepad++.Notepad++",
    ]);
    let pipeline = build_pipeline(executor.clone(), exclusions, audit);

    let summary = pipeline
        .run(RunOptions::default(), |_| panic!("confirmation must not be requested"))
        .await;

    assert_eq!(summary.outcome, RunOutcome::NothingToDo);
    assert_eq!(summary.excluded.len(), 5);
    assert!(summary.results.is_empty());
    assert!(executor.upgrades_run().is_empty());
}

#[tokio::test]
async fn declined_confirmation_executes_nothing() {
    let executor = Arc::new(RoutingFakeExecutor::primary_only());
    let audit = Arc::new(MemoryAuditLog::new());
    let pipeline = build_pipeline(executor.clone(), ExclusionSet::empty(), audit.clone());

    let summary = pipeline.run(RunOptions::default(), |plan| {
        assert_eq!(plan.accepted.len(), 5);
        false
    })
    .await;

    assert_eq!(summary.outcome, RunOutcome::Declined);
    assert!(executor.upgrades_run().is_empty());
    assert!(audit.contains(AuditLevel::Info, "declined"));
}

#[tokio::test]
async fn list_only_never_prompts_or_executes() {
    let executor = Arc::new(RoutingFakeExecutor::primary_only());
    let audit = Arc::new(MemoryAuditLog::new());
    let pipeline = build_pipeline(executor.clone(), ExclusionSet::empty(), audit);

    let options = RunOptions {
        list_only: true,
        assume_yes: false,
    };
    let summary = pipeline
        .run(options, |_| panic!("confirmation must not be requested"))
        .await;

    assert_eq!(summary.outcome, RunOutcome::ListOnly);
    assert_eq!(summary.planned.len(), 5);
    assert!(executor.upgrades_run().is_empty());
}

#[tokio::test]
async fn execution_classifies_each_candidate_and_continues_after_failures() {
    let executor = Arc::new(RoutingFakeExecutor {
        spawn_failures: vec!["7zip.7zip".to_string()],
        ..RoutingFakeExecutor::primary_only()
            .upgrade_outcome(
                "Microsoft.Edge",
                WINGET_UPDATE_NOT_APPLICABLE,
                "No applicable update found."
            )
            .upgrade_outcome("Mozilla.Firefox", 1, "Firefox is already up to date.")
            .upgrade_outcome(
                "Microsoft.VisualStudioCode",
                1603,
                "Installer failed with exit code: 1603"
            )
    });
    let audit = Arc::new(MemoryAuditLog::new());
    let pipeline = build_pipeline(executor.clone(), ExclusionSet::empty(), audit.clone());

    let options = RunOptions {
        list_only: false,
        assume_yes: true,
    };
    let summary = pipeline
        .run(options, |_| panic!("confirmation must not be requested"))
        .await;

    assert_eq!(summary.outcome, RunOutcome::Completed);
    let statuses: Vec<(&str, UpgradeStatus, i32)> = summary
        .results
        .iter()
        .map(|r| (r.id.as_str(), r.status, r.exit_code))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("Microsoft.Edge", UpgradeStatus::Success, WINGET_UPDATE_NOT_APPLICABLE),
            ("Mozilla.Firefox", UpgradeStatus::Success, 1),
            ("Microsoft.VisualStudioCode", UpgradeStatus::Failed, 1603),
            ("7zip.7zip", UpgradeStatus::Error, -1),
            ("Notepad++.Notepad++", UpgradeStatus::Success, 0),
        ]
    );
    assert_eq!(summary.succeeded(), 3);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.errored(), 1);
    assert!(!summary.is_clean());
    assert!(audit.contains(AuditLevel::Error, "access is denied"));
    assert!(audit.contains(AuditLevel::Info, "summary: 3 succeeded, 1 failed, 1 error(s)"));
}

#[tokio::test]
async fn upgrades_route_to_the_discovering_manager() {
    let executor = Arc::new(RoutingFakeExecutor::both());
    let audit = Arc::new(MemoryAuditLog::new());
    let pipeline = build_pipeline(
        executor.clone(),
        ExclusionSet::new([
            "Microsoft.Edge",
            "Mozilla.Firefox",
            "Microsoft.VisualStudioCode",
            "7zip.7zip",
            "Notepad++.Notepad++",
            "nodejs-lts",
        ]),
        audit,
    );

    let options = RunOptions {
        list_only: false,
        assume_yes: true,
    };
    let summary = pipeline.run(options, |_| true).await;

    assert_eq!(summary.results.len(), 1);
    assert_eq!(summary.results[0].manager, ManagerKind::Secondary);
    assert!(summary.is_clean());
    assert_eq!(executor.upgrades_run(), vec![vec!["upgrade", "git", "-y"]]);
}

#[tokio::test]
async fn upgrade_timeout_is_an_error_and_later_upgrades_still_run() {
    let executor = Arc::new(RoutingFakeExecutor {
        timeouts: vec!["Mozilla.Firefox".to_string()],
        ..RoutingFakeExecutor::primary_only()
    });
    let audit = Arc::new(MemoryAuditLog::new());
    let pipeline = build_pipeline(executor.clone(), ExclusionSet::empty(), audit.clone());

    let options = RunOptions {
        list_only: false,
        assume_yes: true,
    };
    let summary = pipeline.run(options, |_| true).await;

    let firefox = summary
        .results
        .iter()
        .find(|result| result.id == "Mozilla.Firefox")
        .expect("firefox result");
    assert_eq!(
        (firefox.status, firefox.exit_code),
        (UpgradeStatus::Error, -1)
    );
    assert_eq!(summary.results.len(), 5);
    assert_eq!(summary.errored(), 1);
    assert_eq!(summary.succeeded(), 4);
    assert_eq!(executor.upgrades_run().len(), 5);
    assert!(audit.contains(AuditLevel::Error, "timed out"));
}
