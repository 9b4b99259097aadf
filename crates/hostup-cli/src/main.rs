mod cli;
mod render;

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Confirm;
use tracing_subscriber::EnvFilter;

use hostup_core::adapters::{
    ManagerAdapter, ManagerProfile, ProcessManagerSource, UpgradeAdapter,
};
use hostup_core::audit::{AuditSink, FileAuditLog, MemoryAuditLog};
use hostup_core::config::load_exclusions;
use hostup_core::execution::{ProcessExecutor, TokioProcessExecutor};
use hostup_core::models::ExclusionSet;
use hostup_core::orchestration::{RunOptions, UpdatePipeline};
use hostup_core::reconcile::Reconciliation;

use crate::cli::CliArgs;

const EXIT_SETUP_FAILURE: u8 = 2;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(EXIT_SETUP_FAILURE)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("HOSTUP_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(args: &CliArgs) -> Result<ExitCode> {
    let audit: Arc<dyn AuditSink> = match args.log_dir() {
        Some(dir) => {
            let log = FileAuditLog::in_directory(&dir);
            tracing::debug!(path = %log.path().display(), "audit log");
            Arc::new(log)
        }
        None => {
            tracing::warn!("no local data directory; audit log kept in memory only");
            Arc::new(MemoryAuditLog::new())
        }
    };
    audit.info(&format!("hostup {} starting", env!("CARGO_PKG_VERSION")));

    let exclusions = match args.exclusions_path() {
        Some(path) => load_exclusions(&path, audit.as_ref()),
        None => ExclusionSet::empty(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let adapters = build_adapters(args, audit.clone());
    let pipeline = UpdatePipeline::new(adapters, exclusions, audit.clone())
        .context("failed to register package managers")?;

    let options = RunOptions {
        list_only: args.list_only,
        assume_yes: args.yes,
    };
    let json = args.json;
    let summary = runtime.block_on(pipeline.run(options, |plan| confirm(plan, json)));

    let mut stdout = io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &summary)
            .context("failed to write run summary")?;
        println!();
    } else {
        render::print_summary(&summary, &mut stdout).context("failed to write run summary")?;
    }

    audit.info("run finished");
    if summary.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn build_adapters(args: &CliArgs, audit: Arc<dyn AuditSink>) -> Vec<Arc<dyn ManagerAdapter>> {
    let executor: Arc<dyn ProcessExecutor> = Arc::new(TokioProcessExecutor);

    let mut profiles = vec![
        ManagerProfile::winget()
            .include_unknown(args.include_unknown)
            .upgrade_timeout(args.upgrade_timeout()),
    ];
    if !args.skip_secondary {
        profiles.push(ManagerProfile::chocolatey().upgrade_timeout(args.upgrade_timeout()));
    }

    profiles
        .into_iter()
        .map(|profile| {
            let source = ProcessManagerSource::new(profile, executor.clone());
            Arc::new(UpgradeAdapter::new(source, audit.clone())) as Arc<dyn ManagerAdapter>
        })
        .collect()
}

/// Shows the plan and asks once. A prompt that cannot be shown counts as a
/// refusal so unattended runs never upgrade without `--yes`.
fn confirm(plan: &Reconciliation, json: bool) -> bool {
    if !json {
        let mut stdout = io::stdout().lock();
        if let Err(error) = render::print_plan(plan, &mut stdout) {
            tracing::warn!(%error, "failed to print upgrade plan");
        }
    }

    if !io::stdin().is_terminal() {
        tracing::warn!("stdin is not a terminal; pass --yes to upgrade unattended");
        return false;
    }

    match Confirm::new()
        .with_prompt(format!("Upgrade {} package(s)?", plan.accepted.len()))
        .default(false)
        .interact()
    {
        Ok(answer) => answer,
        Err(error) => {
            tracing::warn!(%error, "confirmation prompt failed");
            false
        }
    }
}
