use crate::adapters::manager::{AdapterResult, CommandOutcome};
use crate::execution::{
    ProcessExecutor, ProcessExitStatus, ProcessOutput, ProcessSpawnRequest, spawn_validated,
};
use crate::models::SPAWN_FAILURE_EXIT_CODE;

/// Runs a request to completion and returns its exit code with stdout and
/// stderr merged. Nonzero exits are not errors here; callers decide.
pub(crate) async fn run_and_capture(
    executor: &dyn ProcessExecutor,
    request: ProcessSpawnRequest,
) -> AdapterResult<CommandOutcome> {
    let (manager, action) = (request.manager, request.action);
    let process = spawn_validated(executor, request)?;
    tracing::debug!(manager = ?manager, action = ?action, pid = ?process.pid(), "process started");
    let output: ProcessOutput = process.wait().await?;

    let exit_code = match output.status {
        ProcessExitStatus::ExitCode(code) => code,
        ProcessExitStatus::Terminated => SPAWN_FAILURE_EXIT_CODE,
    };

    Ok(CommandOutcome {
        exit_code,
        output: output.combined_text(),
    })
}

/// First non-empty stdout line of a successful run.
pub(crate) async fn run_and_collect_first_line(
    executor: &dyn ProcessExecutor,
    request: ProcessSpawnRequest,
) -> Option<String> {
    let outcome = run_and_capture(executor, request).await.ok()?;
    if outcome.exit_code != 0 {
        return None;
    }
    outcome
        .output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_owned)
}
