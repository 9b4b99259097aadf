use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::execution::{
    ExecutionResult, ProcessExecutor, ProcessExitStatus, ProcessOutput, ProcessSpawnRequest,
    ProcessWaitFuture, RunningProcess,
};
use crate::models::{CoreError, CoreErrorKind, ManagerAction, ManagerKind};

/// How long stdout/stderr may keep draining once the manager itself exited.
/// Installer helpers that inherit the pipes can hold them open far longer.
const OUTPUT_DRAIN_WINDOW: Duration = Duration::from_millis(250);
const KILL_GRACE: Duration = Duration::from_secs(1);
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Runs manager commands as child processes.
///
/// Each child leads its own process group on unix so a timed-out upgrade
/// takes its installer helpers down with it; on Windows the tree is ended
/// with `taskkill /T`.
pub struct TokioProcessExecutor;

impl ProcessExecutor for TokioProcessExecutor {
    fn spawn(&self, request: ProcessSpawnRequest) -> ExecutionResult<Box<dyn RunningProcess>> {
        let ProcessSpawnRequest {
            manager,
            action,
            command,
            timeout,
        } = request;

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let program = command.program.display().to_string();
        let child = cmd.spawn().map_err(|error| {
            process_failure(manager, action, format!("failed to spawn '{program}': {error}"))
        })?;

        Ok(Box::new(ManagedChild {
            pid: child.id(),
            child: Mutex::new(child),
            program,
            timeout,
            manager,
            action,
        }))
    }
}

struct ManagedChild {
    child: Mutex<Child>,
    pid: Option<u32>,
    program: String,
    timeout: Option<Duration>,
    manager: ManagerKind,
    action: ManagerAction,
}

impl RunningProcess for ManagedChild {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn wait(self: Box<Self>) -> ProcessWaitFuture {
        let ManagedChild {
            child,
            program,
            timeout,
            manager,
            action,
            ..
        } = *self;

        Box::pin(async move {
            let mut child = child.into_inner().map_err(|_| {
                process_failure(manager, action, format!("'{program}' handle was poisoned"))
            })?;
            let stdout = OutputCollector::start(child.stdout.take());
            let stderr = OutputCollector::start(child.stderr.take());

            let exited = match timeout {
                Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                    Ok(result) => result,
                    Err(_) => {
                        kill_process_tree(&mut child).await;
                        stdout.abandon();
                        stderr.abandon();
                        return Err(CoreError::for_action(
                            manager,
                            action,
                            CoreErrorKind::Timeout,
                            format!("'{program}' timed out after {limit:?}"),
                        ));
                    }
                },
                None => child.wait().await,
            };
            let exit = exited.map_err(|error| {
                process_failure(manager, action, format!("failed to wait for '{program}': {error}"))
            })?;

            let drain_until = Instant::now() + OUTPUT_DRAIN_WINDOW;
            let stdout = stdout.collect(drain_until).await;
            let stderr = stderr.collect(drain_until).await;

            let status = match exit.code() {
                Some(code) => ProcessExitStatus::ExitCode(code),
                None => ProcessExitStatus::Terminated,
            };

            Ok(ProcessOutput {
                status,
                stdout,
                stderr,
            })
        })
    }
}

/// Reads one pipe in the background into a shared buffer, so everything
/// received before a drain deadline survives even if the pipe never closes.
struct OutputCollector {
    buffer: Arc<Mutex<Vec<u8>>>,
    reader: JoinHandle<()>,
}

impl OutputCollector {
    fn start<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let reader = tokio::spawn(async move {
            let Some(mut pipe) = pipe else {
                return;
            };
            let mut chunk = vec![0_u8; READ_CHUNK_BYTES];
            loop {
                let read = match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(read) => read,
                };
                match sink.lock() {
                    Ok(mut received) => received.extend_from_slice(&chunk[..read]),
                    Err(_) => break,
                }
            }
        });

        Self { buffer, reader }
    }

    async fn collect(mut self, deadline: Instant) -> Vec<u8> {
        if tokio::time::timeout_at(deadline, &mut self.reader)
            .await
            .is_err()
        {
            tracing::debug!("output pipe still open after exit; keeping partial output");
            self.reader.abort();
        }
        self.buffer
            .lock()
            .map(|mut received| std::mem::take(&mut *received))
            .unwrap_or_default()
    }

    fn abandon(self) {
        self.reader.abort();
    }
}

async fn kill_process_tree(child: &mut Child) {
    if let Some(pid) = child.id() {
        signal_tree(pid).await;
    }
    let _ = child.start_kill();
    let _ = tokio::time::timeout(KILL_GRACE, child.wait()).await;
}

#[cfg(unix)]
async fn signal_tree(pid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    if pgid <= 0 {
        return;
    }
    // SAFETY: kill(2) only takes integers; the group was created at spawn.
    let result = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if result != 0 {
        let error = std::io::Error::last_os_error();
        if error.raw_os_error() != Some(libc::ESRCH) {
            tracing::warn!(pid, error = %error, "failed to kill process group");
        }
    }
}

#[cfg(windows)]
async fn signal_tree(pid: u32) {
    let result = Command::new("taskkill")
        .args(["/PID", &pid.to_string(), "/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    if let Err(error) = result {
        tracing::warn!(pid, error = %error, "failed to run taskkill for process tree");
    }
}

#[cfg(not(any(unix, windows)))]
async fn signal_tree(_pid: u32) {}

fn process_failure(manager: ManagerKind, action: ManagerAction, message: String) -> CoreError {
    CoreError::for_action(manager, action, CoreErrorKind::ProcessFailure, message)
}
