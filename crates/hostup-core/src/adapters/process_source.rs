use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::adapters::detect_utils::which_executable;
use crate::adapters::manager::{AdapterResult, CommandOutcome, ManagerSource, QueryMode};
use crate::adapters::process_utils::run_and_capture;
use crate::adapters::profile::ManagerProfile;
use crate::execution::{CommandSpec, ProcessExecutor, ProcessSpawnRequest};
use crate::models::ManagerAction;

/// [`ManagerSource`] that shells out to the real package-manager binary.
pub struct ProcessManagerSource {
    profile: ManagerProfile,
    executor: Arc<dyn ProcessExecutor>,
    resolved: OnceCell<Option<PathBuf>>,
}

impl ProcessManagerSource {
    pub fn new(profile: ManagerProfile, executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            profile,
            executor,
            resolved: OnceCell::new(),
        }
    }

    async fn resolved_program(&self) -> Option<&PathBuf> {
        self.resolved
            .get_or_init(|| async {
                which_executable(
                    self.executor.as_ref(),
                    self.profile.descriptor.executable,
                    &self.profile.extra_search_paths,
                    self.profile.kind(),
                )
                .await
            })
            .await
            .as_ref()
    }

    /// Resolved absolute path when known, else the bare executable name.
    async fn program(&self) -> String {
        match self.resolved_program().await {
            Some(path) => path.to_string_lossy().to_string(),
            None => self.profile.descriptor.executable.to_string(),
        }
    }

    fn request(&self, action: ManagerAction, command: CommandSpec) -> ProcessSpawnRequest {
        let timeout = match action {
            ManagerAction::Upgrade => self.profile.upgrade_timeout,
            ManagerAction::Detect | ManagerAction::ListUpgrades => self.profile.query_timeout,
        };
        ProcessSpawnRequest::new(self.profile.kind(), action, command).timeout(timeout)
    }
}

#[async_trait]
impl ManagerSource for ProcessManagerSource {
    fn profile(&self) -> &ManagerProfile {
        &self.profile
    }

    async fn is_available(&self) -> bool {
        self.resolved_program().await.is_some()
    }

    async fn query(&self, mode: QueryMode) -> AdapterResult<CommandOutcome> {
        let program = self.program().await;
        let command = match mode {
            QueryMode::Structured => self.profile.structured_command(&program),
            QueryMode::Tabular => self.profile.tabular_command(&program),
        };
        tracing::debug!(manager = ?self.profile.kind(), command = %command.display(), "querying upgrades");
        run_and_capture(
            self.executor.as_ref(),
            self.request(ManagerAction::ListUpgrades, command),
        )
        .await
    }

    async fn upgrade(&self, id: &str) -> AdapterResult<CommandOutcome> {
        let program = self.program().await;
        let command = self.profile.upgrade_command(&program, id);
        tracing::debug!(manager = ?self.profile.kind(), command = %command.display(), "running upgrade");
        run_and_capture(
            self.executor.as_ref(),
            self.request(ManagerAction::Upgrade, command),
        )
        .await
    }
}
