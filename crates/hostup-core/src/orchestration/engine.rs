use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::ManagerAdapter;
use crate::audit::AuditSink;
use crate::models::{
    CoreError, CoreErrorKind, ManagerKind, SPAWN_FAILURE_EXIT_CODE, UpgradeCandidate,
    UpgradeResult, UpgradeStatus,
};
use crate::orchestration::OrchestrationResult;
use crate::orchestration::classify::classify_outcome;

/// Runs accepted upgrades one at a time, routing each candidate to the
/// adapter of the manager that discovered it.
#[derive(Clone)]
pub struct UpgradeEngine {
    adapters: Arc<HashMap<ManagerKind, Arc<dyn ManagerAdapter>>>,
    audit: Arc<dyn AuditSink>,
}

impl UpgradeEngine {
    pub fn new(
        adapters: impl IntoIterator<Item = Arc<dyn ManagerAdapter>>,
        audit: Arc<dyn AuditSink>,
    ) -> OrchestrationResult<Self> {
        let mut mapped = HashMap::new();
        for adapter in adapters {
            let manager = adapter.descriptor().kind;
            if mapped.insert(manager, adapter).is_some() {
                return Err(CoreError {
                    manager: Some(manager),
                    action: None,
                    kind: CoreErrorKind::InvalidInput,
                    message: format!("duplicate adapter registration for manager '{manager:?}'"),
                });
            }
        }

        Ok(Self {
            adapters: Arc::new(mapped),
            audit,
        })
    }

    /// One result per candidate, in input order. A failing candidate never
    /// stops the ones after it.
    pub async fn execute_all(&self, candidates: &[UpgradeCandidate]) -> Vec<UpgradeResult> {
        let mut results = Vec::with_capacity(candidates.len());
        for (index, candidate) in candidates.iter().enumerate() {
            self.audit.info(&format!(
                "[{}/{}] upgrading {} ({}) via {}",
                index + 1,
                candidates.len(),
                candidate.name,
                candidate.id,
                candidate.manager.as_str()
            ));
            results.push(self.execute_one(candidate).await);
        }
        results
    }

    pub async fn execute_one(&self, candidate: &UpgradeCandidate) -> UpgradeResult {
        let Some(adapter) = self.adapters.get(&candidate.manager) else {
            self.audit.error(&format!(
                "{}: no adapter registered for {} manager",
                candidate.id,
                candidate.manager.as_str()
            ));
            return UpgradeResult::for_candidate(
                candidate,
                UpgradeStatus::Error,
                SPAWN_FAILURE_EXIT_CODE,
            );
        };

        match adapter.upgrade(candidate).await {
            Ok(outcome) => {
                let status = classify_outcome(outcome.exit_code, &outcome.output);
                tracing::debug!(
                    manager = ?candidate.manager,
                    id = %candidate.id,
                    exit_code = outcome.exit_code,
                    status = %status,
                    "upgrade finished"
                );
                match status {
                    UpgradeStatus::Success => self.audit.info(&format!(
                        "{}: {status} (exit code {})",
                        candidate.id, outcome.exit_code
                    )),
                    _ => self.audit.error(&format!(
                        "{}: {status} (exit code {}); output: {}",
                        candidate.id,
                        outcome.exit_code,
                        outcome.output.trim()
                    )),
                }
                UpgradeResult::for_candidate(candidate, status, outcome.exit_code)
            }
            Err(error) => {
                tracing::warn!(
                    manager = ?candidate.manager,
                    id = %candidate.id,
                    kind = ?error.kind,
                    message = %error.message,
                    "upgrade could not be run"
                );
                self.audit
                    .error(&format!("{}: Error; {}", candidate.id, error.message));
                UpgradeResult::for_candidate(
                    candidate,
                    UpgradeStatus::Error,
                    SPAWN_FAILURE_EXIT_CODE,
                )
            }
        }
    }
}
