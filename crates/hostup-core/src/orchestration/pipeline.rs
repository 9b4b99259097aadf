use std::sync::Arc;

use serde::Serialize;

use crate::adapters::ManagerAdapter;
use crate::audit::AuditSink;
use crate::models::{ExclusionSet, UpgradeCandidate, UpgradeResult, UpgradeStatus};
use crate::orchestration::OrchestrationResult;
use crate::orchestration::engine::UpgradeEngine;
use crate::reconcile::{Reconciliation, partition};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunOptions {
    /// Stop after reconciliation; nothing is executed.
    pub list_only: bool,
    /// Skip the confirmation gate.
    pub assume_yes: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    NothingToDo,
    ListOnly,
    Declined,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub discovered: usize,
    pub excluded: Vec<UpgradeCandidate>,
    pub planned: Vec<UpgradeCandidate>,
    pub results: Vec<UpgradeResult>,
}

impl RunSummary {
    fn without_results(outcome: RunOutcome, plan: Reconciliation) -> Self {
        Self {
            outcome,
            discovered: plan.discovered(),
            excluded: plan.excluded,
            planned: plan.accepted,
            results: Vec::new(),
        }
    }

    pub fn count(&self, status: UpgradeStatus) -> usize {
        self.results
            .iter()
            .filter(|result| result.status == status)
            .count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(UpgradeStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count(UpgradeStatus::Failed)
    }

    pub fn errored(&self) -> usize {
        self.count(UpgradeStatus::Error)
    }

    pub fn is_clean(&self) -> bool {
        self.failed() == 0 && self.errored() == 0
    }
}

/// One discovery → reconcile → confirm → execute pass over the registered
/// managers. Managers are queried sequentially, primary first.
pub struct UpdatePipeline {
    adapters: Vec<Arc<dyn ManagerAdapter>>,
    engine: UpgradeEngine,
    exclusions: ExclusionSet,
    audit: Arc<dyn AuditSink>,
}

impl UpdatePipeline {
    pub fn new(
        adapters: impl IntoIterator<Item = Arc<dyn ManagerAdapter>>,
        exclusions: ExclusionSet,
        audit: Arc<dyn AuditSink>,
    ) -> OrchestrationResult<Self> {
        let mut adapters: Vec<Arc<dyn ManagerAdapter>> = adapters.into_iter().collect();
        adapters.sort_by_key(|adapter| adapter.descriptor().kind);
        let engine = UpgradeEngine::new(adapters.iter().cloned(), audit.clone())?;

        Ok(Self {
            adapters,
            engine,
            exclusions,
            audit,
        })
    }

    pub async fn discover(&self) -> Vec<Vec<UpgradeCandidate>> {
        let mut lists = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            lists.push(adapter.discover_upgrades().await);
        }
        lists
    }

    pub async fn plan(&self) -> Reconciliation {
        let plan = partition(self.discover().await, &self.exclusions);

        for candidate in &plan.excluded {
            self.audit.info(&format!(
                "excluded: {} ({}) [{}]",
                candidate.name,
                candidate.id,
                candidate.manager.as_str()
            ));
        }
        for candidate in &plan.accepted {
            self.audit.info(&format!(
                "planned: {} ({}) {} -> {} [{}]",
                candidate.name,
                candidate.id,
                candidate.current_version.as_deref().unwrap_or("?"),
                candidate.available_version.as_deref().unwrap_or("?"),
                candidate.manager.as_str()
            ));
        }
        self.audit.info(&format!(
            "{} upgrade(s) discovered, {} excluded, {} planned",
            plan.discovered(),
            plan.excluded.len(),
            plan.accepted.len()
        ));

        plan
    }

    pub async fn execute(&self, plan: &Reconciliation) -> Vec<UpgradeResult> {
        self.engine.execute_all(&plan.accepted).await
    }

    /// Full pass. `confirm` is the only point where the run can stop before
    /// executing; it is not consulted for empty plans or with `assume_yes`.
    pub async fn run<F>(&self, options: RunOptions, confirm: F) -> RunSummary
    where
        F: FnOnce(&Reconciliation) -> bool,
    {
        let plan = self.plan().await;

        if plan.accepted.is_empty() {
            self.audit.info("nothing to upgrade");
            return RunSummary::without_results(RunOutcome::NothingToDo, plan);
        }

        if options.list_only {
            return RunSummary::without_results(RunOutcome::ListOnly, plan);
        }

        if !options.assume_yes && !confirm(&plan) {
            self.audit.info("upgrade declined by user");
            return RunSummary::without_results(RunOutcome::Declined, plan);
        }

        let results = self.execute(&plan).await;
        let summary = RunSummary {
            outcome: RunOutcome::Completed,
            discovered: plan.discovered(),
            excluded: plan.excluded,
            planned: plan.accepted,
            results,
        };

        self.audit.info(&format!(
            "summary: {} succeeded, {} failed, {} error(s)",
            summary.succeeded(),
            summary.failed(),
            summary.errored()
        ));
        summary
    }
}
