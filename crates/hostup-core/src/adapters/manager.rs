use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;

use crate::adapters::profile::ManagerProfile;
use crate::audit::AuditSink;
use crate::models::{CoreError, ManagerDescriptor, ManagerKind, UpgradeCandidate};
use crate::parser::{ParseFailure, ParsedUpgrade, parse_structured, parse_tabular};

pub type AdapterResult<T> = Result<T, CoreError>;

/// Tool phrases meaning the structured query form is not supported.
static UNSUPPORTED_OPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(unrecognized|unknown)\s+(option|argument|switch)|argument name was not recognized",
    )
    .unwrap()
});

/// Tool phrases meaning there is simply nothing to upgrade.
static NOTHING_TO_UPGRADE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)no installed package found|no available upgrade found|no applicable updates? found|\b0\s+packages?(\(s\))?\s+(are|is)\s+outdated",
    )
    .unwrap()
});

const DIAGNOSTIC_EXCERPT_LINES: usize = 6;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryMode {
    Structured,
    Tabular,
}

/// Exit code plus combined stdout/stderr of one finished command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutcome {
    pub exit_code: i32,
    pub output: String,
}

/// Raw command access for one package manager. Implementations only run
/// commands; all interpretation happens in [`UpgradeAdapter`].
#[async_trait]
pub trait ManagerSource: Send + Sync {
    fn profile(&self) -> &ManagerProfile;

    async fn is_available(&self) -> bool;

    async fn query(&self, mode: QueryMode) -> AdapterResult<CommandOutcome>;

    async fn upgrade(&self, id: &str) -> AdapterResult<CommandOutcome>;
}

#[async_trait]
pub trait ManagerAdapter: Send + Sync {
    fn descriptor(&self) -> &ManagerDescriptor;

    /// Pending upgrades, each tagged with this manager. Never fails: an
    /// unavailable tool or unparseable output yields an empty list.
    async fn discover_upgrades(&self) -> Vec<UpgradeCandidate>;

    async fn upgrade(&self, candidate: &UpgradeCandidate) -> AdapterResult<CommandOutcome>;
}

pub struct UpgradeAdapter<S: ManagerSource> {
    source: S,
    audit: Arc<dyn AuditSink>,
}

impl<S: ManagerSource> UpgradeAdapter<S> {
    pub fn new(source: S, audit: Arc<dyn AuditSink>) -> Self {
        Self { source, audit }
    }

    fn kind(&self) -> ManagerKind {
        self.source.profile().kind()
    }

    fn name(&self) -> &'static str {
        self.source.profile().descriptor.display_name
    }

    async fn discover_structured(&self) -> Option<Vec<ParsedUpgrade>> {
        let outcome = match self.source.query(QueryMode::Structured).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::debug!(manager = ?self.kind(), error = %error, "structured query failed");
                return None;
            }
        };

        if rejects_structured_query(&outcome.output) {
            tracing::debug!(
                manager = ?self.kind(),
                "structured query rejected by tool; falling back to table output"
            );
            return None;
        }

        match parse_structured(&outcome.output) {
            Ok(records) => Some(records),
            Err(failure) => {
                tracing::debug!(manager = ?self.kind(), failure = %failure, "structured output unusable");
                None
            }
        }
    }

    async fn discover_tabular(&self) -> Vec<ParsedUpgrade> {
        let outcome = match self.source.query(QueryMode::Tabular).await {
            Ok(outcome) => outcome,
            Err(error) => {
                self.audit
                    .warn(&format!("{}: upgrade query failed: {error}", self.name()));
                return Vec::new();
            }
        };

        match parse_tabular(outcome.output.lines()) {
            Ok(report) => {
                for line in &report.skipped {
                    self.audit
                        .warn(&format!("{}: could not parse upgrade row: {line}", self.name()));
                }
                report.records
            }
            Err(ParseFailure::NoSeparator) if NOTHING_TO_UPGRADE_RE.is_match(&outcome.output) => {
                Vec::new()
            }
            Err(failure) => {
                self.audit.warn(&format!(
                    "{}: {failure} (exit code {}); output began with: {}",
                    self.name(),
                    outcome.exit_code,
                    excerpt(&outcome.output)
                ));
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl<S: ManagerSource> ManagerAdapter for UpgradeAdapter<S> {
    fn descriptor(&self) -> &ManagerDescriptor {
        &self.source.profile().descriptor
    }

    async fn discover_upgrades(&self) -> Vec<UpgradeCandidate> {
        if !self.source.is_available().await {
            self.audit.info(&format!(
                "{} ({}) not found; skipping",
                self.name(),
                self.descriptor().executable
            ));
            return Vec::new();
        }

        let records = match self.discover_structured().await {
            Some(records) => records,
            None => self.discover_tabular().await,
        };

        let kind = self.kind();
        let candidates: Vec<UpgradeCandidate> = records
            .into_iter()
            .map(|record| record.into_candidate(kind))
            .collect();

        tracing::debug!(manager = ?kind, count = candidates.len(), "discovered upgrades");
        self.audit.info(&format!(
            "{}: {} upgrade(s) available",
            self.name(),
            candidates.len()
        ));
        candidates
    }

    async fn upgrade(&self, candidate: &UpgradeCandidate) -> AdapterResult<CommandOutcome> {
        self.source.upgrade(&candidate.id).await
    }
}

/// True when the output carries a tool error about an unknown option and
/// does not open with a JSON payload.
pub fn rejects_structured_query(output: &str) -> bool {
    let opens_json = output.trim_start().starts_with(['[', '{']);
    !opens_json && UNSUPPORTED_OPTION_RE.is_match(output)
}

fn excerpt(output: &str) -> String {
    let lines: Vec<&str> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(DIAGNOSTIC_EXCERPT_LINES)
        .collect();
    if lines.is_empty() {
        "<no output>".to_string()
    } else {
        lines.join(" | ")
    }
}
