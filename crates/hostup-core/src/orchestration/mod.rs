pub mod classify;
pub mod engine;
pub mod pipeline;

pub use classify::{SUCCESS_PATTERNS, classify_outcome, reports_success};
pub use engine::UpgradeEngine;
pub use pipeline::{RunOptions, RunOutcome, RunSummary, UpdatePipeline};

use crate::models::CoreError;

pub type OrchestrationResult<T> = Result<T, CoreError>;
