//! Converts raw package-manager query output into [`ParsedUpgrade`] records.
//!
//! Two strategies exist: [`parse_structured`] for JSON reports (tolerating
//! banner text around the payload) and [`parse_tabular`] for the
//! column-aligned text tables printed by the same tools. Both produce the
//! same record shape; tagging with a manager happens in the adapters.

pub mod fields;
pub mod structured;
pub mod tabular;

use thiserror::Error;

use crate::models::{ManagerKind, UpgradeCandidate};

pub use structured::parse_structured;
pub use tabular::{TabularReport, parse_tabular};

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseFailure {
    #[error("no JSON opening bracket found in output")]
    NoOpeningBracket,
    #[error("no closing '{closing}' found after offset {start}")]
    NoMatchingBracket { closing: char, start: usize },
    #[error("structured output yielded no usable records{}", detail_suffix(.detail))]
    NoUsableRecords { detail: Option<String> },
    #[error("no dashed separator line found in tabular output")]
    NoSeparator,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

/// One upgrade row recovered from a query, not yet attributed to a manager.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParsedUpgrade {
    pub name: String,
    pub id: String,
    pub current_version: Option<String>,
    pub available_version: Option<String>,
    pub source: Option<String>,
}

impl ParsedUpgrade {
    pub fn into_candidate(self, manager: ManagerKind) -> UpgradeCandidate {
        UpgradeCandidate {
            name: self.name,
            id: self.id,
            current_version: self.current_version,
            available_version: self.available_version,
            source: self.source,
            manager,
        }
    }
}

pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
