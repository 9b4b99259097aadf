use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::models::ManagerKind;

/// Exit code recorded when the upgrade process could not be started or
/// did not finish.
pub const SPAWN_FAILURE_EXIT_CODE: i32 = -1;

/// A pending upgrade reported by one manager, before exclusion filtering.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UpgradeCandidate {
    pub name: String,
    pub id: String,
    pub current_version: Option<String>,
    pub available_version: Option<String>,
    pub source: Option<String>,
    pub manager: ManagerKind,
}

impl UpgradeCandidate {
    /// Identifier truncated at the first whitespace or `[`, which drops
    /// embedded source annotations such as `Vendor.App [winget]`.
    pub fn normalized_id(&self) -> &str {
        normalize_id(&self.id)
    }
}

pub fn normalize_id(id: &str) -> &str {
    let trimmed = id.trim();
    let end = trimmed
        .find(|ch: char| ch.is_whitespace() || ch == '[')
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeStatus {
    Success,
    Failed,
    Error,
}

impl Display for UpgradeStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Success => "Success",
            Self::Failed => "Failed",
            Self::Error => "Error",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct UpgradeResult {
    pub name: String,
    pub id: String,
    pub manager: ManagerKind,
    pub status: UpgradeStatus,
    pub exit_code: i32,
}

impl UpgradeResult {
    pub fn for_candidate(candidate: &UpgradeCandidate, status: UpgradeStatus, exit_code: i32) -> Self {
        Self {
            name: candidate.name.clone(),
            id: candidate.id.clone(),
            manager: candidate.manager,
            status,
            exit_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_id;

    #[test]
    fn normalize_strips_bracketed_annotation() {
        assert_eq!(normalize_id("Vendor.App [winget]"), "Vendor.App");
        assert_eq!(normalize_id("Vendor.App[msstore]"), "Vendor.App");
    }

    #[test]
    fn normalize_keeps_plain_identifier() {
        assert_eq!(normalize_id("  Git.Git "), "Git.Git");
        assert_eq!(normalize_id(""), "");
    }
}
