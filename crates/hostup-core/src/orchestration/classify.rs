use std::sync::LazyLock;

use regex::RegexSet;

use crate::adapters::WINGET_UPDATE_NOT_APPLICABLE;
use crate::models::UpgradeStatus;

/// Output phrases that mean the upgrade succeeded or was unnecessary even
/// when the exit code says otherwise. Older tool releases report success
/// only this way.
pub const SUCCESS_PATTERNS: &[&str] = &[
    r"(?i)successfully\s+(installed|upgraded)",
    r"(?i)already\s+up[\s-]to[\s-]date",
    r"(?i)no\s+applicable\s+updates?\s+found",
    r"(?i)no\s+updates?\s+found",
    r"(?i)no\s+available\s+upgrade\s+found",
];

static SUCCESS_SET: LazyLock<RegexSet> = LazyLock::new(|| RegexSet::new(SUCCESS_PATTERNS).unwrap());

/// Layered success policy, evaluated in order:
/// exit code 0, the "update not applicable" sentinel, then output text.
pub fn classify_outcome(exit_code: i32, output: &str) -> UpgradeStatus {
    if exit_code == 0 || exit_code == WINGET_UPDATE_NOT_APPLICABLE {
        return UpgradeStatus::Success;
    }

    if reports_success(output) {
        return UpgradeStatus::Success;
    }

    UpgradeStatus::Failed
}

pub fn reports_success(output: &str) -> bool {
    SUCCESS_SET.is_match(output)
}
