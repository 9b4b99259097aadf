use std::time::Duration;

use crate::execution::CommandSpec;
use crate::models::{ManagerDescriptor, ManagerKind};

/// `0x8A15002B`, reported by winget when the installed version already
/// satisfies the request.
pub const WINGET_UPDATE_NOT_APPLICABLE: i32 = 0x8A15_002B_u32 as i32;

const ID_PLACEHOLDER: &str = "{id}";
const QUERY_TIMEOUT: Duration = Duration::from_secs(300);
const UPGRADE_TIMEOUT: Duration = Duration::from_secs(1800);

const WINGET_DESCRIPTOR: ManagerDescriptor = ManagerDescriptor {
    kind: ManagerKind::Primary,
    display_name: "WinGet",
    executable: "winget",
};

const CHOCOLATEY_DESCRIPTOR: ManagerDescriptor = ManagerDescriptor {
    kind: ManagerKind::Secondary,
    display_name: "Chocolatey",
    executable: "choco",
};

/// Command table for one package manager.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ManagerProfile {
    pub descriptor: ManagerDescriptor,
    pub structured_query: Vec<String>,
    pub tabular_query: Vec<String>,
    /// Upgrade arguments; `{id}` is replaced with the candidate id.
    pub upgrade: Vec<String>,
    pub extra_search_paths: Vec<String>,
    pub query_timeout: Duration,
    pub upgrade_timeout: Duration,
}

impl ManagerProfile {
    pub fn winget() -> Self {
        Self {
            descriptor: WINGET_DESCRIPTOR,
            structured_query: strings(&[
                "upgrade",
                "--output",
                "json",
                "--accept-source-agreements",
            ]),
            tabular_query: strings(&["upgrade", "--accept-source-agreements"]),
            upgrade: strings(&[
                "upgrade",
                "--id",
                ID_PLACEHOLDER,
                "--exact",
                "--silent",
                "--accept-source-agreements",
                "--accept-package-agreements",
            ]),
            extra_search_paths: windows_apps_dir().into_iter().collect(),
            query_timeout: QUERY_TIMEOUT,
            upgrade_timeout: UPGRADE_TIMEOUT,
        }
    }

    pub fn chocolatey() -> Self {
        Self {
            descriptor: CHOCOLATEY_DESCRIPTOR,
            structured_query: strings(&["outdated", "--format", "json"]),
            tabular_query: strings(&["outdated"]),
            upgrade: strings(&["upgrade", ID_PLACEHOLDER, "-y"]),
            extra_search_paths: chocolatey_bin_dir().into_iter().collect(),
            query_timeout: QUERY_TIMEOUT,
            upgrade_timeout: UPGRADE_TIMEOUT,
        }
    }

    /// Adds winget's flag for packages whose installed version is unknown
    /// to both query forms.
    pub fn include_unknown(mut self, include: bool) -> Self {
        if include && self.descriptor.kind == ManagerKind::Primary {
            self.structured_query.push("--include-unknown".to_string());
            self.tabular_query.push("--include-unknown".to_string());
        }
        self
    }

    pub fn upgrade_timeout(mut self, timeout: Duration) -> Self {
        self.upgrade_timeout = timeout;
        self
    }

    pub fn kind(&self) -> ManagerKind {
        self.descriptor.kind
    }

    pub fn structured_command(&self, program: &str) -> CommandSpec {
        CommandSpec::new(program).args(self.structured_query.iter().cloned())
    }

    pub fn tabular_command(&self, program: &str) -> CommandSpec {
        CommandSpec::new(program).args(self.tabular_query.iter().cloned())
    }

    pub fn upgrade_command(&self, program: &str, id: &str) -> CommandSpec {
        CommandSpec::new(program).args(
            self.upgrade
                .iter()
                .map(|arg| if arg == ID_PLACEHOLDER { id.to_string() } else { arg.clone() }),
        )
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn windows_apps_dir() -> Option<String> {
    let local = std::env::var("LOCALAPPDATA").ok()?;
    Some(format!(r"{local}\Microsoft\WindowsApps"))
}

fn chocolatey_bin_dir() -> Option<String> {
    let root = std::env::var("ChocolateyInstall")
        .or_else(|_| std::env::var("ProgramData").map(|data| format!(r"{data}\chocolatey")))
        .ok()?;
    Some(format!(r"{root}\bin"))
}
