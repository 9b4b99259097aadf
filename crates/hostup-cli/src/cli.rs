use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "hostup")]
#[command(version, about = "Discover, filter and apply pending package upgrades", long_about = None)]
pub struct CliArgs {
    /// JSON exclusion list (array of ids, or {"exclusions": [...]})
    #[arg(long, env = "HOSTUP_EXCLUSIONS")]
    pub exclusions: Option<PathBuf>,

    /// Directory for the per-run audit log
    #[arg(long, env = "HOSTUP_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Do not ask for confirmation before upgrading
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Print the upgrade plan and exit without upgrading
    #[arg(long)]
    pub list_only: bool,

    /// Do not query the secondary package manager
    #[arg(long)]
    pub skip_secondary: bool,

    /// Include packages whose installed version cannot be determined
    #[arg(long)]
    pub include_unknown: bool,

    /// Per-upgrade timeout in seconds
    #[arg(long, default_value_t = 1800, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Emit debug diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    pub fn exclusions_path(&self) -> Option<PathBuf> {
        self.exclusions
            .clone()
            .or_else(|| dirs::config_dir().map(|dir| dir.join("hostup").join("exclusions.json")))
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("hostup").join("logs")))
    }

    pub fn upgrade_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
