//! Append-only audit trail of a run.
//!
//! Components receive an `Arc<dyn AuditSink>` at construction. Sinks never
//! return errors: a sink that cannot write reports the problem through
//! `tracing` and keeps accepting records.

pub mod file;
pub mod memory;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

pub use file::FileAuditLog;
pub use memory::MemoryAuditLog;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditLevel {
    Info,
    Warn,
    Error,
}

impl Display for AuditLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, level: AuditLevel, message: &str);

    fn info(&self, message: &str) {
        self.record(AuditLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(AuditLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(AuditLevel::Error, message);
    }
}
