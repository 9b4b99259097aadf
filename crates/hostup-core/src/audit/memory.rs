use std::sync::Mutex;

use crate::audit::{AuditLevel, AuditSink};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuditEntry {
    pub level: AuditLevel,
    pub message: String,
}

/// Keeps records in memory. Used by tests and when no log directory can be
/// determined.
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, level: AuditLevel, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|entry| entry.level == level && entry.message.contains(needle))
    }
}

impl AuditSink for MemoryAuditLog {
    fn record(&self, level: AuditLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(AuditEntry {
                level,
                message: message.to_string(),
            });
        }
    }
}
