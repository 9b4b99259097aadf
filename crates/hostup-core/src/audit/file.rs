use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::audit::{AuditLevel, AuditSink};

/// Appends timestamped lines to a per-run log file.
///
/// Opening is lazy and retried on every record, so a log directory that
/// becomes writable mid-run still receives the remaining lines.
pub struct FileAuditLog {
    path: PathBuf,
    file: Mutex<Option<File>>,
    reported_failure: AtomicBool,
}

impl FileAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
            reported_failure: AtomicBool::new(false),
        }
    }

    /// `hostup-YYYYMMDD-HHMMSS.log` inside `dir`, stamped with the local time.
    pub fn in_directory(dir: &Path) -> Self {
        let stamp = now()
            .format(format_description!(
                "[year][month][day]-[hour][minute][second]"
            ))
            .unwrap_or_else(|_| "unknown".to_string());
        Self::new(dir.join(format!("hostup-{stamp}.log")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut guard = self
            .file
            .lock()
            .map_err(|_| std::io::Error::other("audit log lock poisoned"))?;

        if guard.is_none() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            *guard = Some(file);
        }

        match guard.as_mut() {
            Some(file) => writeln!(file, "{line}"),
            None => Ok(()),
        }
    }
}

impl AuditSink for FileAuditLog {
    fn record(&self, level: AuditLevel, message: &str) {
        let timestamp = now()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "-".to_string());
        let line = format!("{timestamp} [{level}] {message}");

        if let Err(error) = self.append(&line)
            && !self.reported_failure.swap(true, Ordering::SeqCst)
        {
            tracing::warn!(
                path = %self.path.display(),
                error = %error,
                "audit log is not writable; continuing without it"
            );
        }
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::FileAuditLog;
    use crate::audit::AuditSink;

    #[test]
    fn appends_levelled_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileAuditLog::new(dir.path().join("nested").join("run.log"));

        log.info("discovered 2 upgrades");
        log.warn("secondary manager unavailable");

        let contents = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] discovered 2 upgrades"));
        assert!(lines[1].ends_with("[WARN] secondary manager unavailable"));
    }

    #[test]
    fn unwritable_path_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let log = FileAuditLog::new(blocker.join("run.log"));
        log.error("first");
        log.error("second");
    }

    #[test]
    fn directory_constructor_uses_run_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileAuditLog::in_directory(dir.path());
        let file_name = log.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with("hostup-"));
        assert!(file_name.ends_with(".log"));
    }
}
