//! Event log - structured application events in a JSON-lines file
//!
//! Records what happened, never to whom: entries carry event names and
//! error text but no account ids, balances or amounts. The log lives in
//! logs.jsonl next to the other bankline files, one JSON document per line.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Entry ids combine a 48-bit millisecond timestamp with a 16-bit
/// per-process counter, so entries written in the same millisecond stay
/// distinct and ids sort in write order.
fn next_id() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    (millis << 16) | counter
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

fn platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// Which surface wrote the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    Web,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Web => "web",
        }
    }
}

/// An event about to be recorded, built up with the `with_*` setters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            command: None,
            operation: None,
            error_message: None,
            error_details: None,
        }
    }

    /// Name the CLI subcommand this event came from
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Name the ledger operation involved (login, deposit, withdraw, ...)
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }

    pub fn with_error_details(mut self, details: impl Into<String>) -> Self {
        self.error_details = Some(details.into());
        self
    }
}

/// One line of logs.jsonl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub command: Option<String>,
    pub operation: Option<String>,
    pub error_message: Option<String>,
    pub error_details: Option<String>,
}

/// Append-only event log backed by logs.jsonl.
///
/// Lines that no longer parse are skipped on read rather than failing the
/// whole query.
pub struct EventLog {
    log_path: PathBuf,
    write_lock: Mutex<()>,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl EventLog {
    pub fn new(
        bankline_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        std::fs::create_dir_all(bankline_dir)?;
        Ok(Self {
            log_path: bankline_dir.join("logs.jsonl"),
            write_lock: Mutex::new(()),
            entry_point,
            app_version: app_version.into(),
            platform: platform(),
        })
    }

    /// Record an event, stamping it with the surface, version and platform
    /// this log was opened with
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let entry = LogEntry {
            id: next_id(),
            timestamp: now_ms(),
            entry_point: self.entry_point.as_str().to_string(),
            app_version: self.app_version.clone(),
            platform: self.platform.to_string(),
            event: event.event,
            command: event.command,
            operation: event.operation,
            error_message: event.error_message,
            error_details: event.error_details,
        };

        let line = serde_json::to_string(&entry)?;

        let _guard = self.write_guard();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", line)?;

        Ok(())
    }

    /// Record a bare event name
    pub fn log_event(&self, event: &str) -> Result<()> {
        self.log(LogEvent::new(event))
    }

    /// Record that a CLI subcommand ran
    pub fn log_command(&self, command: &str) -> Result<()> {
        self.log(LogEvent::new("command_executed").with_command(command))
    }

    /// Record a failure with its message and optional detail text
    pub fn log_error(&self, event: &str, message: &str, details: Option<&str>) -> Result<()> {
        let mut log_event = LogEvent::new(event).with_error(message);
        if let Some(d) = details {
            log_event = log_event.with_error_details(d);
        }
        self.log(log_event)
    }

    fn read_all(&self) -> Result<Vec<LogEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.log_path)?;
        Ok(content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    /// The newest `limit` entries, newest first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let mut entries = self.read_all()?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    /// The newest `limit` entries that carry an error, newest first
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        let mut entries = self.read_all()?;
        entries.retain(|e| e.error_message.is_some());
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    /// How many entries the log holds
    pub fn count(&self) -> Result<u64> {
        Ok(self.read_all()?.len() as u64)
    }

    /// Drop entries older than the cutoff (unix ms), returning how many
    /// were removed.
    ///
    /// The surviving entries are written to a temp file that replaces
    /// logs.jsonl, so a crash mid-cleanup cannot lose them.
    pub fn delete_before(&self, cutoff_ms: i64) -> Result<u64> {
        let entries = self.read_all()?;
        let kept: Vec<&LogEntry> = entries.iter().filter(|e| e.timestamp >= cutoff_ms).collect();
        let deleted = (entries.len() - kept.len()) as u64;

        if deleted == 0 {
            return Ok(0);
        }

        let parent = self
            .log_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let _guard = self.write_guard();
        let mut tmp = NamedTempFile::new_in(parent)?;
        for entry in &kept {
            writeln!(tmp, "{}", serde_json::to_string(entry)?)?;
        }
        tmp.persist(&self.log_path).map_err(|e| e.error)?;

        Ok(deleted)
    }

    /// Where the log file lives
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    fn write_guard(&self) -> std::sync::MutexGuard<'_, ()> {
        // A poisoned guard protects nothing worth failing for
        self.write_lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_new_log_is_empty() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        assert!(log.log_path().ends_with("logs.jsonl"));
        assert_eq!(log.count().unwrap(), 0);
    }

    #[test]
    fn test_entries_are_stamped() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        log.log_event("test_event").unwrap();

        let entries = log.get_recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, "test_event");
        assert_eq!(entries[0].entry_point, "cli");
        assert_eq!(entries[0].app_version, "1.0.0");
    }

    #[test]
    fn test_context_fields_round_trip() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path(), EntryPoint::Web, "2.0.0").unwrap();

        log.log(
            LogEvent::new("operation_completed")
                .with_operation("deposit")
                .with_command("deposit"),
        )
        .unwrap();

        let entries = log.get_recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, "operation_completed");
        assert_eq!(entries[0].operation, Some("deposit".to_string()));
        assert_eq!(entries[0].command, Some("deposit".to_string()));
        assert_eq!(entries[0].entry_point, "web");
    }

    #[test]
    fn test_errors_are_queryable() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        log.log_event("fine").unwrap();
        log.log_error("withdraw_failed", "Connection timeout", Some("after 30s"))
            .unwrap();

        let errors = log.get_errors(10).unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].event, "withdraw_failed");
        assert_eq!(errors[0].error_message, Some("Connection timeout".to_string()));
        assert_eq!(errors[0].error_details, Some("after 30s".to_string()));
    }

    #[test]
    fn test_delete_before_cutoff() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        log.log_event("event1").unwrap();
        log.log_event("event2").unwrap();
        log.log_event("event3").unwrap();
        assert_eq!(log.count().unwrap(), 3);

        // A cutoff in the future removes everything
        let deleted = log.delete_before(now_ms() + 1000).unwrap();
        assert_eq!(deleted, 3);
        assert_eq!(log.count().unwrap(), 0);
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let log = EventLog::new(dir.path(), EntryPoint::Cli, "1.0.0").unwrap();

        log.log_event("good").unwrap();
        std::fs::write(
            log.log_path(),
            format!(
                "{}\nnot json at all\n",
                std::fs::read_to_string(log.log_path()).unwrap().trim_end()
            ),
        )
        .unwrap();

        let entries = log.get_recent(10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event, "good");
    }

    #[test]
    fn test_ids_stay_distinct_within_a_millisecond() {
        let a = next_id();
        let b = next_id();
        assert_ne!(a, b);
    }
}
