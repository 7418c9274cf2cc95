//! CLI command implementations

pub mod demo;
pub mod deposit;
pub mod history;
pub mod login;
pub mod logout;
pub mod logs;
pub mod register;
pub mod status;
pub mod withdraw;

use std::path::PathBuf;

use anyhow::{Context, Result};

use bankline_core::{BanklineContext, EntryPoint, EventLog, LogEvent, NotificationSink, Severity};

use crate::output;

/// Marker error for failures the notification sink already reported.
/// The top level exits nonzero without printing it a second time.
#[derive(Debug)]
pub struct OperationFailed;

impl std::fmt::Display for OperationFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "operation failed")
    }
}

impl std::error::Error for OperationFailed {}

/// Get the bankline directory from environment or default
pub fn get_bankline_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BANKLINE_DIR") {
        PathBuf::from(dir)
    } else {
        dirs::home_dir()
            .expect("Could not find home directory")
            .join(".bankline")
    }
}

/// Get or create the bankline context
pub fn get_context() -> Result<BanklineContext> {
    let bankline_dir = get_bankline_dir();

    std::fs::create_dir_all(&bankline_dir)
        .with_context(|| format!("Failed to create bankline directory: {:?}", bankline_dir))?;

    BanklineContext::new(&bankline_dir).context("Failed to initialize bankline context")
}

/// Open the event log, or None when it cannot be initialized - a command
/// that cannot log still has to run
pub fn get_logger() -> Option<EventLog> {
    let bankline_dir = get_bankline_dir();
    std::fs::create_dir_all(&bankline_dir).ok()?;
    EventLog::new(&bankline_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Record an event, swallowing log-write failures for the same reason
pub fn log_event(logger: &Option<EventLog>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Print the pending notification and acknowledge it
pub fn render_notification(sink: &NotificationSink) {
    if let Some(notification) = sink.current() {
        match notification.severity {
            Severity::Success => output::success(&notification.message),
            Severity::Error => output::error(&notification.message),
            Severity::Info => output::info(&notification.message),
        }
        sink.dismiss();
    }
}

/// Render the sink and convert a core error for exit purposes: failures the
/// user has already seen exit quietly, anything else propagates
pub fn report_failure(sink: &NotificationSink, err: bankline_core::Error) -> anyhow::Error {
    render_notification(sink);
    if err.already_notified() {
        OperationFailed.into()
    } else {
        err.into()
    }
}
