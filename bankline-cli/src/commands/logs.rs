//! Logs command - inspect and prune the event log

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::Subcommand;

use super::get_bankline_dir;
use crate::output;
use bankline_core::{EntryPoint, EventLog, LogEntry};

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only entries that carry an error
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete entries older than a cutoff
    Clear {
        /// Keep entries newer than this many days
        #[arg(long, default_value = "30")]
        days: u64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show entry counts and the log file location
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(command: LogsCommands) -> Result<()> {
    let log = EventLog::new(&get_bankline_dir(), EntryPoint::Cli, env!("CARGO_PKG_VERSION"))?;
    match command {
        LogsCommands::List { limit, errors, json } => list(&log, limit, errors, json),
        LogsCommands::Clear { days, force, json } => clear(&log, days, force, json),
        LogsCommands::Stats { json } => stats(&log, json),
    }
}

fn when(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

/// The subcommand and ledger operation an entry was recorded under
fn context_of(entry: &LogEntry) -> String {
    match (entry.command.as_deref(), entry.operation.as_deref()) {
        (Some(command), Some(operation)) if command != operation => {
            format!("{} ({})", command, operation)
        }
        (Some(context), _) | (_, Some(context)) => context.to_string(),
        (None, None) => String::new(),
    }
}

fn list(log: &EventLog, limit: usize, errors_only: bool, json: bool) -> Result<()> {
    let entries = if errors_only {
        log.get_errors(limit)?
    } else {
        log.get_recent(limit)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No log entries.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Time", "Event", "Context", "Error"]);
    for entry in entries {
        table.add_row(vec![
            when(entry.timestamp),
            entry.event.clone(),
            context_of(&entry),
            entry.error_message.unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn clear(log: &EventLog, days: u64, force: bool, json: bool) -> Result<()> {
    let cutoff_ms = Utc::now().timestamp_millis() - days as i64 * 86_400_000;

    if !force && !json {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete log entries older than {} days?", days))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = log.delete_before(cutoff_ms)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": deleted }));
    } else {
        println!("Deleted {} log entries", deleted);
    }
    Ok(())
}

fn stats(log: &EventLog, json: bool) -> Result<()> {
    let total = log.count()?;
    let errors = log.get_errors(total as usize)?.len();
    let size_bytes = std::fs::metadata(log.log_path()).map(|m| m.len()).unwrap_or(0);

    if json {
        println!(
            "{}",
            serde_json::json!({
                "entries": total,
                "errors": errors,
                "path": log.log_path().to_string_lossy(),
                "sizeBytes": size_bytes,
            })
        );
        return Ok(());
    }

    let mut table = output::create_table();
    table.add_row(vec!["Entries", &total.to_string()]);
    table.add_row(vec!["Errors", &errors.to_string()]);
    table.add_row(vec!["File", &log.log_path().display().to_string()]);
    table.add_row(vec!["Size", &format!("{} bytes", size_bytes)]);
    println!("{}", table);
    Ok(())
}
