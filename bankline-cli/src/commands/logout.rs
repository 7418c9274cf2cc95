//! Logout command - sign out and clear the stored session

use anyhow::Result;

use super::{get_context, get_logger, log_event};
use crate::output;
use bankline_core::LogEvent;

pub fn run() -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("logout"));

    let ctx = get_context()?;
    ctx.session.logout()?;

    output::success("Signed out.");
    Ok(())
}
