//! Register command - create an account and sign it in

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Password};

use super::{get_context, get_logger, log_event, render_notification, report_failure};
use crate::output;
use bankline_core::LogEvent;

pub async fn run(name: Option<String>, account_id: Option<String>) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("register"));

    let ctx = get_context()?;

    let name = match name {
        Some(name) => name,
        None => Input::new().with_prompt("Name").interact_text()?,
    };
    let account_id = match account_id {
        Some(id) => id,
        None => Input::new().with_prompt("Account ID").interact_text()?,
    };
    let password = Password::new()
        .with_prompt("Password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()?;

    match ctx.session.register(&name, &account_id, &password).await {
        Ok(account) => {
            render_notification(&ctx.sink);
            println!("Signed in as {} ({})", account.name.bold(), account.id);
            println!("Balance: {}", output::format_money(account.balance));
            log_event(
                &logger,
                LogEvent::new("registration_succeeded").with_operation("register"),
            );
            Ok(())
        }
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("registration_failed")
                    .with_operation("register")
                    .with_error(e.to_string()),
            );
            Err(report_failure(&ctx.sink, e))
        }
    }
}
