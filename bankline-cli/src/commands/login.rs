//! Login command - sign in with an account id and password

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Password};

use super::{get_context, get_logger, log_event, render_notification, report_failure};
use crate::output;
use bankline_core::{Error, LogEvent};

pub async fn run(account_id: Option<String>) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("login"));

    let ctx = get_context()?;

    let account_id = match account_id {
        Some(id) => id,
        None => Input::new().with_prompt("Account ID").interact_text()?,
    };
    let password = Password::new().with_prompt("Password").interact()?;

    match ctx.session.authenticate(&account_id, &password).await {
        Ok(account) => {
            render_notification(&ctx.sink);
            println!("Signed in as {} ({})", account.name.bold(), account.id);
            println!("Balance: {}", output::format_money(account.balance));
            log_event(&logger, LogEvent::new("login_succeeded").with_operation("login"));
            Ok(())
        }
        Err(e) => {
            // An ambiguous match means the store's uniqueness policy is
            // broken; keep it distinguishable in the logs
            if let Error::AmbiguousCredentials(n) = &e {
                log_event(
                    &logger,
                    LogEvent::new("login_ambiguous")
                        .with_operation("login")
                        .with_error(format!("{} accounts matched", n)),
                );
            } else {
                log_event(
                    &logger,
                    LogEvent::new("login_failed")
                        .with_operation("login")
                        .with_error(e.to_string()),
                );
            }
            Err(report_failure(&ctx.sink, e))
        }
    }
}
