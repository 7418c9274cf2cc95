//! Withdraw command - remove funds from the signed-in account

use anyhow::Result;
use rust_decimal::Decimal;

use super::deposit::recover_missing_record;
use super::{get_context, get_logger, log_event, render_notification, report_failure};
use crate::output;
use bankline_core::LogEvent;

pub async fn run(amount: Decimal, json: bool) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("withdraw"));

    let ctx = get_context()?;
    if !ctx.session.restore().await? {
        anyhow::bail!("Not signed in. Use 'bl login' first.");
    }

    match ctx.session.withdraw(amount).await {
        Ok(account) => {
            if json {
                ctx.sink.dismiss();
                println!(
                    "{}",
                    serde_json::json!({ "balance": account.balance, "transactions": ctx.session.history().len() })
                );
            } else {
                render_notification(&ctx.sink);
                println!("New balance: {}", output::format_money(account.balance));
            }
            log_event(
                &logger,
                LogEvent::new("operation_completed").with_operation("withdraw"),
            );
            Ok(())
        }
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("operation_failed")
                    .with_operation("withdraw")
                    .with_error(e.to_string()),
            );
            let failure = report_failure(&ctx.sink, e);
            recover_missing_record(&ctx, &logger, "withdraw").await;
            Err(failure)
        }
    }
}
