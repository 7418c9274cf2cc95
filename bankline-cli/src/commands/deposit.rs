//! Deposit command - add funds to the signed-in account

use anyhow::Result;
use rust_decimal::Decimal;

use super::{get_context, get_logger, log_event, render_notification, report_failure};
use crate::output;
use bankline_core::LogEvent;

pub async fn run(amount: Decimal, json: bool) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("deposit"));

    let ctx = get_context()?;
    if !ctx.session.restore().await? {
        anyhow::bail!("Not signed in. Use 'bl login' first.");
    }

    match ctx.session.deposit(amount).await {
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
                LogEvent::new("operation_completed").with_operation("deposit"),
            );
            Ok(())
        }
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("operation_failed")
                    .with_operation("deposit")
                    .with_error(e.to_string()),
            );
            let failure = report_failure(&ctx.sink, e);
            recover_missing_record(&ctx, &logger, "deposit").await;
            Err(failure)
        }
    }
}

/// Recovery action for the partial-failure window: the balance committed but
/// the transaction record did not. Retry the append once before giving up.
pub async fn recover_missing_record(
    ctx: &bankline_core::BanklineContext,
    logger: &Option<bankline_core::EventLog>,
    operation: &str,
) {
    if !ctx.session.needs_reconciliation() {
        return;
    }
    match ctx.session.reconcile().await {
        Ok(_) => {
            ctx.sink.dismiss();
            log_event(
                logger,
                LogEvent::new("reconcile_succeeded").with_operation(operation),
            );
            output::warning("The balance was updated; the transaction record was recovered on retry.");
        }
        Err(e) => {
            ctx.sink.dismiss();
            log_event(
                logger,
                LogEvent::new("reconcile_failed")
                    .with_operation(operation)
                    .with_error(e.to_string()),
            );
            output::warning(
                "The balance was updated but the transaction record could not be written. \
                 Your history may be temporarily incomplete.",
            );
        }
    }
}
