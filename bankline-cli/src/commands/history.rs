//! History command - show the transaction history, newest first

use anyhow::Result;

use super::{get_context, get_logger, log_event, report_failure};
use crate::output;
use bankline_core::LogEvent;

pub async fn run(limit: usize, json: bool) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("history"));

    let ctx = get_context()?;
    if !ctx.session.restore().await? {
        anyhow::bail!("Not signed in. Use 'bl login' first.");
    }

    if let Err(e) = ctx.session.refresh_history().await {
        return Err(report_failure(&ctx.sink, e));
    }

    let history = ctx.session.history();

    if json {
        let page: Vec<_> = history.iter().take(limit).collect();
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if history.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Date", "Type", "Amount"]);
    for tx in history.iter().take(limit) {
        table.add_row(vec![
            tx.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            tx.kind.as_str().to_string(),
            output::format_money(tx.signed_amount()),
        ]);
    }
    println!("{}", table);

    if history.len() > limit {
        println!("Showing {} of {} transactions", limit, history.len());
    }

    Ok(())
}
