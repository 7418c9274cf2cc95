//! Status command - show the session status and balance

use anyhow::Result;
use colored::Colorize;

use super::{get_context, get_logger, log_event};
use crate::output;
use bankline_core::LogEvent;

pub async fn run(json: bool) -> Result<()> {
    let logger = get_logger();
    log_event(&logger, LogEvent::new("command_executed").with_command("status"));

    let ctx = get_context()?;
    let restored = ctx.session.restore().await?;
    let account = ctx.session.account();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "authenticated": restored,
                "accountId": account.as_ref().map(|a| a.id.clone()),
                "name": account.as_ref().map(|a| a.name.clone()),
                "balance": account.as_ref().map(|a| a.balance),
                "transactions": ctx.session.history().len(),
                "demoMode": ctx.config.demo_mode,
            })
        );
        return Ok(());
    }

    println!("{}", "Bankline Status".bold());
    println!();

    if ctx.config.demo_mode {
        output::info("Demo mode is on; operations run against local demo data.");
        println!();
    }

    match account {
        Some(account) => {
            let mut table = output::create_table();
            table.add_row(vec!["Account", &account.id]);
            table.add_row(vec!["Name", &account.name]);
            table.add_row(vec!["Balance", &output::format_money(account.balance)]);
            table.add_row(vec![
                "Transactions",
                &ctx.session.history().len().to_string(),
            ]);
            println!("{}", table);
        }
        None => {
            println!("Not signed in. Use 'bl login' or 'bl register'.");
        }
    }

    Ok(())
}
