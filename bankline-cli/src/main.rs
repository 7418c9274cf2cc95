//! Bankline CLI - the demo bank in your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

mod commands;
mod output;

use commands::{demo, deposit, history, login, logout, logs, register, status, withdraw};

/// Bankline - the demo bank in your terminal
#[derive(Parser)]
#[command(name = "bl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with an account id and password
    Login {
        /// Account id (prompted if omitted)
        account_id: Option<String>,
    },

    /// Create an account and sign it in
    Register {
        /// Display name (prompted if omitted)
        name: Option<String>,
        /// Account id (prompted if omitted)
        account_id: Option<String>,
    },

    /// Sign out and clear the stored session
    Logout,

    /// Add funds to the signed-in account
    Deposit {
        /// Amount to deposit
        amount: Decimal,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Withdraw funds from the signed-in account
    Withdraw {
        /// Amount to withdraw
        amount: Decimal,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the transaction history
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the session status and balance
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage demo mode
    Demo {
        #[command(subcommand)]
        command: Option<demo::DemoCommands>,
    },

    /// View and manage application logs
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Failures the notification sink already reported exit quietly
            if e.downcast_ref::<commands::OperationFailed>().is_none() {
                eprintln!("{}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { account_id } => login::run(account_id).await,
        Commands::Register { name, account_id } => register::run(name, account_id).await,
        Commands::Logout => logout::run(),
        Commands::Deposit { amount, json } => deposit::run(amount, json).await,
        Commands::Withdraw { amount, json } => withdraw::run(amount, json).await,
        Commands::History { limit, json } => history::run(limit, json).await,
        Commands::Status { json } => status::run(json).await,
        Commands::Demo { command } => demo::run(command),
        Commands::Logs { command } => logs::run(command),
    }
}
