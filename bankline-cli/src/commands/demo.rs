//! Demo command - toggle demo mode and seed its local data

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::get_bankline_dir;
use bankline_core::adapters::demo::{DemoLedgerStore, DEMO_ACCOUNT_ID, DEMO_PASSWORD};
use bankline_core::Config;

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Enable demo mode and seed local demo data
    #[command(name = "on")]
    On,
    /// Disable demo mode
    #[command(name = "off")]
    Off,
    /// Show demo mode status
    Status,
}

pub fn run(command: Option<DemoCommands>) -> Result<()> {
    let bankline_dir = get_bankline_dir();
    std::fs::create_dir_all(&bankline_dir)?;
    let mut config = Config::load(&bankline_dir)?;

    match command {
        Some(DemoCommands::On) => {
            config.enable_demo_mode();
            config.save(&bankline_dir)?;

            let store = DemoLedgerStore::with_path(bankline_dir.join("db.json"))?;
            store.seed_demo_data()?;

            println!("{}", "Demo mode enabled".green());
            println!(
                "Sign in with account id '{}' and password '{}'.",
                DEMO_ACCOUNT_ID, DEMO_PASSWORD
            );
            Ok(())
        }
        Some(DemoCommands::Off) => {
            config.disable_demo_mode();
            config.save(&bankline_dir)?;
            println!("{}", "Demo mode disabled".yellow());
            Ok(())
        }
        Some(DemoCommands::Status) | None => {
            if config.demo_mode {
                println!("Demo mode is {}", "ON".green());
            } else {
                println!("Demo mode is {}", "OFF".yellow());
            }
            Ok(())
        }
    }
}
