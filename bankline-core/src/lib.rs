//! Bankline Core - ledger-session logic for the Bankline demo bank
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, Transaction, Notification)
//! - **ports**: Trait definitions for external dependencies (LedgerStore, SessionStore)
//! - **services**: Business logic orchestration (LedgerSession, NotificationSink, EventLog)
//! - **adapters**: Concrete implementations (HTTP collection API, session file, demo store)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::demo::DemoLedgerStore;
use adapters::http::HttpLedgerStore;
use adapters::session_file::FileSessionStore;
use ports::LedgerStore;

// Re-export commonly used types at crate root
pub use config::Config;
pub use domain::result::Error;
pub use domain::{Account, NewTransaction, Notification, Severity, Transaction, TransactionKind};
pub use services::{EntryPoint, EventLog, LedgerSession, LogEntry, LogEvent, NotificationSink};

/// Main context for Bankline operations
///
/// This is the primary entry point for all business logic. It wires the
/// configuration, the backing ledger store (demo or HTTP), the session slot
/// and the notification sink into one ledger session.
pub struct BanklineContext {
    pub config: Config,
    pub store: Arc<dyn LedgerStore>,
    pub sink: Arc<NotificationSink>,
    pub session: LedgerSession,
}

impl BanklineContext {
    /// Create a new Bankline context
    pub fn new(bankline_dir: &Path) -> Result<Self> {
        let config = Config::load(bankline_dir)?;

        let store: Arc<dyn LedgerStore> = if config.demo_mode {
            Arc::new(DemoLedgerStore::with_path(bankline_dir.join("db.json"))?)
        } else {
            match &config.api_url {
                Some(url) => Arc::new(HttpLedgerStore::new_with_base_url(url)?),
                None => Arc::new(HttpLedgerStore::new()?),
            }
        };

        let sessions = Arc::new(FileSessionStore::new(bankline_dir.join("session.json")));
        let sink = Arc::new(NotificationSink::new());
        let session = LedgerSession::new(Arc::clone(&store), sessions, Arc::clone(&sink));

        Ok(Self {
            config,
            store,
            sink,
            session,
        })
    }
}
