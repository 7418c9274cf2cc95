//! Demo ledger store for demo mode and testing
//!
//! Holds the same two collections the remote API serves (users and
//! transactions) in memory behind the `LedgerStore` port. Optionally backed
//! by a db.json file so demo state survives across invocations; the file
//! uses the exact shape the collection API serves.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{sort_newest_first, Account, NewTransaction, Transaction, TransactionKind};
use crate::ports::{AccountFilter, LedgerStore};

/// Account id seeded by demo mode
pub const DEMO_ACCOUNT_ID: &str = "demo";
/// Password of the seeded demo account
pub const DEMO_PASSWORD: &str = "demo";

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collections {
    #[serde(default)]
    users: Vec<Account>,
    #[serde(default)]
    transactions: Vec<Transaction>,
}

/// In-memory, optionally file-backed implementation of the ledger store
pub struct DemoLedgerStore {
    state: Mutex<Collections>,
    /// When set, every mutation is flushed to this db.json
    path: Option<PathBuf>,
}

impl DemoLedgerStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Collections::default()),
            path: None,
        }
    }

    /// Create a store backed by a db.json file, loading it if present
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let collections = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Collections::default()
        };
        Ok(Self {
            state: Mutex::new(collections),
            path: Some(path),
        })
    }

    /// Path of the backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Populate the demo account and its history, replacing any previous
    /// demo data
    pub fn seed_demo_data(&self) -> Result<()> {
        let mut state = self.lock();
        state.users.retain(|u| u.id != DEMO_ACCOUNT_ID);
        state
            .transactions
            .retain(|t| t.account_id != DEMO_ACCOUNT_ID);
        state.users.push(generate_demo_account());
        state.transactions.extend(generate_demo_transactions());
        self.flush(&state)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Collections> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn flush(&self, state: &Collections) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_string_pretty(state)?)?;
        }
        Ok(())
    }
}

impl Default for DemoLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for DemoLedgerStore {
    async fn find_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let state = self.lock();
        Ok(state
            .users
            .iter()
            .filter(|u| filter.id.as_deref().map_or(true, |id| u.id == id))
            .filter(|u| {
                filter
                    .password
                    .as_deref()
                    .map_or(true, |pw| u.password.as_deref() == Some(pw))
            })
            .cloned()
            .collect())
    }

    async fn create_account(&self, account: &Account) -> Result<Account> {
        let mut state = self.lock();
        if state.users.iter().any(|u| u.id == account.id) {
            return Err(Error::store(format!(
                "account id already exists: {}",
                account.id
            )));
        }
        state.users.push(account.clone());
        self.flush(&state)?;
        Ok(account.clone())
    }

    async fn update_balance(&self, id: &str, balance: Decimal) -> Result<Account> {
        let mut state = self.lock();
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Err(Error::store("Ledger store resource not found"));
        };
        user.balance = balance;
        let updated = user.clone();
        self.flush(&state)?;
        Ok(updated)
    }

    async fn find_transactions(&self, account_id: &str) -> Result<Vec<Transaction>> {
        let state = self.lock();
        let mut transactions: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|t| t.account_id == account_id)
            .cloned()
            .collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }

    async fn create_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        let mut state = self.lock();
        let created = tx.clone().with_id(Uuid::new_v4().to_string());
        state.transactions.push(created.clone());
        self.flush(&state)?;
        Ok(created)
    }
}

/// The account seeded by demo mode
pub fn generate_demo_account() -> Account {
    let mut account = Account::new(DEMO_ACCOUNT_ID, "Demo User", DEMO_PASSWORD);
    account.balance = Decimal::new(132500, 2); // $1,325.00
    account
}

/// A month of demo activity whose signed amounts sum to the demo balance
pub fn generate_demo_transactions() -> Vec<Transaction> {
    let now = Utc::now();
    let entries: [(i64, TransactionKind, i64); 7] = [
        (30, TransactionKind::Deposit, 200000),   // $2,000.00
        (25, TransactionKind::Withdrawal, 45000), // $450.00
        (20, TransactionKind::Deposit, 75000),    // $750.00
        (14, TransactionKind::Withdrawal, 32500), // $325.00
        (9, TransactionKind::Withdrawal, 18000),  // $180.00
        (5, TransactionKind::Deposit, 15000),     // $150.00
        (2, TransactionKind::Withdrawal, 62000),  // $620.00
    ];

    entries
        .iter()
        .enumerate()
        .map(|(i, (days_ago, kind, cents))| Transaction {
            id: format!("demo-tx-{}", i + 1),
            account_id: DEMO_ACCOUNT_ID.to_string(),
            kind: *kind,
            amount: Decimal::new(*cents, 2),
            timestamp: now - Duration::days(*days_ago),
        })
        .collect()
}
