//! Ledger store port - remote collection API abstraction

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{Account, NewTransaction, Transaction};

/// Exact-match filter for account lookups
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub id: Option<String>,
    pub password: Option<String>,
}

impl AccountFilter {
    /// Filter by account id only
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            password: None,
        }
    }

    /// Filter by id and credential, as used for authentication
    pub fn by_credentials(id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            password: Some(password.into()),
        }
    }
}

/// Remote ledger store abstraction
///
/// The backing store is a collection API with find-by-field, create and
/// partial-update, read-after-write consistent on the record it just wrote.
/// Implementations map these calls onto their transport.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Find accounts matching every field present in the filter
    async fn find_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>>;

    /// Create an account; the id is caller-chosen and travels in the record
    async fn create_account(&self, account: &Account) -> Result<Account>;

    /// Partial-update of a single account's balance, returning the stored
    /// representation
    async fn update_balance(&self, id: &str, balance: Decimal) -> Result<Account>;

    /// All transactions referencing the account, newest first
    async fn find_transactions(&self, account_id: &str) -> Result<Vec<Transaction>>;

    /// Append a transaction; the store assigns the id
    async fn create_transaction(&self, tx: &NewTransaction) -> Result<Transaction>;
}
