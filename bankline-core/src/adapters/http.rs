//! HTTP ledger store client
//!
//! Talks to the remote collection API persisting accounts and transactions.
//! The API is a json-server style resource collection:
//! - GET /users?id=..&password=..            exact-field filtering
//! - POST /users                             create (id is caller-chosen)
//! - PATCH /users/{id}                       partial update
//! - GET /transactions?accountId=..&_sort=timestamp&_order=desc
//! - POST /transactions                      create (id assigned by store)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;

use crate::domain::result::{Error, Result as DomainResult};
use crate::domain::{Account, NewTransaction, Transaction};
use crate::ports::{AccountFilter, LedgerStore};

/// Default API URL, matching the json-server default port
const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Environment variable to override the API base URL.
/// Set this to point at a staging server or a test double.
pub const API_URL_ENV: &str = "BANKLINE_API_URL";

/// Get the API base URL, checking the environment variable first
pub fn get_base_url() -> String {
    std::env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// HTTP client for the remote ledger store
#[derive(Debug)]
pub struct HttpLedgerStore {
    client: Client,
    base_url: String,
}

impl HttpLedgerStore {
    /// Create a new client against the configured base URL.
    ///
    /// Uses the `BANKLINE_API_URL` environment variable if set, otherwise
    /// the json-server default.
    pub fn new() -> Result<Self> {
        Self::new_with_base_url(&get_base_url())
    }

    /// Create a new client with an explicit base URL
    pub fn new_with_base_url(base_url: &str) -> Result<Self> {
        if base_url.is_empty() {
            anyhow::bail!("Ledger store base URL cannot be empty");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Map request errors to user-meaningful store errors
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::store("Connection to the ledger store timed out after 30 seconds")
        } else if error.is_connect() {
            Error::store(format!("Unable to connect to the ledger store at {}", self.base_url))
        } else {
            Error::store(format!("Ledger store request failed: {}", error))
        }
    }

    /// Check response status and return appropriate errors
    fn check_response_status(&self, response: &reqwest::Response) -> DomainResult<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        match status.as_u16() {
            404 => Err(Error::store("Ledger store resource not found")),
            500..=599 => Err(Error::store(format!(
                "Ledger store internal error: HTTP {}",
                status.as_u16()
            ))),
            code => Err(Error::store(format!("Ledger store error: HTTP {}", code))),
        }
    }
}

#[async_trait]
impl LedgerStore for HttpLedgerStore {
    async fn find_accounts(&self, filter: &AccountFilter) -> DomainResult<Vec<Account>> {
        let url = format!("{}/users", self.base_url);

        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(id) = &filter.id {
            query.push(("id", id));
        }
        if let Some(password) = &filter.password {
            query.push(("password", password));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(&response)?;

        response
            .json()
            .await
            .map_err(|e| Error::store(format!("Failed to parse accounts response: {}", e)))
    }

    async fn create_account(&self, account: &Account) -> DomainResult<Account> {
        let url = format!("{}/users", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(account)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(&response)?;

        response
            .json()
            .await
            .map_err(|e| Error::store(format!("Failed to parse created account: {}", e)))
    }

    async fn update_balance(&self, id: &str, balance: Decimal) -> DomainResult<Account> {
        let url = format!("{}/users/{}", self.base_url, id);

        let response = self
            .client
            .patch(&url)
            .json(&serde_json::json!({ "balance": balance }))
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(&response)?;

        response
            .json()
            .await
            .map_err(|e| Error::store(format!("Failed to parse updated account: {}", e)))
    }

    async fn find_transactions(&self, account_id: &str) -> DomainResult<Vec<Transaction>> {
        let url = format!("{}/transactions", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("accountId", account_id),
                ("_sort", "timestamp"),
                ("_order", "desc"),
            ])
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(&response)?;

        response
            .json()
            .await
            .map_err(|e| Error::store(format!("Failed to parse transactions response: {}", e)))
    }

    async fn create_transaction(&self, tx: &NewTransaction) -> DomainResult<Transaction> {
        let url = format!("{}/transactions", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(tx)
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(&response)?;

        response
            .json()
            .await
            .map_err(|e| Error::store(format!("Failed to parse created transaction: {}", e)))
    }
}
