//! Ledger session - current-account and transaction-history orchestration
//!
//! Owns the single "current user" slot for the process. All state reads are
//! cheap snapshots; balance-changing operations are serialized so the
//! optimistic pre-check always sees the last store-confirmed balance.
//!
//! Every user-visible outcome goes through the notification sink here, at
//! the session boundary. Callers can check `Error::already_notified` to
//! avoid reporting the same failure twice.

use std::sync::{Arc, Mutex as StdMutex, RwLock};

use rust_decimal::Decimal;
use tokio::sync::Mutex as AsyncMutex;

use crate::domain::result::{Error, Result};
use crate::domain::{
    sort_newest_first, Account, NewTransaction, Severity, Transaction, TransactionKind,
};
use crate::ports::{AccountFilter, LedgerStore, SessionStore};
use crate::services::NotificationSink;

const MSG_MISSING_CREDENTIALS: &str = "Please enter both Account ID and Password.";
const MSG_INVALID_CREDENTIALS: &str = "Invalid Account ID or Password";
const MSG_LOGIN_FAILED: &str = "An error occurred during login. Please try again later.";
const MSG_MISSING_REGISTRATION_FIELDS: &str =
    "Please fill in all fields: Name, Account ID, and Password.";
const MSG_ACCOUNT_EXISTS: &str = "Account ID already exists. Please choose another.";
const MSG_REGISTRATION_FAILED: &str =
    "An error occurred during registration. Please try again later.";
const MSG_REGISTERED: &str = "Registration successful! Welcome.";
const MSG_INSUFFICIENT_BALANCE: &str = "Insufficient balance.";
const MSG_HISTORY_FAILED: &str = "Could not load transaction history. Please try again.";
const MSG_RECONCILE_FAILED: &str = "Reconciliation failed. Please try again.";

fn success_message(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Deposit => "Deposit successful!",
        TransactionKind::Withdrawal => "Withdrawal successful!",
    }
}

fn failure_message(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Deposit => "Deposit failed. Please try again.",
        TransactionKind::Withdrawal => "Withdrawal failed. Please try again.",
    }
}

fn amount_message(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Deposit => "Deposit amount must be greater than zero.",
        TransactionKind::Withdrawal => "Withdrawal amount must be greater than zero.",
    }
}

#[derive(Debug, Default)]
struct SessionState {
    account: Option<Account>,
    /// Newest first
    history: Vec<Transaction>,
}

/// The core orchestrator for one signed-in account.
///
/// Lifecycle: `restore` once at process start, `logout` as teardown.
pub struct LedgerSession {
    store: Arc<dyn LedgerStore>,
    sessions: Arc<dyn SessionStore>,
    sink: Arc<NotificationSink>,
    state: RwLock<SessionState>,
    /// Admits one in-flight balance-changing operation at a time
    mutation_lock: AsyncMutex<()>,
    /// A transaction whose balance update committed but whose ledger record
    /// was never written; retried by `reconcile`
    pending_append: StdMutex<Option<NewTransaction>>,
}

impl LedgerSession {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        sessions: Arc<dyn SessionStore>,
        sink: Arc<NotificationSink>,
    ) -> Self {
        Self {
            store,
            sessions,
            sink,
            state: RwLock::new(SessionState::default()),
            mutation_lock: AsyncMutex::new(()),
            pending_append: StdMutex::new(None),
        }
    }

    // ------------------------------------------------------------------
    // State snapshots
    // ------------------------------------------------------------------

    /// The current account, if signed in
    pub fn account(&self) -> Option<Account> {
        self.read_state().account.clone()
    }

    /// Whether an account is signed in
    pub fn authenticated(&self) -> bool {
        self.read_state().account.is_some()
    }

    /// The current balance, if signed in
    pub fn balance(&self) -> Option<Decimal> {
        self.read_state().account.as_ref().map(|a| a.balance)
    }

    /// The transaction history, newest first
    pub fn history(&self) -> Vec<Transaction> {
        self.read_state().history.clone()
    }

    /// Whether a balance update committed without its ledger record
    pub fn needs_reconciliation(&self) -> bool {
        self.lock_pending().is_some()
    }

    /// The un-appended transaction awaiting reconciliation, if any
    pub fn pending_transaction(&self) -> Option<NewTransaction> {
        self.lock_pending().clone()
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Sign in with an account id and password.
    ///
    /// Exactly one store match adopts the account and persists it to the
    /// session slot. Zero matches and ambiguous matches share the same
    /// user-facing message but stay distinct error variants - more than one
    /// match means the store's uniqueness policy is broken.
    pub async fn authenticate(&self, account_id: &str, password: &str) -> Result<Account> {
        if account_id.trim().is_empty() || password.is_empty() {
            self.sink.notify(MSG_MISSING_CREDENTIALS, Severity::Error);
            return Err(Error::validation("missing account id or password"));
        }

        let filter = AccountFilter::by_credentials(account_id, password);
        let mut matches = match self.store.find_accounts(&filter).await {
            Ok(matches) => matches,
            Err(e) => {
                self.sink.notify(MSG_LOGIN_FAILED, Severity::Error);
                return Err(e);
            }
        };

        match matches.len() {
            1 => {
                let account = matches.remove(0);
                self.adopt(account.clone());
                self.refresh_history_tolerant().await;
                Ok(account)
            }
            0 => {
                self.sink.notify(MSG_INVALID_CREDENTIALS, Severity::Error);
                Err(Error::InvalidCredentials)
            }
            n => {
                self.sink.notify(MSG_INVALID_CREDENTIALS, Severity::Error);
                Err(Error::AmbiguousCredentials(n))
            }
        }
    }

    /// Create an account and sign it in.
    ///
    /// The id is checked for existence first; a taken id rejects without any
    /// mutation. New accounts start at a zero balance.
    pub async fn register(&self, name: &str, account_id: &str, password: &str) -> Result<Account> {
        if name.trim().is_empty() || account_id.trim().is_empty() || password.is_empty() {
            self.sink
                .notify(MSG_MISSING_REGISTRATION_FIELDS, Severity::Error);
            return Err(Error::validation("missing name, account id or password"));
        }

        let existing = match self.store.find_accounts(&AccountFilter::by_id(account_id)).await {
            Ok(existing) => existing,
            Err(e) => {
                self.sink.notify(MSG_REGISTRATION_FAILED, Severity::Error);
                return Err(e);
            }
        };
        if !existing.is_empty() {
            self.sink.notify(MSG_ACCOUNT_EXISTS, Severity::Error);
            return Err(Error::Conflict(account_id.to_string()));
        }

        let account = Account::new(account_id, name, password);
        let created = match self.store.create_account(&account).await {
            Ok(created) => created,
            Err(e) => {
                self.sink.notify(MSG_REGISTRATION_FAILED, Severity::Error);
                return Err(e);
            }
        };

        self.adopt(created.clone());
        self.refresh_history_tolerant().await;
        self.sink.notify(MSG_REGISTERED, Severity::Success);
        Ok(created)
    }

    /// Adopt the session slot written by a previous invocation, if present.
    ///
    /// The record is trusted without re-validating credentials: the slot only
    /// ever holds an account that authenticated through this same
    /// installation. Returns whether a session was restored.
    pub async fn restore(&self) -> Result<bool> {
        match self.sessions.get()? {
            Some(account) => {
                self.write_state().account = Some(account);
                self.refresh_history_tolerant().await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sign out, clearing the in-memory state and the session slot.
    /// Idempotent.
    pub fn logout(&self) -> Result<()> {
        {
            let mut state = self.write_state();
            state.account = None;
            state.history.clear();
        }
        self.sessions.clear()
    }

    // ------------------------------------------------------------------
    // Balance mutation
    // ------------------------------------------------------------------

    /// Add funds to the current account
    pub async fn deposit(&self, amount: Decimal) -> Result<Account> {
        let _mutation = self.mutation_lock.lock().await;

        let account = self.validate_mutation(TransactionKind::Deposit, amount)?;
        let new_balance = account.balance + amount;
        self.commit(account, TransactionKind::Deposit, amount, new_balance)
            .await
    }

    /// Remove funds from the current account, subject to sufficient balance.
    ///
    /// The balance pre-check reads the last store-confirmed balance; because
    /// the mutation lock is held across the whole operation, a second
    /// withdrawal issued during the first's round-trip waits and then checks
    /// against the committed result.
    pub async fn withdraw(&self, amount: Decimal) -> Result<Account> {
        let _mutation = self.mutation_lock.lock().await;

        let account = self.validate_mutation(TransactionKind::Withdrawal, amount)?;
        if !account.can_withdraw(amount) {
            self.sink.notify(MSG_INSUFFICIENT_BALANCE, Severity::Error);
            return Err(Error::InsufficientBalance);
        }
        let new_balance = account.balance - amount;
        self.commit(account, TransactionKind::Withdrawal, amount, new_balance)
            .await
    }

    /// Local validation, before any remote call
    fn validate_mutation(&self, kind: TransactionKind, amount: Decimal) -> Result<Account> {
        let account = self.account().ok_or(Error::NoSession)?;
        if amount <= Decimal::ZERO {
            self.sink.notify(amount_message(kind), Severity::Error);
            return Err(Error::validation(amount_message(kind)));
        }
        Ok(account)
    }

    /// Two-phase commit: the balance update must be confirmed before the
    /// transaction record is created.
    async fn commit(
        &self,
        account: Account,
        kind: TransactionKind,
        amount: Decimal,
        new_balance: Decimal,
    ) -> Result<Account> {
        let updated = match self.store.update_balance(&account.id, new_balance).await {
            Ok(updated) => updated,
            Err(e) => {
                self.sink.notify(failure_message(kind), Severity::Error);
                return Err(e);
            }
        };

        // The store's returned representation is adopted as-is; it is the
        // last confirmed balance and stays authoritative even if the record
        // append below fails.
        self.adopt(updated.clone());

        let record = NewTransaction::new(&account.id, kind, amount);
        match self.store.create_transaction(&record).await {
            Ok(tx) => {
                self.write_state().history.insert(0, tx);
                self.sink.notify(success_message(kind), Severity::Success);
                Ok(updated)
            }
            Err(e) => {
                // Balance committed without its ledger record. Keep the
                // record so the divergence stays detectable and retryable.
                *self.lock_pending() = Some(record);
                self.sink.notify(failure_message(kind), Severity::Error);
                Err(e)
            }
        }
    }

    /// Retry a transaction append that failed after its balance committed,
    /// then refresh the history wholesale. Returns whether anything needed
    /// reconciling.
    pub async fn reconcile(&self) -> Result<bool> {
        let _mutation = self.mutation_lock.lock().await;

        let Some(record) = self.lock_pending().clone() else {
            return Ok(false);
        };

        if let Err(e) = self.store.create_transaction(&record).await {
            self.sink.notify(MSG_RECONCILE_FAILED, Severity::Error);
            return Err(e);
        }
        *self.lock_pending() = None;

        self.refresh_history().await?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    /// Replace the history wholesale from the store.
    ///
    /// The per-operation prepend is a fast path; this is the source of truth
    /// whenever staleness is suspected.
    pub async fn refresh_history(&self) -> Result<()> {
        let account_id = self
            .read_state()
            .account
            .as_ref()
            .map(|a| a.id.clone())
            .ok_or(Error::NoSession)?;

        match self.store.find_transactions(&account_id).await {
            Ok(mut transactions) => {
                // The store is asked for newest-first, but ordering is
                // enforced here rather than trusted
                sort_newest_first(&mut transactions);
                self.write_state().history = transactions;
                Ok(())
            }
            Err(e) => {
                self.sink.notify(MSG_HISTORY_FAILED, Severity::Error);
                Err(e)
            }
        }
    }

    /// Refresh used after authentication, registration and restore. A
    /// failure leaves the previous history in place and must not fail the
    /// operation that triggered it, so nothing is surfaced.
    async fn refresh_history_tolerant(&self) {
        let Some(account_id) = self.read_state().account.as_ref().map(|a| a.id.clone()) else {
            return;
        };
        if let Ok(mut transactions) = self.store.find_transactions(&account_id).await {
            sort_newest_first(&mut transactions);
            self.write_state().history = transactions;
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Make `account` current and persist it to the session slot.
    ///
    /// The slot write is best-effort: the store has already confirmed the
    /// account, so failing the operation here would misreport a committed
    /// mutation. A stale slot is re-validated implicitly on the next
    /// operation against the store.
    fn adopt(&self, account: Account) {
        let _ = self.sessions.set(&account);
        self.write_state().account = Some(account);
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<NewTransaction>> {
        self.pending_append.lock().unwrap_or_else(|e| e.into_inner())
    }
}
