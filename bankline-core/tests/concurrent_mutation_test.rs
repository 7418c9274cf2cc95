//! Concurrent balance-mutation tests
//!
//! The ledger session admits one in-flight balance mutation at a time. These
//! tests push overlapping operations through a deliberately slow store so the
//! overlap is real, and check that the optimistic pre-check always reads the
//! last committed balance rather than a stale one.
//!
//! Run with: cargo test --test concurrent_mutation_test -- --nocapture

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tempfile::TempDir;

use bankline_core::adapters::demo::DemoLedgerStore;
use bankline_core::adapters::session_file::FileSessionStore;
use bankline_core::domain::result::{Error, Result};
use bankline_core::ports::{AccountFilter, LedgerStore};
use bankline_core::{Account, LedgerSession, NewTransaction, NotificationSink, Transaction};

/// How many concurrent operations the stress tests issue
const TASK_COUNT: usize = 8;

/// Per-call delay that keeps several operations in flight at once
const STORE_DELAY: Duration = Duration::from_millis(10);

/// Store wrapper that sleeps before every call, widening the window in which
/// a second operation can arrive
struct SlowStore {
    inner: DemoLedgerStore,
}

impl SlowStore {
    fn new() -> Self {
        Self {
            inner: DemoLedgerStore::new(),
        }
    }
}

#[async_trait]
impl LedgerStore for SlowStore {
    async fn find_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        tokio::time::sleep(STORE_DELAY).await;
        self.inner.find_accounts(filter).await
    }

    async fn create_account(&self, account: &Account) -> Result<Account> {
        tokio::time::sleep(STORE_DELAY).await;
        self.inner.create_account(account).await
    }

    async fn update_balance(&self, id: &str, balance: Decimal) -> Result<Account> {
        tokio::time::sleep(STORE_DELAY).await;
        self.inner.update_balance(id, balance).await
    }

    async fn find_transactions(&self, account_id: &str) -> Result<Vec<Transaction>> {
        tokio::time::sleep(STORE_DELAY).await;
        self.inner.find_transactions(account_id).await
    }

    async fn create_transaction(&self, tx: &NewTransaction) -> Result<Transaction> {
        tokio::time::sleep(STORE_DELAY).await;
        self.inner.create_transaction(tx).await
    }
}

fn dollars(units: i64) -> Decimal {
    Decimal::new(units, 0)
}

/// Register a fresh account over the slow store and hand the session out as
/// an Arc so tasks can share it
async fn signed_in_session(dir: &TempDir) -> Arc<LedgerSession> {
    let sink = Arc::new(NotificationSink::new());
    let sessions = Arc::new(FileSessionStore::new(dir.path().join("session.json")));
    let session = Arc::new(LedgerSession::new(Arc::new(SlowStore::new()), sessions, sink));
    session.register("Alice", "acct-1", "pw").await.unwrap();
    session
}

/// Every deposit lands: the final balance and the history both account for
/// all of them, with no lost update between overlapping commits
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deposits_all_recorded() {
    let dir = TempDir::new().unwrap();
    let session = signed_in_session(&dir).await;

    let handles: Vec<_> = (0..TASK_COUNT)
        .map(|_| {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.deposit(dollars(10)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(session.balance(), Some(dollars(10 * TASK_COUNT as i64)));

    session.refresh_history().await.unwrap();
    let history = session.history();
    assert_eq!(history.len(), TASK_COUNT);
    let signed_sum: Decimal = history.iter().map(|t| t.signed_amount()).sum();
    assert_eq!(signed_sum, session.balance().unwrap());
}

/// A double-submitted withdrawal cannot overdraw: the second attempt waits
/// for the first commit and then re-checks against the committed balance
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_double_submission_cannot_overdraw() {
    let dir = TempDir::new().unwrap();
    let session = signed_in_session(&dir).await;
    session.deposit(dollars(50)).await.unwrap();

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.withdraw(dollars(40)).await })
    };
    let second = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.withdraw(dollars(40)).await })
    };
    let outcomes = [first.await.unwrap(), second.await.unwrap()];

    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one withdrawal should win");
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(Error::InsufficientBalance))));
    assert_eq!(session.balance(), Some(dollars(10)));
}

/// A mixed burst of deposits and withdrawals settles to a balance that
/// matches exactly the operations that succeeded, and snapshot reads taken
/// during the burst never observe a negative balance
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_mutations_stay_consistent() {
    let dir = TempDir::new().unwrap();
    let session = signed_in_session(&dir).await;
    session.deposit(dollars(100)).await.unwrap();

    let reader = {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            for _ in 0..50 {
                assert!(session.balance().unwrap() >= Decimal::ZERO);
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
    };

    let amounts: [i64; 8] = [20, -30, 20, -30, -30, 20, -30, 20];
    let handles: Vec<_> = amounts
        .iter()
        .map(|&amount| {
            let session = Arc::clone(&session);
            tokio::spawn(async move {
                if amount > 0 {
                    session.deposit(dollars(amount)).await.map(|_| amount)
                } else {
                    session.withdraw(dollars(-amount)).await.map(|_| amount)
                }
            })
        })
        .collect();

    let mut settled: i64 = 100;
    let mut successes = 0;
    for handle in handles {
        if let Ok(amount) = handle.await.unwrap() {
            settled += amount;
            successes += 1;
        }
    }
    reader.await.unwrap();

    assert!(settled >= 0);
    assert_eq!(session.balance(), Some(dollars(settled)));

    session.refresh_history().await.unwrap();
    assert_eq!(session.history().len(), 1 + successes);
}
