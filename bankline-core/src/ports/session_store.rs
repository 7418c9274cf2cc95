//! Session store port - durable single-slot current-user storage

use crate::domain::result::Result;
use crate::domain::Account;

/// Durable single-slot storage for the last-authenticated account.
///
/// Scoped to the current process lineage; restoring from it is an explicit
/// trust boundary (records are only ever written after authentication).
pub trait SessionStore: Send + Sync {
    /// Read the stored account, if any
    fn get(&self) -> Result<Option<Account>>;

    /// Replace the stored account
    fn set(&self, account: &Account) -> Result<()>;

    /// Remove the stored account; clearing an empty slot is a no-op
    fn clear(&self) -> Result<()>;
}
