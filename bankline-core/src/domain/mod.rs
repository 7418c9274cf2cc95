//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod notification;
mod transaction;
pub mod result;

pub use account::Account;
pub use notification::{Notification, Severity};
pub use transaction::{sort_newest_first, NewTransaction, Transaction, TransactionKind};
