//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. The ledger
//! session is the core orchestrator; the notification sink and event log
//! support it.

pub mod logging;
mod notify;
mod session;

pub use logging::{EntryPoint, EventLog, LogEntry, LogEvent};
pub use notify::NotificationSink;
pub use session::LedgerSession;
