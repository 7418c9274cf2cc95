//! Result and error types for the core library

use thiserror::Error;

/// Core library error type
///
/// Local validation variants never reach the remote store. `NoSession` is a
/// caller fault and is propagated rather than notified; everything the user
/// should see goes through the notification sink at the session boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient balance.")]
    InsufficientBalance,

    #[error("No account is signed in")]
    NoSession,

    #[error("Account ID already exists: {0}")]
    Conflict(String),

    #[error("Invalid Account ID or Password")]
    InvalidCredentials,

    /// More than one account matched an id + credential pair. A store
    /// integrity fault, shown to the user as a failed login.
    #[error("Ambiguous credentials: {0} accounts matched")]
    AmbiguousCredentials(usize),

    #[error("Ledger store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Whether the session already raised a notification for this error.
    ///
    /// Callers use this to avoid double-reporting: the insufficient-balance
    /// and validation cases carry their own specific message, and remote
    /// failures a generic one. `NoSession` is never notified.
    pub fn already_notified(&self) -> bool {
        !matches!(self, Error::NoSession | Error::Io(_) | Error::Json(_))
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::InsufficientBalance.to_string(),
            "Insufficient balance."
        );
        assert_eq!(
            Error::InvalidCredentials.to_string(),
            "Invalid Account ID or Password"
        );
        assert!(Error::validation("bad input")
            .to_string()
            .contains("Validation error"));
    }

    #[test]
    fn test_no_session_is_not_notified() {
        assert!(!Error::NoSession.already_notified());
        assert!(Error::InsufficientBalance.already_notified());
        assert!(Error::store("boom").already_notified());
    }
}
