//! File-backed session store
//!
//! Persists the current account as a single JSON document, the terminal
//! counterpart of browser session storage. Writes go through a temp file in
//! the same directory and are moved into place, so the slot is never
//! half-written.

use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::domain::result::Result;
use crate::domain::Account;
use crate::ports::SessionStore;

/// Single-slot session persistence in a JSON file
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Result<Option<Account>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        // A slot that no longer parses is treated as signed out
        Ok(serde_json::from_str(&content).ok())
    }

    fn set(&self, account: &Account) -> Result<()> {
        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let tmp = NamedTempFile::new_in(parent)?;
        std::fs::write(tmp.path(), serde_json::to_string_pretty(account)?)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> FileSessionStore {
        FileSessionStore::new(dir.join("session.json"))
    }

    #[test]
    fn test_empty_slot_reads_none() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn test_set_then_get_round_trips() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        let mut account = Account::new("acct-1", "Alice", "pw");
        account.balance = Decimal::new(5000, 2);
        store.set(&account).unwrap();

        let restored = store.get().unwrap().unwrap();
        assert_eq!(restored, account);
    }

    #[test]
    fn test_set_replaces_previous_slot() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        store.set(&Account::new("acct-1", "Alice", "pw")).unwrap();
        store.set(&Account::new("acct-2", "Bob", "pw2")).unwrap();

        let restored = store.get().unwrap().unwrap();
        assert_eq!(restored.id, "acct-2");
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());

        store.set(&Account::new("acct-1", "Alice", "pw")).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_slot_reads_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json {").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(store.get().unwrap().is_none());
    }
}
