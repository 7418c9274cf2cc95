//! Notification sink - single-slot user-facing messages
//!
//! Holds at most one pending notification. A new `notify` silently replaces
//! an unacknowledged one; there is no queue. The presentation layer reads
//! the slot with `current` and acknowledges it with `dismiss`.

use std::sync::Mutex;

use crate::domain::{Notification, Severity};

#[derive(Debug, Default)]
struct SinkState {
    visible: bool,
    message: String,
    severity: Option<Severity>,
}

/// Single-slot sink for transient user-facing messages
#[derive(Debug, Default)]
pub struct NotificationSink {
    state: Mutex<SinkState>,
}

impl NotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pending notification, replacing any unacknowledged one
    pub fn notify(&self, message: impl Into<String>, severity: Severity) {
        let mut state = self.lock();
        state.message = message.into();
        state.severity = Some(severity);
        state.visible = true;
    }

    /// Hide and clear the pending notification
    pub fn dismiss(&self) {
        let mut state = self.lock();
        state.visible = false;
        state.message.clear();
    }

    /// The visible notification, if one is pending
    pub fn current(&self) -> Option<Notification> {
        let state = self.lock();
        if !state.visible {
            return None;
        }
        state
            .severity
            .map(|severity| Notification::new(state.message.clone(), severity))
    }

    /// Whether a notification is pending
    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SinkState> {
        // A poisoned slot still holds valid data
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let sink = NotificationSink::new();
        assert!(!sink.is_visible());
        assert!(sink.current().is_none());
    }

    #[test]
    fn test_notify_sets_slot() {
        let sink = NotificationSink::new();
        sink.notify("Deposit successful!", Severity::Success);

        let notification = sink.current().unwrap();
        assert_eq!(notification.message, "Deposit successful!");
        assert_eq!(notification.severity, Severity::Success);
    }

    #[test]
    fn test_new_notify_replaces_unacknowledged() {
        let sink = NotificationSink::new();
        sink.notify("first", Severity::Info);
        sink.notify("second", Severity::Error);

        let notification = sink.current().unwrap();
        assert_eq!(notification.message, "second");
        assert_eq!(notification.severity, Severity::Error);
    }

    #[test]
    fn test_dismiss_clears_message() {
        let sink = NotificationSink::new();
        sink.notify("hello", Severity::Info);
        sink.dismiss();

        assert!(!sink.is_visible());
        assert!(sink.current().is_none());

        // Dismissing an empty slot is harmless
        sink.dismiss();
        assert!(!sink.is_visible());
    }
}
