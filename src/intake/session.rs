//! Session-scoped key-value store
//!
//! Replaces the ad hoc `sessionStorage`/cookie reads scattered across the old
//! form variants: one owned store, passed explicitly into the handlers that
//! need it, with every key an enumerated constant.

use std::collections::HashMap;

/// Every piece of session-scoped state the intake flow reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Correlation id returned by the submission endpoint
    SubmissionId,
    /// Name prefill for the post-submit scheduling widget
    SchedulerName,
    /// Email prefill for the post-submit scheduling widget
    SchedulerEmail,
    /// Session identifier read from the analytics cookie
    SessionId,
    /// Long-lived visitor identifier
    VisitorId,
    /// First page of the visit, for attribution
    EntryPage,
    /// Idempotency flag: the submission conversion event was already tracked
    SubmissionTracked,
}

impl SessionKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKey::SubmissionId => "submission_id",
            SessionKey::SchedulerName => "scheduler_name",
            SessionKey::SchedulerEmail => "scheduler_email",
            SessionKey::SessionId => "session_id",
            SessionKey::VisitorId => "visitor_id",
            SessionKey::EntryPage => "entry_page",
            SessionKey::SubmissionTracked => "submission_tracked",
        }
    }
}

/// In-memory session store owned by one form instance. No cross-tab or
/// cross-component coordination is attempted.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    values: HashMap<SessionKey, String>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: SessionKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn set(&mut self, key: SessionKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    pub fn remove(&mut self, key: SessionKey) -> Option<String> {
        self.values.remove(&key)
    }

    /// Set a flag exactly once. Returns true the first time, false after,
    /// which is how "already tracked" events stay idempotent.
    pub fn set_once(&mut self, key: SessionKey) -> bool {
        if self.values.contains_key(&key) {
            return false;
        }
        self.values.insert(key, "1".to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut store = SessionStore::new();
        store.set(SessionKey::SubmissionId, "sub-42");
        assert_eq!(store.get(SessionKey::SubmissionId), Some("sub-42"));
        assert_eq!(store.get(SessionKey::VisitorId), None);
    }

    #[test]
    fn test_set_once_is_idempotent() {
        let mut store = SessionStore::new();
        assert!(store.set_once(SessionKey::SubmissionTracked));
        assert!(!store.set_once(SessionKey::SubmissionTracked));
        assert!(!store.set_once(SessionKey::SubmissionTracked));
    }
}
