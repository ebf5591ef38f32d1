//! Chat-to-patient session map.
//!
//! Sessions are volatile: nothing is persisted and nothing expires. A binding lasts until the
//! chat sends `/logout` or the process exits. The map is sharded per chat id, so concurrent
//! access to different chats never contends on a single lock.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use medchat_core::PatientId;
use std::sync::Arc;

/// A chat's authenticated patient binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub patient_id: PatientId,
    pub logged_in_at: DateTime<Utc>,
}

/// Shared session map; clone freely (it's an Arc inside).
#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    inner: Arc<DashMap<i64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `chat_id` to a patient, replacing any previous binding.
    pub fn login(&self, chat_id: i64, patient_id: PatientId) {
        self.inner.insert(
            chat_id,
            Session {
                patient_id,
                logged_in_at: Utc::now(),
            },
        );
    }

    /// Removes the binding, returning it if there was one.
    pub fn logout(&self, chat_id: i64) -> Option<Session> {
        self.inner.remove(&chat_id).map(|(_, session)| session)
    }

    pub fn get(&self, chat_id: i64) -> Option<Session> {
        self.inner.get(&chat_id).map(|entry| entry.value().clone())
    }

    /// Number of chats currently logged in.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> PatientId {
        PatientId::parse(raw).unwrap()
    }

    #[test]
    fn login_replaces_previous_binding() {
        let sessions = SessionStore::new();
        sessions.login(1, id("p-1"));
        sessions.login(1, id("p-2"));

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.get(1).unwrap().patient_id, id("p-2"));
    }

    #[test]
    fn logout_removes_binding() {
        let sessions = SessionStore::new();
        sessions.login(1, id("p-1"));
        sessions.login(2, id("p-2"));

        let removed = sessions.logout(1).expect("was logged in");
        assert_eq!(removed.patient_id, id("p-1"));
        assert!(sessions.get(1).is_none());
        assert!(sessions.logout(1).is_none());
        assert!(sessions.get(2).is_some());
    }

    #[test]
    fn clones_share_state() {
        let sessions = SessionStore::new();
        let other = sessions.clone();
        other.login(9, id("p-9"));
        assert_eq!(sessions.get(9).unwrap().patient_id, id("p-9"));
    }
}
