//! In-memory session store shared by every delivery surface.
//!
//! Sessions live only as long as the process. The lock is held for the
//! duration of a single read or transition, never across an API call.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::error::{Result, WizardError};
use crate::session::Session;
use crate::types::OutputKey;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, Session>>,
}

/// Parse a session id from a path segment or socket payload.
///
/// A malformed id cannot name a stored session, so it reports not-found.
pub fn parse_session_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| WizardError::SessionNotFound(raw.to_string()))
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Session>> {
        // A panic mid-transition cannot leave a session half-written: every
        // transition validates before it mutates.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn create(&self, description: impl Into<String>) -> Session {
        let session = Session::new(description);
        self.lock().insert(session.id, session.clone());
        tracing::debug!(session = %session.id, "session created");
        session
    }

    pub fn get(&self, id: Uuid) -> Option<Session> {
        self.lock().get(&id).cloned()
    }

    pub fn require(&self, id: Uuid) -> Result<Session> {
        self.get(id)
            .ok_or_else(|| WizardError::SessionNotFound(id.to_string()))
    }

    /// All sessions, oldest first.
    pub fn list(&self) -> Vec<Session> {
        let mut all: Vec<Session> = self.lock().values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    /// Apply `f` to the stored session. `updated_at` moves only when `f`
    /// succeeds.
    pub fn update<T>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> Result<T>) -> Result<T> {
        let mut sessions = self.lock();
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| WizardError::SessionNotFound(id.to_string()))?;
        let out = f(session)?;
        session.touch();
        Ok(out)
    }

    /// Store or clear (`None`) one output.
    pub fn save_output(&self, id: Uuid, key: OutputKey, value: Option<String>) -> Result<Session> {
        self.update(id, |s| {
            match value {
                Some(text) => {
                    s.outputs.insert(key, text);
                }
                None => {
                    s.outputs.remove(&key);
                }
            }
            Ok(s.clone())
        })
    }

    pub fn delete(&self, id: Uuid) -> bool {
        let removed = self.lock().remove(&id).is_some();
        if removed {
            tracing::debug!(session = %id, "session deleted");
        }
        removed
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_get() {
        let store = SessionStore::new();
        let s = store.create("A blog");
        let got = store.get(s.id).unwrap();
        assert_eq!(got.description, "A blog");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_unknown_is_none() {
        let store = SessionStore::new();
        assert!(store.get(Uuid::new_v4()).is_none());
        assert!(matches!(
            store.require(Uuid::new_v4()),
            Err(WizardError::SessionNotFound(_))
        ));
    }

    #[test]
    fn outputs_are_isolated_between_sessions() {
        let store = SessionStore::new();
        let a = store.create("a");
        let b = store.create("b");
        store
            .save_output(a.id, OutputKey::Requirements, Some("A reqs".into()))
            .unwrap();
        assert_eq!(
            store.get(a.id).unwrap().output(OutputKey::Requirements),
            Some("A reqs")
        );
        assert!(store.get(b.id).unwrap().outputs.is_empty());
    }

    #[test]
    fn save_none_clears_output() {
        let store = SessionStore::new();
        let s = store.create("x");
        store
            .save_output(s.id, OutputKey::RequirementsReview, Some("gaps".into()))
            .unwrap();
        let after = store
            .save_output(s.id, OutputKey::RequirementsReview, None)
            .unwrap();
        assert!(after.output(OutputKey::RequirementsReview).is_none());
    }

    #[test]
    fn update_missing_session_fails() {
        let store = SessionStore::new();
        let err = store.update(Uuid::new_v4(), |_| Ok(())).unwrap_err();
        assert!(err.to_string().starts_with("Session not found"));
    }

    #[test]
    fn failed_update_keeps_timestamp() {
        let store = SessionStore::new();
        let s = store.create("x");
        let _ = store.update(s.id, |s| s.accept(0));
        assert_eq!(store.get(s.id).unwrap().updated_at, s.updated_at);
    }

    #[test]
    fn list_is_oldest_first() {
        let store = SessionStore::new();
        let first = store.create("1");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = store.create("2");
        let ids: Vec<Uuid> = store.list().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn delete_and_clear() {
        let store = SessionStore::new();
        let a = store.create("a");
        store.create("b");
        assert!(store.delete(a.id));
        assert!(!store.delete(a.id));
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn parse_session_id_rejects_garbage() {
        assert!(matches!(
            parse_session_id("not-a-uuid"),
            Err(WizardError::SessionNotFound(_))
        ));
        let id = Uuid::new_v4();
        assert_eq!(parse_session_id(&id.to_string()).unwrap(), id);
    }
}
