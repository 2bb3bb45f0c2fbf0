//! Persisted conversation sessions.
//!
//! The whole history lives under one storage key. It is read once when the
//! store opens and rewritten in full on every save; saves are serialized by a
//! process-wide lock so overlapping saves cannot lose each other's updates.

use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::CHAT_HISTORY_KEY;
use crate::core::message::Turn;
use crate::core::storage::{KeyValueStore, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    #[serde(rename = "messages")]
    pub turns: Vec<Turn>,
    #[serde(rename = "lastMessageTime")]
    pub last_turn_time: i64,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            turns: Vec::new(),
            last_turn_time: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// First line of the first user turn, for history listings.
    pub fn title(&self) -> Option<&str> {
        self.turns
            .iter()
            .find(|turn| turn.is_user())
            .and_then(|turn| turn.content.lines().find(|line| !line.trim().is_empty()))
            .map(str::trim)
    }

    /// First non-blank line of the most recent turn.
    pub fn last_turn_preview(&self) -> Option<&str> {
        self.turns
            .last()
            .and_then(|turn| turn.content.lines().find(|line| !line.trim().is_empty()))
            .map(str::trim)
    }
}

#[derive(Debug)]
pub enum SessionError {
    NotFound(String),
    Store(StoreError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotFound(id) => write!(f, "Session '{id}' not found"),
            SessionError::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SessionError::NotFound(_) => None,
            SessionError::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        SessionError::Store(err)
    }
}

/// Time-derived session id, `session-<unix millis>`.
pub fn session_id_at(millis: i64) -> String {
    format!("session-{millis}")
}

/// The first id at or after `now_millis` that `is_taken` rejects.
pub fn next_session_id(now_millis: i64, is_taken: impl Fn(&str) -> bool) -> String {
    let mut millis = now_millis;
    loop {
        let candidate = session_id_at(millis);
        if !is_taken(&candidate) {
            return candidate;
        }
        millis += 1;
    }
}

pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    sessions: Mutex<Vec<Session>>,
}

impl SessionStore {
    /// Opens the store, reading the persisted history once. A corrupted
    /// history is an error rather than an empty list.
    pub fn open(backend: Arc<dyn KeyValueStore>) -> Result<Self, StoreError> {
        let sessions = match backend.get(CHAT_HISTORY_KEY)? {
            Some(raw) if !raw.trim().is_empty() => {
                serde_json::from_str::<Vec<Session>>(&raw).map_err(|source| {
                    StoreError::Deserialize {
                        key: CHAT_HISTORY_KEY.to_string(),
                        source,
                    }
                })?
            }
            _ => Vec::new(),
        };
        debug!(count = sessions.len(), "loaded session history");
        Ok(Self {
            backend,
            sessions: Mutex::new(sessions),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn load(&self, id: &str) -> Result<Session, SessionError> {
        self.lock()
            .iter()
            .find(|session| session.id == id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// Upserts by id and rewrites the whole persisted collection. The
    /// in-memory copy only changes once the write succeeded.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let mut guard = self.lock();
        let mut updated = guard.clone();
        match updated.iter_mut().find(|existing| existing.id == session.id) {
            Some(existing) => *existing = session.clone(),
            None => updated.push(session.clone()),
        }

        let encoded = serde_json::to_string(&updated).map_err(StoreError::Serialize)?;
        self.backend.set(CHAT_HISTORY_KEY, &encoded)?;
        *guard = updated;
        debug!(id = %session.id, turns = session.turns.len(), "saved session");
        Ok(())
    }

    /// Every session, most recent `last_turn_time` first.
    pub fn list_all(&self) -> Vec<Session> {
        let mut sessions = self.lock().clone();
        sessions.sort_by(|a, b| b.last_turn_time.cmp(&a.last_turn_time));
        sessions
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().iter().any(|session| session.id == id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::{FileKeyValueStore, MemoryKeyValueStore};
    use tempfile::TempDir;

    fn session(id: &str, time: i64, turns: Vec<Turn>) -> Session {
        Session {
            id: id.to_string(),
            turns,
            last_turn_time: time,
        }
    }

    fn memory_store() -> (Arc<MemoryKeyValueStore>, SessionStore) {
        let backend = Arc::new(MemoryKeyValueStore::new());
        let store = SessionStore::open(backend.clone()).expect("open");
        (backend, store)
    }

    #[test]
    fn save_then_load_preserves_turn_order() {
        let (_, store) = memory_store();
        let turns = vec![
            Turn::user("first").with_timestamp(1),
            Turn::assistant("second", 1).with_timestamp(2),
            Turn::user("third").with_timestamp(3),
        ];
        let original = session("session-1", 10, turns);

        store.save(&original).expect("save");
        let loaded = store.load("session-1").expect("load");
        assert_eq!(loaded, original);
    }

    #[test]
    fn missing_session_is_not_found() {
        let (_, store) = memory_store();
        assert!(matches!(
            store.load("session-404"),
            Err(SessionError::NotFound(id)) if id == "session-404"
        ));
    }

    #[test]
    fn list_all_orders_by_last_turn_time_descending() {
        let (_, store) = memory_store();
        store
            .save(&session("A", 100, vec![Turn::user("a")]))
            .expect("save A");
        store
            .save(&session("B", 200, vec![Turn::user("b")]))
            .expect("save B");

        let ids: Vec<_> = store.list_all().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn save_replaces_existing_entry_in_place() {
        let (backend, store) = memory_store();
        store.save(&session("A", 1, vec![Turn::user("a")])).expect("save");
        store.save(&session("B", 2, vec![Turn::user("b")])).expect("save");
        store
            .save(&session("A", 3, vec![Turn::user("a"), Turn::assistant("r", 0)]))
            .expect("resave");

        assert_eq!(store.len(), 2);
        let raw = backend.get(CHAT_HISTORY_KEY).expect("get").expect("value");
        let persisted: Vec<Session> = serde_json::from_str(&raw).expect("decode");
        assert_eq!(persisted[0].id, "A");
        assert_eq!(persisted[0].turns.len(), 2);
        assert_eq!(persisted[1].id, "B");
    }

    #[test]
    fn history_survives_reopen_from_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let backend = Arc::new(FileKeyValueStore::new(temp_dir.path()));
        let store = SessionStore::open(backend.clone()).expect("open");
        store
            .save(&session("session-5", 5, vec![Turn::user("persist me")]))
            .expect("save");
        drop(store);

        let reopened = SessionStore::open(backend).expect("reopen");
        let loaded = reopened.load("session-5").expect("load");
        assert_eq!(loaded.turns[0].content, "persist me");
    }

    #[test]
    fn reads_camel_case_history_layout() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        backend
            .set(
                CHAT_HISTORY_KEY,
                r#"[{"id":"session-1700000000000","messages":[{"role":"user","content":"hi"},{"role":"assistant","content":"meow","apiKeyIndex":2}],"lastMessageTime":1700000000500}]"#,
            )
            .expect("seed");

        let store = SessionStore::open(backend).expect("open");
        let loaded = store.load("session-1700000000000").expect("load");
        assert_eq!(loaded.last_turn_time, 1_700_000_000_500);
        assert_eq!(loaded.turns[1].credential_index, Some(2));
        assert_eq!(loaded.title(), Some("hi"));
    }

    #[test]
    fn corrupted_history_is_reported() {
        let backend = Arc::new(MemoryKeyValueStore::new());
        backend.set(CHAT_HISTORY_KEY, "{not json").expect("seed");
        assert!(matches!(
            SessionStore::open(backend),
            Err(StoreError::Deserialize { .. })
        ));
    }

    #[test]
    fn next_session_id_bumps_past_taken_ids() {
        assert_eq!(next_session_id(42, |id| id == "session-41"), "session-42");
        assert_eq!(
            next_session_id(42, |id| id == "session-42" || id == "session-43"),
            "session-44"
        );
    }

    #[test]
    fn contains_reports_archived_ids() {
        let (_, store) = memory_store();
        store
            .save(&session("session-100", 100, vec![Turn::user("a")]))
            .expect("save");
        assert!(store.contains("session-100"));
        assert!(!store.contains("session-101"));
    }
}
