use crate::utils::random_alphanumeric;
use chrono::{DateTime, Utc};
use futures_util::lock::Mutex;
use std::collections::HashMap;

/// Length of generated session identifiers
pub const SESSION_ID_LENGTH: usize = 40;

/// A server side session
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub id: String,
    /// The authenticated user, if any
    pub user_id: Option<u64>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait SessionStore {
    /// Create a fresh session with a new identifier.
    async fn create(&self, user_id: Option<u64>) -> Session;
    async fn get(&self, id: &str) -> Option<Session>;
    /// Drop a session. Unknown identifiers are ignored.
    async fn invalidate(&self, id: &str);
    /// Replace `old` (if any) with a new session bound to `user_id`.
    ///
    /// The old identifier is never reused.
    async fn regenerate(&self, old: Option<&str>, user_id: Option<u64>) -> Session {
        if let Some(old) = old {
            self.invalidate(old).await;
        }
        self.create(user_id).await
    }
}

/// Sessions kept in process memory
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: Option<u64>) -> Session {
        let mut sessions = self.sessions.lock().await;
        let mut id = random_alphanumeric(SESSION_ID_LENGTH);
        while sessions.contains_key(&id) {
            id = random_alphanumeric(SESSION_ID_LENGTH);
        }
        let session = Session {
            id: id.clone(),
            user_id,
            created_at: Utc::now(),
        };
        sessions.insert(id, session.clone());
        session
    }

    async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.lock().await.get(id).cloned()
    }

    async fn invalidate(&self, id: &str) {
        self.sessions.lock().await.remove(id);
    }
}

#[proc_macros::async_timeout_test(120s)]
#[tokio::test]
async fn test_memory_session_store() {
    let store = MemorySessionStore::new();
    let guest = store.create(None).await;
    assert_eq!(guest.id.len(), SESSION_ID_LENGTH);
    assert_eq!(store.get(&guest.id).await, Some(guest.clone()));
    let logged = store.regenerate(Some(&guest.id), Some(4)).await;
    assert_ne!(logged.id, guest.id);
    assert_eq!(logged.user_id, Some(4));
    assert_eq!(store.get(&guest.id).await, None);
    assert_eq!(store.len().await, 1);
    let out = store.regenerate(Some(&logged.id), None).await;
    assert_eq!(out.user_id, None);
    assert_eq!(store.get(&logged.id).await, None);
    store.invalidate("missing").await;
    let fresh = store.regenerate(None, Some(1)).await;
    assert_eq!(store.get(&fresh.id).await.map(|s| s.user_id), Some(Some(1)));
}
