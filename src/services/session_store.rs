use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::session::Session;

pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> (Uuid, SessionHandle) {
        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(Session::new(id)));
        self.sessions.write().await.insert(id, handle.clone());
        tracing::info!("Created session {id}");
        (id, handle)
    }

    pub async fn get(&self, id: &Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Looks up `id`, creating a fresh session when it is missing or unknown.
    /// The bool is true when a session was created.
    pub async fn resolve(&self, id: Option<Uuid>) -> (Uuid, SessionHandle, bool) {
        if let Some(id) = id {
            if let Some(handle) = self.get(&id).await {
                return (id, handle, false);
            }
        }
        let (id, handle) = self.create().await;
        (id, handle, true)
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    /// Drops sessions idle for longer than `max_idle`. Sessions locked by an
    /// in-flight request are in use and kept.
    pub async fn purge_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.idle_for() <= max_idle,
            Err(_) => true,
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Periodically purges idle sessions until the process exits.
pub fn spawn_sweeper(store: Arc<SessionStore>, max_idle: Duration, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every.max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            let purged = store.purge_idle(max_idle).await;
            if purged > 0 {
                tracing::info!("Purged {purged} idle session(s)");
            }
        }
    });
}
