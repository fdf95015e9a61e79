use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::chat::ChatState;
use crate::models::User;

/// Everything a handler knows about the caller: who they are and where they
/// are in the chat flow.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: Uuid,
    pub user: User,
    pub chat: ChatState,
}

impl SessionContext {
    pub fn new(user: User) -> Self {
        Self {
            token: Uuid::new_v4(),
            user,
            chat: ChatState::NoContactSelected,
        }
    }
}

/// Exclusive access to one session for the length of a request. Changes are
/// visible to the next request as soon as the guard drops.
pub type SessionGuard = OwnedMutexGuard<SessionContext>;

#[derive(Debug)]
struct SessionEntry {
    context: Arc<Mutex<SessionContext>>,
    last_seen: Instant,
}

impl SessionEntry {
    fn is_expired(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.duration_since(self.last_seen) >= idle_timeout
    }
}

/// In-process session table keyed by bearer token.
///
/// Requests on the same token are serialized by a per-session lock. Sessions
/// idle for longer than `idle_timeout` are dropped on the next lookup or
/// login.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            idle_timeout,
        }
    }

    pub async fn create(&self, user: User) -> SessionContext {
        let context = SessionContext::new(user);
        let now = Instant::now();

        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired(now, self.idle_timeout));
        if sessions.len() < before {
            tracing::debug!("Dropped {} idle sessions", before - sessions.len());
        }
        sessions.insert(
            context.token,
            SessionEntry {
                context: Arc::new(Mutex::new(context.clone())),
                last_seen: now,
            },
        );

        tracing::debug!("Opened session for user {}", context.user.id);
        context
    }

    /// Locks the session for `token`, waiting for any other request on it.
    pub async fn acquire(&self, token: &Uuid) -> Option<SessionGuard> {
        let handle = {
            let now = Instant::now();
            let mut sessions = self.sessions.lock().await;
            match sessions.get_mut(token) {
                Some(entry) if !entry.is_expired(now, self.idle_timeout) => {
                    entry.last_seen = now;
                    entry.context.clone()
                }
                Some(_) => {
                    sessions.remove(token);
                    tracing::debug!("Session expired after {:?} idle", self.idle_timeout);
                    return None;
                }
                None => return None,
            }
        };

        Some(handle.lock_owned().await)
    }

    pub async fn remove(&self, token: &Uuid) -> bool {
        self.sessions.lock().await.remove(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserType;
    use crate::test_support::{create_test_user, test_pool};

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[tokio::test]
    async fn test_session_roundtrip() {
        let pool = test_pool().await;
        let user = create_test_user(&pool, "s@example.com", UserType::Buyer).await;
        let store = SessionStore::new(DAY);

        let context = store.create(user).await;
        {
            let mut guard = store.acquire(&context.token).await.unwrap();
            assert!(matches!(guard.chat, ChatState::NoContactSelected));
            guard.user.language = "hi".to_string();
        }
        assert_eq!(store.acquire(&context.token).await.unwrap().user.language, "hi");

        assert!(store.remove(&context.token).await);
        assert!(store.acquire(&context.token).await.is_none());
        assert!(!store.remove(&context.token).await);
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let pool = test_pool().await;
        let user = create_test_user(&pool, "s@example.com", UserType::Buyer).await;
        let store = SessionStore::new(DAY);

        let first = store.create(user.clone()).await;
        let second = store.create(user).await;
        assert_ne!(first.token, second.token);

        // Holding one session does not block another
        let _held = store.acquire(&first.token).await.unwrap();
        store.remove(&first.token).await;
        assert!(store.acquire(&second.token).await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let pool = test_pool().await;
        let user = create_test_user(&pool, "s@example.com", UserType::Farmer).await;
        let store = SessionStore::new(DAY);
        let token = store.create(user).await.token;

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    let mut guard = store.acquire(&token).await.unwrap();
                    let seen = guard.user.name.len();
                    tokio::task::yield_now().await;
                    guard.user.name = "x".repeat(seen + 1);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.acquire(&token).await.unwrap().user.name.len(), "s".len() + 20);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let pool = test_pool().await;
        let user = create_test_user(&pool, "s@example.com", UserType::Buyer).await;
        let store = SessionStore::new(Duration::ZERO);

        let stale = store.create(user.clone()).await;
        assert!(store.acquire(&stale.token).await.is_none());

        // Logging in sweeps out whatever has gone idle
        store.create(user.clone()).await;
        store.create(user).await;
        assert_eq!(store.sessions.lock().await.len(), 1);
    }
}
