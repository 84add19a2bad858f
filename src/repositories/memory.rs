//! In-process stores with the same contracts as the PostgreSQL ones.
//!
//! Time comes from an injected [`Clock`], so expiry behavior can be driven
//! deterministically from tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::{
    clock::Clock,
    error::{StoreError, StoreResult},
    models::{
        session::{Session, SessionId, deadline},
        user::{User, UserId},
    },
    repositories::{session::SessionStore, user::UserStore},
};

/// `SessionStore` kept in a map.
pub struct InMemorySessionStore {
    rows: Mutex<BTreeMap<SessionId, Session>>,
    next_id: AtomicI64,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            clock,
        }
    }

    /// Number of sessions currently stored.
    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: &mut Session) -> StoreResult<()> {
        let mut rows = self.rows.lock().await;
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        session.id = Some(id);
        rows.insert(id, session.clone());
        Ok(())
    }

    async fn load(&self, id: SessionId) -> StoreResult<Session> {
        self.rows
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn terminate(&self, id: SessionId) -> StoreResult<()> {
        self.rows.lock().await.remove(&id);
        Ok(())
    }

    async fn extend(&self, id: SessionId, lifespan: Duration) -> StoreResult<()> {
        let mut rows = self.rows.lock().await;
        if let Some(session) = rows.get_mut(&id) {
            session.expires_at = deadline(self.clock.now(), lifespan);
        }
        Ok(())
    }

    async fn sweep_expired(&self) -> StoreResult<u64> {
        let now = self.clock.now();
        let mut rows = self.rows.lock().await;
        let before = rows.len();
        rows.retain(|_, session| !session.is_reclaimable(now));
        Ok((before - rows.len()) as u64)
    }
}

/// `UserStore` kept in a map.
pub struct InMemoryUserStore {
    rows: Mutex<BTreeMap<UserId, User>>,
    next_id: AtomicI64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: &mut User) -> StoreResult<()> {
        let mut rows = self.rows.lock().await;
        let id = UserId(self.next_id.fetch_add(1, Ordering::Relaxed));
        user.id = Some(id);
        rows.insert(id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<User> {
        self.rows
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<User> {
        self.rows
            .lock()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: UserId) -> StoreResult<()> {
        self.rows.lock().await.remove(&id);
        Ok(())
    }
}
