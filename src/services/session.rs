use std::sync::Arc;
use std::time::Duration;

use crate::{
    clock::Clock,
    error::StoreResult,
    models::session::{Session, SessionId},
    repositories::session::SessionStore,
};

/// Login, logout and refresh on top of a [`SessionStore`].
///
/// Holds no state beyond its injected dependencies; every call goes straight
/// to the store.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The store this service delegates to.
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Creates a session for credentials that were verified elsewhere.
    ///
    /// # Arguments
    ///
    /// * `encrypted_credentials` - Opaque credential blob.
    /// * `idle_timeout` - Initial distance to `expires_at`.
    /// * `max_lifetime` - Distance to the fixed `end_of_life`.
    pub async fn login(
        &self,
        encrypted_credentials: Vec<u8>,
        idle_timeout: Duration,
        max_lifetime: Duration,
    ) -> StoreResult<Session> {
        let mut session = Session::new(
            encrypted_credentials,
            self.clock.now(),
            idle_timeout,
            max_lifetime,
        );
        self.store.save(&mut session).await?;
        Ok(session)
    }

    pub async fn logout(&self, id: SessionId) -> StoreResult<()> {
        self.store.terminate(id).await
    }

    pub async fn refresh(&self, id: SessionId, extension: Duration) -> StoreResult<()> {
        self.store.extend(id, extension).await
    }

    pub async fn load(&self, id: SessionId) -> StoreResult<Session> {
        self.store.load(id).await
    }

    /// The time used when building sessions.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}
