use deadpool_postgres::Pool;
use std::sync::Arc;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::StoreResult;
use crate::repositories::{
    session::{PgSessionStore, SessionStore},
    user::{PgUserStore, UserStore},
};
use crate::services::session::SessionService;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// Session lifecycle operations.
    pub sessions: SessionService,
    /// User records.
    pub users: Arc<dyn UserStore>,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Wires the state from already-built stores.
    pub fn with_stores(
        config: Config,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        AppState {
            sessions: SessionService::new(sessions, clock),
            users,
            config,
        }
    }

    /// Creates a new `AppState` backed by PostgreSQL.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    /// * `pool` - The database connection pool, shared by both stores.
    ///
    /// # Returns
    ///
    /// A `StoreResult` containing the `AppState`.
    pub async fn new(config: &Config, pool: Pool) -> StoreResult<Self> {
        crate::db::ensure_schema(&pool).await?;

        let sessions: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(pool.clone()));
        let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool));
        tracing::info!("✅ PostgreSQL stores initialized");

        Ok(Self::with_stores(
            config.clone(),
            sessions,
            users,
            Arc::new(SystemClock),
        ))
    }
}
