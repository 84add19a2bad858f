use async_trait::async_trait;
use deadpool_postgres::Pool;
use std::time::Duration;
use tokio_postgres::Row;

use crate::{
    error::{StoreError, StoreResult},
    models::session::{Session, SessionId, clamp_lifespan},
};

/// Storage contract for sessions.
///
/// Implementations must be safe to call concurrently from any number of tasks
/// without external locking. Only `save` mutates its argument.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Inserts `session` and writes the store-assigned id back into it. An id
    /// already present is overwritten.
    async fn save(&self, session: &mut Session) -> StoreResult<()>;

    /// Loads a session by id. `NotFound` if no record matches.
    async fn load(&self, id: SessionId) -> StoreResult<Session>;

    /// Removes a session. Removing an unknown id is not an error.
    async fn terminate(&self, id: SessionId) -> StoreResult<()>;

    /// Sets `expires_at` to the store's `now + lifespan`, with `lifespan`
    /// clamped to `MAX_LIFESPAN`. A no-op for an unknown id. `end_of_life`
    /// is never touched.
    async fn extend(&self, id: SessionId, lifespan: Duration) -> StoreResult<()>;

    /// Removes every session past either clock and returns how many went.
    async fn sweep_expired(&self) -> StoreResult<u64>;
}

const INSERT_SESSION: &str = r#"
    INSERT INTO sessions (encrypted_credentials, expires_at, end_of_life)
    VALUES ($1, $2, $3)
    RETURNING id
"#;

const SELECT_SESSION: &str = r#"
    SELECT id, encrypted_credentials, expires_at, end_of_life
    FROM sessions
    WHERE id = $1
"#;

const DELETE_SESSION: &str = "DELETE FROM sessions WHERE id = $1";

const EXTEND_SESSION: &str = r#"
    UPDATE sessions
    SET expires_at = NOW() + make_interval(secs => $1)
    WHERE id = $2
"#;

const SWEEP_SESSIONS: &str = r#"
    DELETE FROM sessions
    WHERE expires_at <= NOW() OR end_of_life <= NOW()
"#;

/// A helper function to map a `tokio_postgres::Row` to a `Session`.
fn row_to_session(row: &Row) -> StoreResult<Session> {
    Ok(Session {
        id: Some(SessionId(row.try_get("id")?)),
        encrypted_credentials: row.try_get("encrypted_credentials")?,
        expires_at: row.try_get("expires_at")?,
        end_of_life: row.try_get("end_of_life")?,
    })
}

/// `SessionStore` backed by PostgreSQL.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: Pool,
}

impl PgSessionStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn save(&self, session: &mut Session) -> StoreResult<()> {
        let client = self.pool.get().await?;
        let stmt = client.prepare_cached(INSERT_SESSION).await?;
        let row = client
            .query_one(
                &stmt,
                &[
                    &session.encrypted_credentials,
                    &session.expires_at,
                    &session.end_of_life,
                ],
            )
            .await?;
        let id = SessionId(row.try_get("id")?);
        session.id = Some(id);
        tracing::debug!("🔑 Session saved: {}", id);
        Ok(())
    }

    async fn load(&self, id: SessionId) -> StoreResult<Session> {
        let client = self.pool.get().await?;
        let stmt = client.prepare_cached(SELECT_SESSION).await?;
        let row = client
            .query_opt(&stmt, &[&id.0])
            .await?
            .ok_or(StoreError::NotFound)?;
        row_to_session(&row)
    }

    async fn terminate(&self, id: SessionId) -> StoreResult<()> {
        let client = self.pool.get().await?;
        let stmt = client.prepare_cached(DELETE_SESSION).await?;
        let removed = client.execute(&stmt, &[&id.0]).await?;
        tracing::debug!("Session {} terminated ({} row(s))", id, removed);
        Ok(())
    }

    async fn extend(&self, id: SessionId, lifespan: Duration) -> StoreResult<()> {
        let client = self.pool.get().await?;
        let stmt = client.prepare_cached(EXTEND_SESSION).await?;
        let secs = clamp_lifespan(lifespan).as_secs_f64();
        let updated = client.execute(&stmt, &[&secs, &id.0]).await?;
        if updated == 0 {
            tracing::debug!("Extend of unknown session {} ignored", id);
        }
        Ok(())
    }

    async fn sweep_expired(&self) -> StoreResult<u64> {
        let client = self.pool.get().await?;
        let stmt = client.prepare_cached(SWEEP_SESSIONS).await?;
        Ok(client.execute(&stmt, &[]).await?)
    }
}
