use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, PoolError, RecyclingMethod, Runtime, Timeouts,
};
use tokio_postgres::NoTls;
use crate::error::{StoreError, StoreResult};
use std::time::Duration;

/// Tables used by the PostgreSQL stores. Every statement is idempotent so the
/// schema can be applied on each startup.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id                    BIGSERIAL PRIMARY KEY,
    encrypted_credentials BYTEA       NOT NULL,
    expires_at            TIMESTAMPTZ NOT NULL,
    end_of_life           TIMESTAMPTZ NOT NULL
);
CREATE INDEX IF NOT EXISTS sessions_expires_at_idx ON sessions (expires_at);
CREATE INDEX IF NOT EXISTS sessions_end_of_life_idx ON sessions (end_of_life);

CREATE TABLE IF NOT EXISTS users (
    id    BIGSERIAL PRIMARY KEY,
    first TEXT NOT NULL,
    last  TEXT NOT NULL,
    email TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS users_email_idx ON users (email);
"#;

/// Upper bound on establishing a connection.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Server-side upper bound on any single statement.
pub const STATEMENT_TIMEOUT: Duration = Duration::from_secs(30);
/// Idle time before TCP keepalives start.
pub const KEEPALIVES_IDLE: Duration = Duration::from_secs(60);

// The PostgreSQL adapters translate every backend failure through these two
// impls. Nothing above a store sees a driver error.
impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}

impl From<PoolError> for StoreError {
    fn from(e: PoolError) -> Self {
        StoreError::StorageUnavailable(e.to_string())
    }
}

/// Creates a new database connection pool.
///
/// # Arguments
///
/// * `database_url` - The URL of the PostgreSQL database.
/// * `max_size` - The maximum number of pooled connections.
///
/// # Returns
///
/// A `StoreResult` containing the `Pool`.
pub fn create_pool(database_url: &str, max_size: usize) -> StoreResult<Pool> {
    pool_config(database_url, max_size)?
        .create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| StoreError::StorageUnavailable(e.to_string()))
}

/// Builds the deadpool `Config` for `database_url`.
///
/// Pool timeouts only bound checking out a connection. Statements running on a
/// checked-out connection are bounded by `STATEMENT_TIMEOUT`, and dead peers
/// are detected through TCP keepalives.
pub fn pool_config(database_url: &str, max_size: usize) -> StoreResult<Config> {
    let mut cfg = Config::new();
    let pg_config: tokio_postgres::Config = database_url.parse()?;

    if let Some(tokio_postgres::config::Host::Tcp(hostname)) = pg_config.get_hosts().first() {
        cfg.host = Some(hostname.to_string());
    }

    if let Some(port) = pg_config.get_ports().first() {
        cfg.port = Some(*port);
    }

    if let Some(dbname) = pg_config.get_dbname() {
        cfg.dbname = Some(dbname.to_string());
    }

    if let Some(user) = pg_config.get_user() {
        cfg.user = Some(user.to_string());
    }

    if let Some(password) = pg_config.get_password() {
        cfg.password = Some(String::from_utf8_lossy(password).to_string());
    }

    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    cfg.connect_timeout = Some(CONNECT_TIMEOUT);
    cfg.keepalives = Some(true);
    cfg.keepalives_idle = Some(KEEPALIVES_IDLE);
    cfg.options = Some(format!(
        "-c statement_timeout={}",
        STATEMENT_TIMEOUT.as_millis()
    ));

    let mut pool_cfg = PoolConfig::new(max_size);
    pool_cfg.timeouts = Timeouts {
        wait: Some(Duration::from_secs(5)),
        create: Some(Duration::from_secs(2)),
        recycle: Some(Duration::from_secs(1)),
    };
    cfg.pool = Some(pool_cfg);

    Ok(cfg)
}

/// Applies `SCHEMA` to the database behind `pool`.
pub async fn ensure_schema(pool: &Pool) -> StoreResult<()> {
    let client = pool.get().await?;
    client.batch_execute(SCHEMA).await?;
    tracing::info!("✅ Database schema ensured");
    Ok(())
}
