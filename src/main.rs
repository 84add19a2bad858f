use anyhow::Context;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session_keeper::{
    config::Config,
    db,
    routes,
    services::reaper::Reaper,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let pool = db::create_pool(&config.database_url, config.db_pool_max_size)
        .context("Error creating database pool")?;
    let state = AppState::new(&config, pool)
        .await
        .context("Error connecting to database")?;
    tracing::info!("✅ AppState initialized");

    let shutdown = CancellationToken::new();
    let reaper = Reaper::new(state.sessions.store().clone(), config.sweep_interval)
        .spawn(shutdown.clone());

    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("🛑 Shutdown signal received");
                }
                _ = server_shutdown.cancelled() => {}
            }
        })
        .await?;

    shutdown.cancel();
    reaper.await.context("Session reaper panicked")?;
    tracing::info!("✅ Shutdown complete");

    Ok(())
}
