use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    models::session::SessionId,
    state::AppState,
};

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// Extracts the session id from the request cookies.
///
/// # Arguments
///
/// * `cookies` - The request cookies.
///
/// # Returns
///
/// An `Option` containing the session ID if found.
fn extract_session_id(cookies: &Cookies) -> Option<SessionId> {
    cookies
        .get(SESSION_COOKIE)
        .and_then(|cookie| cookie.value().parse::<i64>().ok())
        .map(SessionId)
}

/// A middleware that requires a live session to be present.
///
/// The loaded `Session` is inserted into the request extensions. A session
/// that is already past one of its clocks but has not been swept yet is
/// rejected and removed on the spot.
pub async fn require_session(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    tracing::debug!("🔐 Checking session...");

    let session_id = extract_session_id(&cookies).ok_or_else(|| {
        tracing::warn!("❌ No session_id cookie found");
        AppError::Unauthenticated
    })?;

    let session = state
        .sessions
        .load(session_id)
        .await
        .map_err(AppError::session_gone)?;

    if session.is_reclaimable(state.sessions.now()) {
        tracing::warn!("❌ Session {} is past its expiry", session_id);
        if let Err(e) = state.sessions.logout(session_id).await {
            tracing::warn!("Failed to remove expired session {}: {}", session_id, e);
        }
        return Err(AppError::Unauthenticated);
    }

    tracing::debug!("✅ Session {} accepted", session_id);

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
