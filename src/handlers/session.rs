use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration as CookieDuration;
use tower_cookies::{Cookie, Cookies};

use crate::{
    error::{AppError, Result},
    middleware_layer::auth::SESSION_COOKIE,
    models::session::{Session, SessionId},
    state::AppState,
    validation::credentials::decode_credentials,
};

/// The request payload for login.
#[derive(Deserialize)]
pub struct LoginRequest {
    /// Base64 of the already-verified, already-encrypted credential blob.
    pub credentials: String,
}

/// Session metadata returned to clients. The credential blob never leaves
/// the server.
#[derive(Serialize, Debug)]
pub struct SessionResponse {
    pub session_id: SessionId,
    pub expires_at: DateTime<Utc>,
    pub end_of_life: DateTime<Utc>,
}

impl SessionResponse {
    fn from_session(session: &Session) -> Result<Self> {
        Ok(Self {
            session_id: session
                .id
                .ok_or_else(|| AppError::Internal("Session has no id".to_string()))?,
            expires_at: session.expires_at,
            end_of_life: session.end_of_life,
        })
    }
}

/// Creates the session cookie.
fn session_cookie(value: String, max_age_secs: i64, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(CookieDuration::seconds(max_age_secs));
    cookie.set_path("/");
    cookie
}

fn current_id(session: &Session) -> Result<SessionId> {
    session.id.ok_or(AppError::Unauthenticated)
}

/// Handles login.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    let credentials = decode_credentials(&payload.credentials)?;

    let session = state
        .sessions
        .login(
            credentials,
            state.config.session_idle_timeout,
            state.config.session_max_lifetime,
        )
        .await?;
    let response = SessionResponse::from_session(&session)?;

    let max_age = i64::try_from(state.config.session_max_lifetime.as_secs()).unwrap_or(i64::MAX);
    cookies.add(session_cookie(
        response.session_id.to_string(),
        max_age,
        state.config.secure_cookies,
    ));

    tracing::info!("✅ Session {} created", response.session_id);

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// Handles logout.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    cookies: Cookies,
) -> Result<Response> {
    let id = current_id(&session)?;
    state.sessions.logout(id).await?;

    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_max_age(CookieDuration::seconds(0));
    cookie.set_path("/");
    cookies.remove(cookie);

    tracing::info!("👋 Session {} logged out", id);

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Handles pushing the idle-expiry clock of the current session forward.
#[axum::debug_handler]
pub async fn refresh(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<SessionResponse>> {
    let id = current_id(&session)?;
    state
        .sessions
        .refresh(id, state.config.session_extension)
        .await?;

    let refreshed = state
        .sessions
        .load(id)
        .await
        .map_err(AppError::session_gone)?;

    tracing::debug!("🔄 Session {} extended to {}", id, refreshed.expires_at);

    Ok(Json(SessionResponse::from_session(&refreshed)?))
}

/// Returns metadata of the current session.
pub async fn current(Extension(session): Extension<Session>) -> Result<Json<SessionResponse>> {
    Ok(Json(SessionResponse::from_session(&session)?))
}
