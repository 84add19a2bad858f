use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration as ChronoDuration, SubsecRound, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use session_keeper::{
    clock::ManualClock,
    config::Config,
    repositories::memory::{InMemorySessionStore, InMemoryUserStore},
    routes,
    state::AppState,
};

struct TestContext {
    app: Router,
    clock: Arc<ManualClock>,
    sessions: Arc<InMemorySessionStore>,
}

impl TestContext {
    fn new() -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://unused".to_string()),
            "SESSION_IDLE_TIMEOUT_SECS" => Some("3600".to_string()),
            "SESSION_MAX_LIFETIME_SECS" => Some("7200".to_string()),
            "SESSION_EXTENSION_SECS" => Some("1800".to_string()),
            _ => None,
        })
        .unwrap();

        let clock = Arc::new(ManualClock::new(Utc::now().trunc_subsecs(6)));
        let sessions = Arc::new(InMemorySessionStore::new(clock.clone()));
        let state = AppState::with_stores(
            config,
            sessions.clone(),
            Arc::new(InMemoryUserStore::new()),
            clock.clone(),
        );

        Self {
            app: routes::router(state),
            clock,
            sessions,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or_default().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, cookie, body)
    }

    async fn login(&self) -> String {
        let request = Request::post("/api/sessions/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "credentials": "c2VhbGVk" }).to_string()))
            .unwrap();
        let (status, cookie, body) = self.send(request).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["session_id"].is_i64());
        cookie.expect("login must set the session cookie")
    }
}

fn authed(method: &str, uri: &str, cookie: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

#[tokio::test]
async fn health_check() {
    let ctx = TestContext::new();
    let (status, _, _) = ctx
        .send(Request::get("/").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn login_current_refresh_logout() {
    let ctx = TestContext::new();
    let cookie = ctx.login().await;

    let (status, _, current) = ctx
        .send(authed("GET", "/api/sessions/current", &cookie, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(current.get("encrypted_credentials").is_none());

    ctx.clock.advance(ChronoDuration::minutes(50));
    let (status, _, refreshed) = ctx
        .send(authed("POST", "/api/sessions/refresh", &cookie, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(refreshed["expires_at"], current["expires_at"]);
    assert_eq!(refreshed["end_of_life"], current["end_of_life"]);

    let (status, _, _) = ctx
        .send(authed("POST", "/api/sessions/logout", &cookie, None))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, body) = ctx
        .send(authed("GET", "/api/sessions/current", &cookie, None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authenticated");
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let ctx = TestContext::new();

    let (status, _, _) = ctx
        .send(Request::get("/api/sessions/current").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = ctx
        .send(authed("GET", "/api/sessions/current", "session_id=999", None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_but_unswept_session_is_rejected() {
    let ctx = TestContext::new();
    let cookie = ctx.login().await;
    assert_eq!(ctx.sessions.len().await, 1);

    ctx.clock.advance(ChronoDuration::hours(1));
    let (status, _, _) = ctx
        .send(authed("GET", "/api/sessions/current", &cookie, None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Rejected without waiting for a sweep, and removed on the spot.
    assert!(ctx.sessions.is_empty().await);
}

#[tokio::test]
async fn login_rejects_bad_credentials_encoding() {
    let ctx = TestContext::new();
    let request = Request::post("/api/sessions/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "credentials": "not base64!" }).to_string()))
        .unwrap();
    let (status, cookie, _) = ctx.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(cookie.is_none());
}

#[tokio::test]
async fn user_records() {
    let ctx = TestContext::new();
    let cookie = ctx.login().await;

    let (status, _, created) = ctx
        .send(authed(
            "POST",
            "/api/users",
            &cookie,
            Some(json!({ "first": "Ada", "last": "Lovelace", "email": "ada@example.com" })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_i64().unwrap();

    let (status, _, by_id) = ctx
        .send(authed("GET", &format!("/api/users/{id}"), &cookie, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["email"], "ada@example.com");

    let (status, _, by_email) = ctx
        .send(authed("GET", "/api/users?email=ada@example.com", &cookie, None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_email["id"], id);

    for _ in 0..2 {
        let (status, _, _) = ctx
            .send(authed("DELETE", &format!("/api/users/{id}"), &cookie, None))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, _, _) = ctx
        .send(authed("GET", &format!("/api/users/{id}"), &cookie, None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_creation_is_validated() {
    let ctx = TestContext::new();
    let cookie = ctx.login().await;

    let (status, _, _) = ctx
        .send(authed(
            "POST",
            "/api/users",
            &cookie,
            Some(json!({ "first": "", "last": "X", "email": "not-an-email" })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
