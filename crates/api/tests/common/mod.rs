use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE, USER_AGENT};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use passage_core::SessionService;
use passage_events::LogNotifier;
use sqlx::PgPool;
use tower::ServiceExt;

use passage_api::config::ServerConfig;
use passage_api::router::build_app_router;
use passage_api::state::AppState;

pub const TEST_AGENT: &str = "passage-tests/1.0";
pub const TEST_IP: &str = "203.0.113.10";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// plain-HTTP cookies and Argon2 parameters cheap enough for tests.
pub fn test_config() -> ServerConfig {
    let env: HashMap<&str, &str> = HashMap::from([
        ("SIGNING_KEY", "api-test-signing-key"),
        ("HOST", "127.0.0.1"),
        ("PORT", "0"),
        ("COOKIE_SECURE", "false"),
        ("REFRESH_HASH_MEMORY_KIB", "1024"),
        ("REFRESH_HASH_ITERATIONS", "1"),
    ]);
    ServerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()))
        .expect("test configuration should be valid")
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let sessions = SessionService::new(
        Arc::new(passage_db::PgSessionStore::new(pool.clone())),
        Arc::new(LogNotifier),
        config.tokens.clone(),
        config.hash.hasher().expect("test hash parameters should be valid"),
    );

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sessions: Arc::new(sessions),
    };

    build_app_router(state, &config)
}

/// Request builder preloaded with the default test client identity.
pub fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(USER_AGENT, TEST_AGENT)
        .header("x-forwarded-for", TEST_IP)
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri).body(Body::empty()).unwrap()).await
}

pub async fn get_with_bearer(app: Router, uri: &str, token: &str) -> Response<Body> {
    let req = request(Method::GET, uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn post_with_bearer(app: Router, uri: &str, token: &str) -> Response<Body> {
    let req = request(Method::POST, uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

/// POST /refresh carrying both token cookies.
pub async fn post_refresh(
    app: Router,
    access_token: &str,
    refresh_token: &str,
    user_agent: &str,
) -> Response<Body> {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/refresh")
        .header(USER_AGENT, user_agent)
        .header("x-forwarded-for", TEST_IP)
        .header(
            COOKIE,
            format!("access_token={access_token}; refresh_token={refresh_token}"),
        )
        .body(Body::empty())
        .unwrap();
    send(app, req).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Full `Set-Cookie` header for `name`, if the response sets it.
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&prefix))
        .map(str::to_string)
}

/// Value part of the `Set-Cookie` header for `name`.
pub fn cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookie(response, name).map(|header| {
        header
            .split(';')
            .next()
            .unwrap_or_default()
            .trim_start_matches(&format!("{name}="))
            .to_string()
    })
}

/// Issue a token pair for `user_id` and return `(access_token, refresh_token)`.
pub async fn issue(app: Router, user_id: uuid::Uuid) -> (String, String) {
    let response = get(app, &format!("/auth?guid={user_id}")).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let json = body_json(response).await;
    (
        json["access_token"].as_str().unwrap().to_string(),
        json["refresh_token"].as_str().unwrap().to_string(),
    )
}
