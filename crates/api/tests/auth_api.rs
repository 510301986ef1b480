//! Integration tests for the token lifecycle endpoints.

mod common;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use common::{
    body_json, cookie_value, get, get_with_bearer, issue, post_refresh, post_with_bearer, request,
    send, set_cookie, TEST_AGENT,
};
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// GET /auth
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn issue_returns_tokens_in_body_and_cookies(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = Uuid::new_v4();

    let response = get(app, &format!("/auth?guid={user_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let access_cookie = set_cookie(&response, "access_token").expect("access cookie set");
    assert!(access_cookie.contains("HttpOnly"));
    assert!(access_cookie.contains("SameSite=Strict"));
    assert!(access_cookie.contains("Path=/"));
    assert!(access_cookie.contains("Max-Age=172800"));
    let access = cookie_value(&response, "access_token").unwrap();
    let refresh = cookie_value(&response, "refresh_token").unwrap();

    let json = body_json(response).await;
    assert_eq!(json["access_token"], access.as_str());
    assert_eq!(json["refresh_token"], refresh.as_str());
    assert_eq!(json["expires_in"], 900);
    assert_eq!(access.split('.').count(), 3);
    assert_eq!(refresh.len(), 43);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn issue_requires_a_valid_guid(pool: PgPool) {
    let app = common::build_test_app(pool);

    let missing = get(app.clone(), "/auth").await;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(missing).await["code"], "BAD_REQUEST");

    let invalid = get(app, "/auth?guid=not-a-uuid").await;
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// GET /user
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn user_returns_the_bound_user_id(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = Uuid::new_v4();
    let (access, _) = issue(app.clone(), user_id).await;

    let response = get_with_bearer(app, "/user", &access).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user_id"], user_id.to_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn user_without_credentials_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let missing = get(app.clone(), "/user").await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = get_with_bearer(app, "/user", "not.a.jwt").await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(garbage).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "Invalid or expired credentials");
}

// ---------------------------------------------------------------------------
// POST /refresh
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_rotates_the_pair(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = Uuid::new_v4();
    let (access, refresh) = issue(app.clone(), user_id).await;

    let response = post_refresh(app.clone(), &access, &refresh, TEST_AGENT).await;
    assert_eq!(response.status(), StatusCode::OK);
    let new_access = cookie_value(&response, "access_token").unwrap();
    let new_refresh = cookie_value(&response, "refresh_token").unwrap();
    assert_ne!(new_refresh, refresh);

    // The old session is gone, the new one resolves to the same user.
    let old = get_with_bearer(app.clone(), "/user", &access).await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);
    let new = get_with_bearer(app.clone(), "/user", &new_access).await;
    assert_eq!(body_json(new).await["user_id"], user_id.to_string());

    // The old secret cannot be replayed.
    let replay = post_refresh(app, &access, &refresh, TEST_AGENT).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_from_another_user_agent_kills_the_session(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (access, refresh) = issue(app.clone(), Uuid::new_v4()).await;

    let response = post_refresh(app.clone(), &access, &refresh, "other-agent/2.0").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let user = get_with_bearer(app.clone(), "/user", &access).await;
    assert_eq!(user.status(), StatusCode::UNAUTHORIZED);

    // Even the original agent cannot rotate a revoked session.
    let retry = post_refresh(app, &access, &refresh, TEST_AGENT).await;
    assert_eq!(retry.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_rejects_mixed_pairs(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = Uuid::new_v4();
    let (access_a, _) = issue(app.clone(), user_id).await;
    let (_, refresh_b) = issue(app.clone(), user_id).await;

    let response = post_refresh(app, &access_a, &refresh_b, TEST_AGENT).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_with_malformed_secret_is_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (access, _) = issue(app.clone(), Uuid::new_v4()).await;

    let response = post_refresh(app, &access, "***", TEST_AGENT).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn refresh_without_cookies_is_unauthorized(pool: PgPool) {
    let app = common::build_test_app(pool);

    let req = request(Method::POST, "/refresh").body(Body::empty()).unwrap();
    let response = send(app, req).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// POST /revoke
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn revoke_is_one_shot(pool: PgPool) {
    let app = common::build_test_app(pool);
    let (access, refresh) = issue(app.clone(), Uuid::new_v4()).await;

    let first = post_with_bearer(app.clone(), "/revoke", &access).await;
    assert_eq!(first.status(), StatusCode::NO_CONTENT);

    let second = post_with_bearer(app.clone(), "/revoke", &access).await;
    assert_eq!(second.status(), StatusCode::UNAUTHORIZED);

    let refresh = post_refresh(app, &access, &refresh, TEST_AGENT).await;
    assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// GET /sessions, POST /logout-all
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn sessions_lists_the_users_live_sessions(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = Uuid::new_v4();
    issue(app.clone(), user_id).await;
    let (second, _) = issue(app.clone(), user_id).await;
    issue(app.clone(), Uuid::new_v4()).await;

    let response = get_with_bearer(app, "/sessions", &second).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let sessions = json["data"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.iter().all(|s| s["user_agent"] == TEST_AGENT));
    assert!(sessions.iter().all(|s| s.get("refresh_hash").is_none()));
    assert_eq!(sessions.iter().filter(|s| s["current"] == true).count(), 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn logout_all_revokes_every_session(pool: PgPool) {
    let app = common::build_test_app(pool);
    let user_id = Uuid::new_v4();
    let (first, _) = issue(app.clone(), user_id).await;
    let (second, _) = issue(app.clone(), user_id).await;

    let response = post_with_bearer(app.clone(), "/logout-all", &second).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["revoked"], 2);

    for token in [&first, &second] {
        let user = get_with_bearer(app.clone(), "/user", token).await;
        assert_eq!(user.status(), StatusCode::UNAUTHORIZED);
    }
}
