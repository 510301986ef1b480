//! Handlers for token issuance, refresh, revocation and session listing.

use std::net::IpAddr;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use passage_core::error::CoreError;
use passage_core::types::{SessionId, UserId};
use passage_core::{Session, TokenPair};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{AppError, AppResult, ErrorBody};
use crate::middleware::auth::AuthSession;
use crate::middleware::client::ClientMeta;
use crate::response::DataResponse;
use crate::state::AppState;

/// Cookie carrying the signed access token.
pub const ACCESS_COOKIE: &str = "access_token";
/// Cookie carrying the encoded refresh secret.
pub const REFRESH_COOKIE: &str = "refresh_token";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query string for `GET /auth`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IssueParams {
    /// UUID of the user the session is issued for.
    pub guid: Option<String>,
}

/// Token pair returned by issuance and refresh, mirrored in cookies.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = Uuid)]
    pub user_id: UserId,
}

/// Public view of a session. The refresh hash never leaves the server.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionInfo {
    #[schema(value_type = String, format = Uuid)]
    pub id: SessionId,
    pub user_agent: String,
    #[schema(value_type = String, example = "203.0.113.10")]
    pub ip: IpAddr,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Whether this is the session the request was authenticated with.
    pub current: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LogoutAllResponse {
    pub revoked: u64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /auth?guid=<uuid>
///
/// Issue a fresh token pair for the given user and set both cookies.
#[utoipa::path(
    get,
    path = "/auth",
    params(IssueParams),
    responses(
        (status = 200, description = "New token pair, also set as cookies", body = TokenResponse),
        (status = 400, description = "Missing or malformed guid", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn issue(
    State(state): State<AppState>,
    Query(params): Query<IssueParams>,
    client: ClientMeta,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let guid = params
        .guid
        .ok_or_else(|| AppError::BadRequest("Empty guid query param".into()))?;
    let user_id = Uuid::parse_str(guid.trim())
        .map_err(|e| AppError::BadRequest(format!("Invalid guid: {e}")))?;

    let pair = state
        .sessions
        .issue_tokens(user_id, &client.user_agent, client.ip)
        .await?;

    Ok(token_response(&state, jar, pair))
}

/// GET /user
///
/// Resolve the user bound to the presented access token's session.
#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "User bound to the session", body = UserResponse),
        (status = 401, description = "Invalid, expired or revoked access token", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn current_user(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> AppResult<Json<UserResponse>> {
    let session = state.sessions.get_session(&claims).await?;
    Ok(Json(UserResponse {
        user_id: session.user_id,
    }))
}

/// POST /revoke
///
/// Revoke the session of the presented access token and clear the cookies.
#[utoipa::path(
    post,
    path = "/revoke",
    responses(
        (status = 204, description = "Session revoked"),
        (
            status = 401,
            description = "Invalid access token or session already revoked",
            body = ErrorBody
        ),
    ),
    tag = "auth"
)]
pub async fn revoke(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    jar: CookieJar,
) -> AppResult<(CookieJar, StatusCode)> {
    state.sessions.revoke(claims.session_id).await?;

    let jar = jar
        .remove(removal_cookie(ACCESS_COOKIE))
        .remove(removal_cookie(REFRESH_COOKIE));
    Ok((jar, StatusCode::NO_CONTENT))
}

/// POST /refresh
///
/// Exchange the `access_token` and `refresh_token` cookies for a rotated pair.
#[utoipa::path(
    post,
    path = "/refresh",
    responses(
        (
            status = 200,
            description = "Rotated token pair, also set as cookies",
            body = TokenResponse
        ),
        (status = 400, description = "Malformed refresh token", body = ErrorBody),
        (status = 401, description = "Refresh rejected", body = ErrorBody),
        (status = 500, description = "Anomaly notification failed", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientMeta,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let access_token = cookie_value(&jar, ACCESS_COOKIE)?;
    let refresh_token = cookie_value(&jar, REFRESH_COOKIE)?;

    let claims = state.sessions.parse_access_token(&access_token)?;
    let pair = state
        .sessions
        .refresh(&claims, &refresh_token, &client.user_agent, client.ip)
        .await?;

    Ok(token_response(&state, jar, pair))
}

/// GET /sessions
///
/// List the caller's live sessions, newest first.
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (
            status = 200,
            description = "Live sessions of the caller's user",
            body = DataResponse<Vec<SessionInfo>>
        ),
        (status = 401, description = "Invalid access token", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> AppResult<Json<DataResponse<Vec<SessionInfo>>>> {
    let sessions = state.sessions.list_user_sessions(&claims).await?;
    let data = sessions
        .into_iter()
        .map(|s| session_info(s, claims.session_id))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /logout-all
///
/// Revoke every live session of the caller's user, including the current one.
#[utoipa::path(
    post,
    path = "/logout-all",
    responses(
        (
            status = 200,
            description = "Number of sessions revoked",
            body = DataResponse<LogoutAllResponse>
        ),
        (status = 401, description = "Invalid access token", body = ErrorBody),
    ),
    tag = "auth"
)]
pub async fn logout_all(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<DataResponse<LogoutAllResponse>>)> {
    let revoked = state.sessions.revoke_all_for_user(&claims).await?;

    let jar = jar
        .remove(removal_cookie(ACCESS_COOKIE))
        .remove(removal_cookie(REFRESH_COOKIE));
    Ok((
        jar,
        Json(DataResponse {
            data: LogoutAllResponse { revoked },
        }),
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn token_response(
    state: &AppState,
    jar: CookieJar,
    pair: TokenPair,
) -> (CookieJar, Json<TokenResponse>) {
    let tokens = state.sessions.token_config();
    let max_age = time::Duration::seconds(tokens.refresh_token_ttl.num_seconds());
    let secure = state.config.cookie_secure;

    let jar = jar
        .add(token_cookie(ACCESS_COOKIE, pair.access_token.clone(), max_age, secure))
        .add(token_cookie(REFRESH_COOKIE, pair.refresh_token.clone(), max_age, secure));

    let body = TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        expires_in: tokens.access_token_ttl.num_seconds(),
    };
    (jar, Json(body))
}

fn token_cookie(
    name: &'static str,
    value: String,
    max_age: time::Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(max_age)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

fn cookie_value(jar: &CookieJar, name: &str) -> AppResult<String> {
    jar.get(name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            tracing::debug!(cookie = name, "Missing token cookie");
            AppError::Core(CoreError::Unauthenticated)
        })
}

fn session_info(session: Session, current: SessionId) -> SessionInfo {
    SessionInfo {
        id: session.id,
        user_agent: session.user_agent,
        ip: session.ip,
        created_at: session.created_at,
        expires_at: session.expires_at,
        current: session.id == current,
    }
}
