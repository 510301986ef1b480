//! Bearer access-token extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use passage_core::error::CoreError;
use passage_core::token::AccessClaims;

use crate::error::AppError;
use crate::state::AppState;

/// Verified claims of the access token in the `Authorization` header.
///
/// Verification is stateless. Handlers that need the session row itself
/// still go through [`passage_core::SessionService::get_session`].
///
/// ```ignore
/// async fn my_handler(AuthSession(claims): AuthSession) -> AppResult<Json<()>> {
///     tracing::info!(session_id = %claims.session_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthSession(pub AccessClaims);

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Core(CoreError::Unauthenticated))?;

        let claims = state.sessions.parse_access_token(token)?;
        Ok(AuthSession(claims))
    }
}
