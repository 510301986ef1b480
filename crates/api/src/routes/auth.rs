use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Token lifecycle routes, mounted at the root.
///
/// ```text
/// GET  /auth?guid=<uuid>      issue a token pair (public)
/// POST /refresh               rotate the pair held in cookies (public)
/// GET  /user                  user bound to the bearer token
/// POST /revoke                revoke the bearer token's session
/// GET  /sessions              live sessions of the caller's user
/// POST /logout-all            revoke every session of the caller's user
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth", get(auth::issue))
        .route("/refresh", post(auth::refresh))
        .route("/user", get(auth::current_user))
        .route("/revoke", post(auth::revoke))
        .route("/sessions", get(auth::list_sessions))
        .route("/logout-all", post(auth::logout_all))
}
