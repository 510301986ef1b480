//! OpenAPI document and Swagger UI for the HTTP surface.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ErrorBody;
use crate::handlers::auth::{self, LogoutAllResponse, SessionInfo, TokenResponse, UserResponse};
use crate::routes::health::{self, HealthResponse};
use crate::state::AppState;

/// Path the generated document is served from.
pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";
/// Mount point of the Swagger UI.
pub const SWAGGER_UI_PATH: &str = "/swagger";

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::issue,
        auth::current_user,
        auth::refresh,
        auth::revoke,
        auth::list_sessions,
        auth::logout_all,
    ),
    components(schemas(
        HealthResponse,
        TokenResponse,
        UserResponse,
        SessionInfo,
        LogoutAllResponse,
        ErrorBody,
    )),
    tags(
        (name = "health", description = "Service liveness"),
        (name = "auth", description = "Session token issuance, rotation and revocation"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Swagger UI at [`SWAGGER_UI_PATH`] backed by the document at
/// [`OPENAPI_JSON_PATH`].
pub fn router() -> Router<AppState> {
    SwaggerUi::new(SWAGGER_UI_PATH)
        .url(OPENAPI_JSON_PATH, openapi())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = openapi();
        for path in [
            "/health",
            "/auth",
            "/user",
            "/refresh",
            "/revoke",
            "/sessions",
            "/logout-all",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn document_registers_response_schemas() {
        let doc = openapi();
        let schemas = &doc.components.expect("components").schemas;
        for name in ["TokenResponse", "SessionInfo", "ErrorBody", "HealthResponse"] {
            assert!(schemas.contains_key(name), "missing schema {name}");
        }
    }
}
