use utoipa::OpenApi;

use super::handlers::{health, login, session, signup};

/// `OpenAPI` document for every route the gateway can serve.
///
/// Info (title, version, license) is filled from Cargo metadata by the derive.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::ok,
        health::health,
        signup::signup,
        login::login,
        session::session,
        session::logout,
    ),
    tags(
        (name = "health", description = "Liveness and build information"),
        (name = "auth", description = "Signup, login and sessions")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
