use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use secrecy::SecretString;
use tracing::{instrument, warn};

use super::invalid_payload;
use super::types::{CredentialsRequest, ErrorBody, SessionResponse};
use crate::identity::{AuthError, IdentityProviderHandle};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful, session issued", body = SessionResponse),
        (status = 400, description = "Missing or malformed payload", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
        (status = 423, description = "Account locked", body = ErrorBody),
        (status = 503, description = "Identity provider disabled", body = ErrorBody),
        (status = 504, description = "Identity backend timed out", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip(provider, payload))]
pub async fn login(
    provider: Extension<IdentityProviderHandle>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_payload(&rejection),
    };

    let password = SecretString::from(request.password);
    match provider.authenticate(&request.email, &password).await {
        Ok(token) => (
            StatusCode::OK,
            Json(SessionResponse {
                session_token: token.into_inner(),
            }),
        )
            .into_response(),
        Err(err) => {
            if err == AuthError::AccountLocked {
                warn!("login refused for locked account");
            }
            err.into_response()
        }
    }
}
