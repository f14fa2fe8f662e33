use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use secrecy::SecretString;
use tracing::{info, instrument};

use super::invalid_payload;
use super::types::{CredentialsRequest, ErrorBody, SessionResponse};
use crate::identity::IdentityProviderHandle;

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "Account created, session issued", body = SessionResponse),
        (status = 400, description = "Invalid email or password format", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 503, description = "Identity provider disabled", body = ErrorBody),
        (status = 504, description = "Identity backend timed out", body = ErrorBody)
    ),
    tag = "auth"
)]
#[instrument(skip(provider, payload))]
pub async fn signup(
    provider: Extension<IdentityProviderHandle>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return invalid_payload(&rejection),
    };

    let password = SecretString::from(request.password);
    match provider
        .register_credentials(&request.email, &password)
        .await
    {
        Ok(token) => {
            info!("signup succeeded");
            (
                StatusCode::CREATED,
                Json(SessionResponse {
                    session_token: token.into_inner(),
                }),
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}
