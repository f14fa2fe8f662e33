//! Session introspection and revocation for bearer tokens.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::time::{SystemTime, UNIX_EPOCH};

use super::bearer_token;
use super::types::{ErrorBody, SessionInfoResponse};
use crate::identity::{AuthError, IdentityProviderHandle};

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    params(
        ("Authorization" = String, Header, description = "Bearer session token")
    ),
    responses(
        (status = 200, description = "Session is valid", body = SessionInfoResponse),
        (status = 401, description = "Missing, unknown or expired token", body = ErrorBody),
        (status = 503, description = "Identity provider disabled", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn session(provider: Extension<IdentityProviderHandle>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return AuthError::InvalidCredentials.into_response();
    };

    match provider.validate_session(token).await {
        Ok(info) => (
            StatusCode::OK,
            Json(SessionInfoResponse {
                email: info.email,
                issued_at: unix_seconds(info.issued_at),
                expires_at: unix_seconds(info.expires_at),
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    params(
        ("Authorization" = String, Header, description = "Bearer session token")
    ),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "Missing bearer token", body = ErrorBody),
        (status = 503, description = "Identity provider disabled", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn logout(provider: Extension<IdentityProviderHandle>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return AuthError::InvalidCredentials.into_response();
    };

    match provider.revoke_session(token).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
