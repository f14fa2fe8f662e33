//! API handlers and shared response helpers.
//!
//! Every failure leaves the router as a JSON body with a stable `error` kind
//! and a human-readable `message`. Internal details are logged, not returned.

pub mod health;
pub mod login;
pub mod session;
pub mod signup;
pub mod types;
pub mod unavailable;

use axum::{
    extract::rejection::JsonRejection,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use tracing::{debug, error};

use self::types::ErrorBody;
use crate::identity::AuthError;

pub(crate) fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: kind.to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidCredentialFormat(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::DuplicateAccount => StatusCode::CONFLICT,
            Self::AccountLocked => StatusCode::LOCKED,
            Self::BackendTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            Self::Internal(detail) => {
                error!("identity provider fault: {detail}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        error_response(status, self.kind(), &message)
    }
}

/// Missing or unparsable JSON bodies are a credential format problem.
pub(crate) fn invalid_payload(rejection: &JsonRejection) -> Response {
    debug!("rejected payload: {rejection}");
    AuthError::InvalidCredentialFormat("Missing or malformed JSON payload".to_string())
        .into_response()
}

/// Extract `Authorization: Bearer <token>`.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not_found", "Not found")
}

pub async fn method_not_allowed() -> Response {
    error_response(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        "Method not allowed",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn auth_errors_map_to_statuses() {
        let cases = [
            (
                AuthError::InvalidCredentialFormat("Invalid email".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::DuplicateAccount, StatusCode::CONFLICT),
            (AuthError::AccountLocked, StatusCode::LOCKED),
            (AuthError::BackendTimeout, StatusCode::GATEWAY_TIMEOUT),
            (
                AuthError::Internal("db down".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), None);
    }
}
