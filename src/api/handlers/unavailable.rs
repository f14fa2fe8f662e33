//! Degraded-mode fallback: identity paths answer `503`, never a fake success.

use axum::{
    http::{StatusCode, Uri},
    response::Response,
};
use tracing::debug;

use super::{error_response, not_found};

pub(crate) const AUTH_PREFIX: &str = "/api/auth/";

pub async fn fallback(uri: Uri) -> Response {
    if uri.path().starts_with(AUTH_PREFIX) {
        debug!(path = uri.path(), "identity request while degraded");
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "service_unavailable",
            "Identity provider is not available",
        );
    }
    not_found().await
}
