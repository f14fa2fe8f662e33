//! Cross-origin policy applied to every request before routing.
//!
//! A matching `Origin` gets `Access-Control-Allow-Origin` echoed back together
//! with `Access-Control-Allow-Credentials: true`. Any other origin gets
//! neither header and the browser enforces same-origin rules. Requests are
//! never rejected here.

use anyhow::{Context, Result};
use axum::{
    extract::Request,
    http::{
        header::{ACCESS_CONTROL_REQUEST_METHOD, AUTHORIZATION, CONTENT_TYPE},
        request::Parts,
        HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowCredentials, AllowOrigin, CorsLayer};

use crate::config::ServiceConfiguration;

pub(crate) const X_REQUEST_ID: &str = "x-request-id";

/// Build the CORS layer for the configured origin.
///
/// # Errors
/// Returns an error if the origin is not a valid header value.
pub fn layer(config: &ServiceConfiguration) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(config.allowed_origin())
        .context("Failed to build allowed origin header")?;

    let credentialed = origin.clone();
    let credentials_allowed = config.credentials_allowed();

    Ok(CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .expose_headers([HeaderName::from_static(X_REQUEST_ID)])
        // `list` echoes the origin only when it matches.
        .allow_origin(AllowOrigin::list([origin]))
        .allow_credentials(AllowCredentials::predicate(
            move |request_origin: &HeaderValue, _parts: &Parts| {
                credentials_allowed && *request_origin == credentialed
            },
        )))
}

/// Answer any `OPTIONS` request that is not a CORS preflight with `204`.
///
/// [`CorsLayer`] treats every `OPTIONS` as a preflight, so this wraps it and
/// only rewrites the status; the CORS headers it decided are kept.
pub async fn short_circuit_options(request: Request, next: Next) -> Response {
    let bare_options = request.method() == Method::OPTIONS
        && !request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD);

    let mut response = next.run(request).await;
    if bare_options && response.status().is_success() {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}
