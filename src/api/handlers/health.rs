use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

use super::types::StatusResponse;
use crate::{identity::OperatingMode, GIT_COMMIT_HASH};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    mode: String,
    identity_provider: String,
}

#[utoipa::path(
    get,
    path = "/api/auth/ok",
    responses(
        (status = 200, description = "Gateway is alive", body = StatusResponse),
    ),
    tag = "health"
)]
// liveness, served in every operating mode
pub async fn ok() -> impl IntoResponse {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Build and operating mode information", body = Health),
    ),
    tag = "health"
)]
pub async fn health(mode: Extension<OperatingMode>) -> impl IntoResponse {
    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: mode.as_str().to_string(),
        identity_provider: mode
            .provider()
            .map_or("disabled", |provider| provider.kind())
            .to_string(),
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            debug!("X-App header: {:?}", x_app_header_value);

            let mut headers = HeaderMap::new();

            headers.insert("X-App", x_app_header_value);

            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });

    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    (StatusCode::OK, headers, Json(health))
}
