use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request, Response, StatusCode},
    middleware,
    routing::{get, post},
    Extension, Router,
};
use std::{
    any::Any,
    net::{Ipv4Addr, Ipv6Addr},
    time::Duration,
};
use tokio::{net::TcpListener, sync::watch};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, warn, Span};
use ulid::Ulid;

use crate::{config::ServiceConfiguration, identity::OperatingMode};

pub mod cors;
pub(crate) mod handlers;
pub mod lifecycle;
mod openapi;

pub use openapi::openapi;

use self::cors::X_REQUEST_ID;
use self::handlers::{health, login, session, signup, unavailable};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Build the full application for the given operating mode.
///
/// The CORS gate wraps every route and the fallback, so policy is applied
/// before any routing decision.
///
/// # Errors
/// Returns an error if the configured origin cannot be turned into a header.
pub fn router(config: &ServiceConfiguration, mode: &OperatingMode) -> Result<Router> {
    let routes = Router::new()
        .route(
            "/health",
            get(health::health).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/auth/ok",
            get(health::ok).fallback(handlers::method_not_allowed),
        );

    let routes = match mode {
        OperatingMode::Active(provider) => routes
            .route(
                "/api/auth/signup",
                post(signup::signup).fallback(handlers::method_not_allowed),
            )
            .route(
                "/api/auth/login",
                post(login::login).fallback(handlers::method_not_allowed),
            )
            .route(
                "/api/auth/session",
                get(session::session).fallback(handlers::method_not_allowed),
            )
            .route(
                "/api/auth/logout",
                post(session::logout).fallback(handlers::method_not_allowed),
            )
            .fallback(handlers::not_found)
            .layer(Extension(provider.clone())),
        OperatingMode::Degraded => routes.fallback(unavailable::fallback),
    };

    let cors = cors::layer(config)?;

    Ok(routes.layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static(X_REQUEST_ID),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                X_REQUEST_ID,
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(middleware::from_fn(cors::short_circuit_options))
            .layer(cors)
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(Extension(mode.clone())),
    ))
}

/// Serve until a shutdown signal arrives.
///
/// The operating mode must already be decided; this is the only place the
/// listening socket is opened.
///
/// # Errors
/// Returns an error if the socket cannot be bound or the server fails.
pub async fn new(config: &ServiceConfiguration, mode: OperatingMode) -> Result<()> {
    let app = router(config, &mode)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if let Some(provider) = mode.provider() {
        lifecycle::spawn_session_sweeper(provider.clone(), SESSION_SWEEP_INTERVAL, shutdown_rx);
    }

    let port = config.listen_port();
    let listener = match TcpListener::bind((Ipv6Addr::UNSPECIFIED, port)).await {
        Ok(listener) => listener,
        Err(err) => {
            warn!("IPv6 bind failed ({err}), falling back to IPv4");
            TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
                .await
                .with_context(|| format!("Failed to bind port {port}"))?
        }
    };

    info!(
        mode = mode.as_str(),
        allowed_origin = config.allowed_origin(),
        "Listening on {}",
        listener.local_addr()?
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(lifecycle::shutdown_signal(shutdown_tx))
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response<Body> {
    error!(
        "request handler panicked: {}",
        lifecycle::panic_message(payload.as_ref())
    );
    handlers::error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "Internal server error",
    )
}
