//! HTTP server wiring for the relay.
//!
//! Every path and method lands on one fallback handler. The CORS and
//! content-type headers are attached to every response by a layer, so
//! the preflight and error paths carry them too. The request body is
//! only buffered for POST, so oversized or binary bodies on other methods
//! never change the outcome.

use crate::models::Config;
use crate::relay::{Relay, RelayError, RelayResponse};
use crate::Result;
use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Tracing target for server startup events.
pub const TRACING_TARGET_STARTUP: &str = "gemini_relay::server::startup";

/// Tracing target for server shutdown events.
pub const TRACING_TARGET_SHUTDOWN: &str = "gemini_relay::server::shutdown";

const ALLOWED_METHODS: &str = "POST, GET, OPTIONS";

/// Largest POST body buffered for the relay.
pub const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Builds the relay router with response headers and request tracing.
pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .fallback(relay_handler)
        .with_state(relay)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        ))
}

async fn relay_handler(State(relay): State<Arc<Relay>>, request: Request) -> RelayResponse {
    let (parts, body) = request.into_parts();

    if parts.method != Method::POST {
        return relay.handle(&parts.method, &[]).await;
    }

    match to_bytes(body, MAX_REQUEST_BODY_BYTES).await {
        Ok(bytes) => relay.handle(&parts.method, &bytes).await,
        Err(e) => {
            // Unreadable or oversized input counts as missing fields.
            tracing::warn!("Failed to read request body: {}", e);
            RelayError::BadRequest.into()
        }
    }
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        match self.to_json_bytes() {
            Ok(bytes) => (self.status, bytes).into_response(),
            Err(e) => {
                tracing::error!("Failed to encode relay response: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn serve(app: Router, config: &Config) -> Result<()> {
    let addr = config.server_addr();

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!(
            target: TRACING_TARGET_STARTUP,
            addr = %addr,
            error = %e,
            "Failed to bind to address"
        );
        e
    })?;

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        addr = %addr,
        "Relay is ready and listening for connections"
    );

    if config.binds_to_all_interfaces() {
        tracing::warn!(
            target: TRACING_TARGET_STARTUP,
            "Server is bound to all interfaces. Ensure firewall rules are properly configured."
        );
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(target: TRACING_TARGET_SHUTDOWN, "Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(
                target: TRACING_TARGET_SHUTDOWN,
                error = %e,
                "Failed to install Ctrl+C handler"
            );
        } else {
            tracing::info!(
                target: TRACING_TARGET_SHUTDOWN,
                "Received Ctrl+C signal, initiating graceful shutdown"
            );
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!(
                    target: TRACING_TARGET_SHUTDOWN,
                    "Received SIGTERM signal, initiating graceful shutdown"
                );
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_SHUTDOWN,
                    error = %e,
                    "Failed to install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
