//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router: every method and path goes to the forwarder
//! - Serve HTTP/1.1 and HTTP/2 on the public listener
//! - Wire up tracing with a per-request id
//! - Stop accepting on shutdown and let in-flight relays finish

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::http::forward::Forwarder;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
}

/// The public-facing gateway server.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
}

impl GatewayServer {
    /// Create a new gateway server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let forwarder = Arc::new(Forwarder::new(&config.upstream, &config.timeouts));
        let state = AppState { forwarder };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// A fallback rather than a route table: no path or method is rejected
    /// before it reaches the upstream.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new().layer(TraceLayer::new_for_http().make_span_with(
                    |request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            request_id = %Uuid::new_v4(),
                            method = %request.method(),
                            uri = %request.uri(),
                        )
                    },
                )),
            )
    }

    /// A clone of the router, for driving the gateway in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.authority(),
            "Gateway listening"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.forwarder.forward(request).await
}
