//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, in-flight tracking)
//! - Bind server to listener
//! - Drain on request: stop accepting, finish in-flight requests

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, AppInfoConfig};
use crate::http::handlers;
use crate::http::request::MakeRequestUuidV4;
use crate::lifecycle::processor::{ProcessorError, RequestProcessor};
use crate::net::connection::InFlightTracker;
use crate::net::listener;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub info: Arc<AppInfoConfig>,
}

/// HTTP server acting as the coordinator's request processor.
pub struct HttpServer {
    config: AppConfig,
    in_flight: InFlightTracker,
    extra_routes: Router,
}

/// A running server, consumed by `drain`.
#[derive(Debug)]
pub struct ServerHandle {
    local_addr: SocketAddr,
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl ServerHandle {
    /// Address the server is accepting on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            in_flight: InFlightTracker::new(),
            extra_routes: Router::new(),
        }
    }

    /// Serve additional routes next to the built-in ones.
    pub fn merge(mut self, routes: Router) -> Self {
        self.extra_routes = self.extra_routes.merge(routes);
        self
    }

    /// Tracker for requests currently in flight.
    pub fn in_flight(&self) -> InFlightTracker {
        self.in_flight.clone()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(&self) -> Router {
        let state = AppState {
            info: Arc::new(self.config.app.clone()),
        };

        Router::new()
            .route("/", get(handlers::home))
            .route("/health", get(handlers::health))
            .route("/api/info", get(handlers::info))
            .with_state(state)
            .merge(self.extra_routes.clone())
            .layer(middleware::from_fn_with_state(self.in_flight.clone(), track_requests))
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }
}

impl RequestProcessor for HttpServer {
    type Handle = ServerHandle;

    async fn start(&self) -> Result<ServerHandle, ProcessorError> {
        let listener = listener::bind(&self.config.listener.bind_address).await?;
        let local_addr = listener.local_addr()?;

        let app = self.build_router();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.await;
                })
                .await
        });

        tracing::info!(address = %local_addr, "HTTP server accepting connections");
        Ok(ServerHandle {
            local_addr,
            stop_tx,
            task,
        })
    }

    async fn drain(&self, handle: ServerHandle) -> Result<(), ProcessorError> {
        let ServerHandle {
            local_addr,
            stop_tx,
            task,
        } = handle;

        tracing::info!(
            address = %local_addr,
            in_flight = self.in_flight.active_count(),
            "HTTP server draining"
        );
        // Receiver gone means the serve loop already exited; the join below reports why.
        let _ = stop_tx.send(());

        match task.await {
            Ok(Ok(())) => {
                tracing::info!(address = %local_addr, "HTTP server stopped");
                Ok(())
            }
            Ok(Err(e)) => Err(ProcessorError::Serve(e)),
            Err(e) => Err(ProcessorError::Task(e.to_string())),
        }
    }
}

/// Count the request as in flight and record its metrics.
async fn track_requests(
    State(in_flight): State<InFlightTracker>,
    request: Request,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let guard = in_flight.track();

    tracing::debug!(
        request_seq = %guard.seq(),
        method = %method,
        path = %request.uri().path(),
        "Handling request"
    );

    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}
