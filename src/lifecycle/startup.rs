//! Startup orchestration.
//!
//! # Responsibilities
//! - Start background exporters (metrics)
//! - Register termination signal handlers
//! - Hand the HTTP server to the coordinator and map the outcome to an exit code
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Signal handlers are registered before the listener is bound
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::lifecycle::coordinator::Coordinator;
use crate::lifecycle::signals::SignalListener;
use crate::lifecycle::EXIT_STARTUP_FAILURE;
use crate::observability::metrics;

/// Run the service until it stops, returning the process exit code.
///
/// `config` must already be validated.
pub async fn run(config: AppConfig) -> u8 {
    let grace = match config.shutdown.grace_period() {
        Ok(grace) => grace,
        Err(e) => {
            tracing::error!(error = %e, "Invalid shutdown configuration");
            return EXIT_STARTUP_FAILURE;
        }
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let signals = match SignalListener::register() {
        Ok(signals) => signals,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register signal handlers");
            return EXIT_STARTUP_FAILURE;
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        grace_period_secs = config.shutdown.grace_period_secs,
        request_timeout_secs = config.timeouts.request_secs,
        environment = %config.app.environment,
        "Starting server"
    );

    let server = HttpServer::new(config);
    match Coordinator::new(server, signals, grace).run().await {
        Ok(report) => {
            tracing::info!(
                state = %report.state,
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Shutdown complete"
            );
            report.exit_code()
        }
        Err(e) => {
            tracing::error!(error = %e, exit_code = e.exit_code(), "Shutdown failed");
            e.exit_code()
        }
    }
}
