//! Demo web service with a coordinated graceful shutdown.
//!
//! # Architecture Overview
//!
//! ```text
//!   SIGHUP/INT/TERM/QUIT
//!           │
//!           ▼
//!   ┌────────────────┐   first signal   ┌──────────────────────────────┐
//!   │ SignalListener │ ───────────────▶ │         Coordinator          │
//!   └────────────────┘                  │  Running → Draining → ...    │
//!                                       └──────┬──────────────┬────────┘
//!                                    drain()   │              │  arm(deadline)
//!                                              ▼              ▼
//!                                   ┌────────────────┐ ┌─────────────────┐
//!                                   │   HttpServer   │ │ TimeoutEnforcer │
//!                                   │ (axum, routes) │ │  (forced exit)  │
//!                                   └───────┬────────┘ └────────┬────────┘
//!                                           └──▶ one-shot gate ◀┘
//!                                                 first wins
//! ```
//!
//! Exit codes: 0 graceful stop, 1 startup failure, 2 drain error,
//! 3 forced kill after the grace period.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{Coordinator, GracePeriod, SignalListener};
