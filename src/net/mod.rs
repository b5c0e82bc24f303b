//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured bind address
//!     → listener.rs (parse, bind, log local address)
//!     → Hand off to HTTP layer (axum::serve)
//!
//! Each request:
//!     → connection.rs (in-flight tracking guard, dropped on completion)
//! ```
//!
//! # Design Decisions
//! - Bind errors are startup failures, reported before Running
//! - In-flight count observable while draining

pub mod connection;
pub mod listener;
