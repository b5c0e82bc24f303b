//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Register signals → Start request processor → Running
//!
//! Shutdown (coordinator.rs):
//!     Signal received → Draining → Stop accepting → Drain in-flight work
//!         ├─ drain returns first   → Stopped     → exit 0 (or 2 on drain error)
//!         └─ deadline fires first  → ForceKilled → exit 3
//!
//! Signals (signals.rs):
//!     SIGHUP/SIGINT/SIGTERM/SIGQUIT → single shutdown event
//! ```
//!
//! # Design Decisions
//! - Signal handlers registered before any connection is accepted
//! - Shutdown has timeout: forced exit after deadline
//! - Drain and deadline race through a one-shot gate, first wins
//! - Shutdown is one-shot and monotonic; nothing is retried

pub mod coordinator;
pub mod gate;
pub mod processor;
pub mod signals;
pub mod startup;
pub mod state;
pub mod timeout;

pub use coordinator::{Coordinator, ShutdownError, ShutdownReport};
pub use processor::{ProcessorError, RequestProcessor};
pub use signals::{SignalListener, TerminationSignal};
pub use state::{Lifecycle, LifecycleState};
pub use timeout::{GracePeriod, ShutdownDeadline, TimeoutEnforcer};

/// Graceful stop completed.
pub const EXIT_OK: u8 = 0;
/// Configuration, signal registration or processor startup failed.
pub const EXIT_STARTUP_FAILURE: u8 = 1;
/// Drain returned an error.
pub const EXIT_DRAIN_FAILURE: u8 = 2;
/// Grace period exceeded; process terminated.
pub const EXIT_FORCE_KILLED: u8 = 3;
/// A lifecycle transition was refused after startup.
pub const EXIT_LIFECYCLE_FAULT: u8 = 4;
