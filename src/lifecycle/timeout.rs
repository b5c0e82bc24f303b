//! Shutdown deadline enforcement.
//!
//! # Responsibilities
//! - Hold the configured grace period (validated once, immutable)
//! - Derive the shutdown deadline from the moment the signal arrived
//! - Run a single expiry action at the deadline unless cancelled first
//!
//! # Design Decisions
//! - Uses Tokio's timer facilities (non-blocking, runs beside the drain)
//! - At most one action per arm call
//! - `cancel()` is idempotent and a no-op after the action fired

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{self, Instant};

/// A grace period of zero would force-kill every shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("grace period must be greater than zero")]
pub struct ZeroGracePeriod;

/// Maximum time allotted for in-flight work after shutdown begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePeriod(Duration);

impl GracePeriod {
    pub fn new(duration: Duration) -> Result<Self, ZeroGracePeriod> {
        if duration.is_zero() {
            return Err(ZeroGracePeriod);
        }
        Ok(Self(duration))
    }

    pub fn from_secs(secs: u64) -> Result<Self, ZeroGracePeriod> {
        Self::new(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

/// The instant by which the drain must have completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownDeadline(Instant);

impl ShutdownDeadline {
    /// Deadline for a shutdown whose signal arrived at `signal_at`.
    pub fn starting_at(signal_at: Instant, grace: GracePeriod) -> Self {
        Self(signal_at + grace.as_duration())
    }

    pub fn instant(&self) -> Instant {
        self.0
    }

    /// Time left before the deadline (zero once passed).
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }
}

/// Runs an action at a deadline unless cancelled first.
///
/// Must be armed from within a Tokio runtime. Dropping the enforcer
/// cancels it.
#[derive(Debug)]
pub struct TimeoutEnforcer {
    deadline: ShutdownDeadline,
    cancel_tx: watch::Sender<bool>,
    fired: Arc<AtomicBool>,
}

impl TimeoutEnforcer {
    /// Schedule `on_expiry` to run once at `deadline`.
    pub fn arm<F>(deadline: ShutdownDeadline, on_expiry: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let fired = Arc::new(AtomicBool::new(false));
        let task_fired = Arc::clone(&fired);

        tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = cancel_rx.wait_for(|cancelled| *cancelled) => {
                    tracing::debug!("Shutdown deadline cancelled");
                }
                _ = time::sleep_until(deadline.instant()) => {
                    task_fired.store(true, Ordering::SeqCst);
                    on_expiry();
                }
            }
        });

        tracing::debug!(
            remaining_ms = deadline.remaining().as_millis() as u64,
            "Shutdown deadline armed"
        );

        Self {
            deadline,
            cancel_tx,
            fired,
        }
    }

    /// Prevent the action from running. Safe to call repeatedly or after firing.
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Whether the expiry action has run.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn deadline(&self) -> ShutdownDeadline {
        self.deadline
    }
}
