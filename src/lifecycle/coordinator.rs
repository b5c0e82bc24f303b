//! Shutdown orchestration.
//!
//! # Data Flow
//! ```text
//! start processor ─▶ Running ─▶ wait for signal ─▶ Draining
//!                                                    │
//!                        ┌───────────────────────────┴──────────────┐
//!                        ▼                                          ▼
//!                 drain task (spawned)                   deadline enforcer
//!                        │                                          │
//!                        └──────────▶ one-shot gate ◀───────────────┘
//!                                          │
//!                     Drained ─▶ Stopped   │   DeadlineElapsed ─▶ ForceKilled
//! ```
//!
//! # Design Decisions
//! - The processor starts only after the signal listener is registered
//!   (the listener is a constructor argument)
//! - Deadline armed before the drain task is spawned
//! - The abandoned drain is not cancelled; its late result is discarded
//! - No error is retried

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::lifecycle::gate::OneShotGate;
use crate::lifecycle::processor::{ProcessorError, RequestProcessor};
use crate::lifecycle::signals::{SignalListener, TerminationSignal};
use crate::lifecycle::state::{Lifecycle, LifecycleState, TransitionError};
use crate::lifecycle::timeout::{GracePeriod, ShutdownDeadline, TimeoutEnforcer};
use crate::lifecycle::{
    EXIT_DRAIN_FAILURE, EXIT_FORCE_KILLED, EXIT_LIFECYCLE_FAULT, EXIT_OK, EXIT_STARTUP_FAILURE,
};
use crate::observability::metrics;

/// Fatal outcomes of a coordinated run.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The processor never reached Running.
    #[error("request processor failed to start: {0}")]
    Startup(#[source] ProcessorError),

    /// Drain returned an error before the deadline.
    #[error("drain failed: {0}")]
    Drain(#[source] ProcessorError),

    /// The grace period elapsed before drain returned.
    #[error("graceful shutdown exceeded its {0:?} grace period")]
    Timeout(Duration),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl ShutdownError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ShutdownError::Startup(_) => EXIT_STARTUP_FAILURE,
            ShutdownError::Drain(_) => EXIT_DRAIN_FAILURE,
            ShutdownError::Timeout(_) => EXIT_FORCE_KILLED,
            ShutdownError::Transition(_) => EXIT_LIFECYCLE_FAULT,
        }
    }
}

/// Summary of a graceful stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Signal that started the shutdown (`None` if the source closed).
    pub signal: Option<TerminationSignal>,
    pub state: LifecycleState,
    /// Time from signal to drain completion.
    pub elapsed: Duration,
}

impl ShutdownReport {
    pub fn exit_code(&self) -> u8 {
        EXIT_OK
    }
}

/// What finished first after draining began.
#[derive(Debug, Clone, Copy)]
enum Completion {
    Drained,
    DeadlineElapsed,
}

type TimeoutAction = Box<dyn FnOnce() + Send>;

/// Owns the lifecycle of one request processor from start to exit.
pub struct Coordinator<P> {
    processor: Arc<P>,
    signals: SignalListener,
    grace: GracePeriod,
    lifecycle: Arc<Lifecycle>,
    on_timeout: TimeoutAction,
}

impl<P: RequestProcessor> Coordinator<P> {
    /// Create a coordinator. On timeout the process exits with
    /// [`EXIT_FORCE_KILLED`].
    pub fn new(processor: P, signals: SignalListener, grace: GracePeriod) -> Self {
        Self {
            processor: Arc::new(processor),
            signals,
            grace,
            lifecycle: Arc::new(Lifecycle::new()),
            on_timeout: Box::new(force_exit),
        }
    }

    /// Replace the forced-exit action run when the deadline wins.
    pub fn with_timeout_action<F>(mut self, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_timeout = Box::new(action);
        self
    }

    /// Shared read handle on the lifecycle state.
    pub fn lifecycle(&self) -> Arc<Lifecycle> {
        Arc::clone(&self.lifecycle)
    }

    pub fn grace_period(&self) -> GracePeriod {
        self.grace
    }

    /// Start the processor and block until it has stopped or been abandoned.
    pub async fn run(self) -> Result<ShutdownReport, ShutdownError> {
        let Self {
            processor,
            signals,
            grace,
            lifecycle,
            on_timeout,
        } = self;

        let handle = match processor.start().await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "Request processor failed to start");
                return Err(ShutdownError::Startup(e));
            }
        };

        metrics::record_lifecycle_state(lifecycle.state());
        tracing::info!(
            grace_period_secs = grace.as_duration().as_secs_f64(),
            "Request processor running, waiting for termination signal"
        );

        let signal = signals.recv().await;
        let signal_at = Instant::now();
        match signal {
            Some(sig) => {
                tracing::info!(signal = %sig, "Received shutdown signal, shutting down gracefully")
            }
            None => tracing::warn!("Signal source closed, shutting down"),
        }

        lifecycle.begin_drain()?;
        let deadline = ShutdownDeadline::starting_at(signal_at, grace);
        let gate = Arc::new(OneShotGate::new());

        let enforcer = TimeoutEnforcer::arm(deadline, {
            let gate = Arc::clone(&gate);
            let lifecycle = Arc::clone(&lifecycle);
            move || {
                let won = gate.offer_with(Completion::DeadlineElapsed, |_| {
                    if let Err(e) = lifecycle.finish(LifecycleState::ForceKilled) {
                        tracing::error!(error = %e, "Could not record forced kill");
                    }
                });
                if !won {
                    return;
                }
                metrics::record_shutdown("force_killed", signal_at.elapsed());
                tracing::error!(
                    grace_period_secs = grace.as_duration().as_secs_f64(),
                    "Graceful shutdown timed out, forcing exit"
                );
                on_timeout();
            }
        });

        let drain_gate = Arc::clone(&gate);
        let drain_processor = Arc::clone(&processor);
        // The task hands its result back through the join handle; the gate only
        // records who finished first.
        let drain_task = tokio::spawn(async move {
            tracing::info!("Draining request processor");
            let result = drain_processor.drain(handle).await;
            if !drain_gate.offer(Completion::Drained) {
                tracing::warn!(
                    failed = result.is_err(),
                    "Drain returned after the shutdown deadline, result ignored"
                );
            }
            result
        });

        match *gate.wait().await {
            Completion::Drained => {
                enforcer.cancel();
                lifecycle.finish(LifecycleState::Stopped)?;
                let elapsed = signal_at.elapsed();
                let result = drain_task
                    .await
                    .unwrap_or_else(|e| Err(ProcessorError::Task(e.to_string())));

                match result {
                    Ok(()) => {
                        metrics::record_shutdown("stopped", elapsed);
                        tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "Server exited");
                        Ok(ShutdownReport {
                            signal,
                            state: LifecycleState::Stopped,
                            elapsed,
                        })
                    }
                    Err(e) => {
                        metrics::record_shutdown("drain_failed", elapsed);
                        tracing::error!(error = %e, elapsed_ms = elapsed.as_millis() as u64, "Drain failed");
                        Err(ShutdownError::Drain(e))
                    }
                }
            }
            Completion::DeadlineElapsed => Err(ShutdownError::Timeout(grace.as_duration())),
        }
    }
}

fn force_exit() {
    std::process::exit(i32::from(EXIT_FORCE_KILLED));
}
