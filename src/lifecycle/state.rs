//! Process lifecycle state machine.
//!
//! # States
//! - Running: initial state, no shutdown begun. The cell does not track
//!   startup; a processor that failed to start leaves it here, and the
//!   coordinator reports that as a startup error instead.
//! - Draining: shutdown signal received, in-flight work finishing
//! - Stopped: drain completed within the grace period (terminal)
//! - ForceKilled: grace period elapsed before drain completed (terminal)
//!
//! # State Transitions
//! ```text
//! Running  → Draining:    first termination signal
//! Draining → Stopped:     drain returned (success or error) before the deadline
//! Draining → ForceKilled: deadline fired before drain returned
//! ```
//!
//! # Design Decisions
//! - Single atomic cell, transitions are compare-and-swap only
//! - A refused transition is reported, never retried
//! - No transition is ever reversed

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use thiserror::Error;

use crate::observability::metrics;

/// Lifecycle state of the service process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    /// Not yet draining.
    Running = 0,
    /// No new work admitted; in-flight work finishing.
    Draining = 1,
    /// Drain attempted and returned before the deadline.
    Stopped = 2,
    /// Deadline exceeded; drain abandoned.
    ForceKilled = 3,
}

impl LifecycleState {
    /// Whether no further transition can leave this state.
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Stopped | LifecycleState::ForceKilled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Running => "running",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
            LifecycleState::ForceKilled => "force_killed",
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => LifecycleState::Running,
            1 => LifecycleState::Draining,
            2 => LifecycleState::Stopped,
            _ => LifecycleState::ForceKilled,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition the state machine refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid lifecycle transition: {actual} -> {requested} (expected to be in {expected})")]
pub struct TransitionError {
    pub expected: LifecycleState,
    pub actual: LifecycleState,
    pub requested: LifecycleState,
}

/// The process-wide lifecycle cell.
///
/// Readers may call [`Lifecycle::state`] from anywhere; only the
/// coordinator performs transitions.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    /// Create a cell in the `Running` state ("not yet draining").
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Running as u8),
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Running → Draining.
    pub(crate) fn begin_drain(&self) -> Result<(), TransitionError> {
        self.transition(LifecycleState::Running, LifecycleState::Draining)
    }

    /// Draining → `outcome`, where `outcome` is a terminal state.
    pub(crate) fn finish(&self, outcome: LifecycleState) -> Result<(), TransitionError> {
        if !outcome.is_terminal() {
            return Err(TransitionError {
                expected: LifecycleState::Draining,
                actual: self.state(),
                requested: outcome,
            });
        }
        self.transition(LifecycleState::Draining, outcome)
    }

    fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<(), TransitionError> {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|actual| TransitionError {
                expected: from,
                actual: LifecycleState::from_u8(actual),
                requested: to,
            })?;

        metrics::record_lifecycle_state(to);
        tracing::info!(from = %from, to = %to, "Lifecycle transition");
        Ok(())
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Running);
    }

    #[test]
    fn graceful_path() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin_drain().unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Draining);

        lifecycle.finish(LifecycleState::Stopped).unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[test]
    fn draining_entered_once() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin_drain().unwrap();

        let err = lifecycle.begin_drain().unwrap_err();
        assert_eq!(err.actual, LifecycleState::Draining);
        assert_eq!(lifecycle.state(), LifecycleState::Draining);
    }

    #[test]
    fn terminal_states_are_final() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin_drain().unwrap();
        lifecycle.finish(LifecycleState::ForceKilled).unwrap();

        assert!(lifecycle.finish(LifecycleState::Stopped).is_err());
        assert!(lifecycle.begin_drain().is_err());
        assert_eq!(lifecycle.state(), LifecycleState::ForceKilled);
    }

    #[test]
    fn cannot_finish_from_running() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.finish(LifecycleState::Stopped).is_err());
        assert_eq!(lifecycle.state(), LifecycleState::Running);
    }

    #[test]
    fn finish_requires_terminal_target() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin_drain().unwrap();
        assert!(lifecycle.finish(LifecycleState::Running).is_err());
        assert_eq!(lifecycle.state(), LifecycleState::Draining);
    }
}
