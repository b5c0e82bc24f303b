//! Single-assignment completion gate.
//!
//! Several producers race to [`OneShotGate::offer`] a value; the first one
//! is stored and every later offer is refused. Consumers await
//! [`OneShotGate::wait`] to observe the winner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use tokio::sync::Notify;

/// Accepts exactly one value among racing producers.
#[derive(Debug)]
pub struct OneShotGate<T> {
    claimed: AtomicBool,
    slot: OnceLock<T>,
    notify: Notify,
}

impl<T> OneShotGate<T> {
    pub fn new() -> Self {
        Self {
            claimed: AtomicBool::new(false),
            slot: OnceLock::new(),
            notify: Notify::new(),
        }
    }

    /// Offer a value. Returns `true` if this offer won the gate.
    pub fn offer(&self, value: T) -> bool {
        self.offer_with(value, |_| {})
    }

    /// Like [`OneShotGate::offer`], but the winner runs `on_win` before any
    /// waiter can observe the value.
    pub fn offer_with<F>(&self, value: T, on_win: F) -> bool
    where
        F: FnOnce(&T),
    {
        if self.claimed.swap(true, Ordering::AcqRel) {
            return false;
        }
        on_win(&value);
        // Only the claimant reaches here, so the slot is still empty.
        let _ = self.slot.set(value);
        self.notify.notify_waiters();
        true
    }

    /// The winning value, if any offer has been accepted.
    pub fn get(&self) -> Option<&T> {
        self.slot.get()
    }

    pub fn is_settled(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Wait until some producer wins the gate.
    pub async fn wait(&self) -> &T {
        loop {
            // Registered before the check so a concurrent offer cannot slip between them.
            let notified = self.notify.notified();
            if let Some(value) = self.slot.get() {
                return value;
            }
            notified.await;
        }
    }
}

impl<T> Default for OneShotGate<T> {
    fn default() -> Self {
        Self::new()
    }
}
