//! Shared utilities for lifecycle and HTTP integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use demo_app::lifecycle::{ProcessorError, RequestProcessor, SignalListener, TerminationSignal};
use tokio::sync::mpsc;

/// Call counters shared between a test and its mock processor.
#[derive(Debug, Default)]
pub struct Calls {
    pub starts: AtomicU32,
    pub drains: AtomicU32,
    pub drains_finished: AtomicU32,
}

impl Calls {
    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn drains(&self) -> u32 {
        self.drains.load(Ordering::SeqCst)
    }

    pub fn drains_finished(&self) -> u32 {
        self.drains_finished.load(Ordering::SeqCst)
    }
}

/// A request processor whose start and drain behavior is scripted.
pub struct MockProcessor {
    start_error: Option<String>,
    /// `None` means drain never returns.
    drain_time: Option<Duration>,
    drain_error: Option<String>,
    pub calls: Arc<Calls>,
}

impl MockProcessor {
    fn new(drain_time: Option<Duration>) -> Self {
        Self {
            start_error: None,
            drain_time,
            drain_error: None,
            calls: Arc::new(Calls::default()),
        }
    }

    pub fn draining_for(time: Duration) -> Self {
        Self::new(Some(time))
    }

    pub fn never_draining() -> Self {
        Self::new(None)
    }

    pub fn failing_drain_after(time: Duration, message: &str) -> Self {
        Self {
            drain_error: Some(message.to_string()),
            ..Self::new(Some(time))
        }
    }

    pub fn failing_start(message: &str) -> Self {
        Self {
            start_error: Some(message.to_string()),
            ..Self::new(Some(Duration::ZERO))
        }
    }
}

impl RequestProcessor for MockProcessor {
    type Handle = ();

    async fn start(&self) -> Result<(), ProcessorError> {
        self.calls.starts.fetch_add(1, Ordering::SeqCst);
        match &self.start_error {
            Some(message) => Err(ProcessorError::Other(message.clone())),
            None => Ok(()),
        }
    }

    async fn drain(&self, _handle: ()) -> Result<(), ProcessorError> {
        self.calls.drains.fetch_add(1, Ordering::SeqCst);
        match self.drain_time {
            Some(time) => tokio::time::sleep(time).await,
            None => std::future::pending::<()>().await,
        }
        self.calls.drains_finished.fetch_add(1, Ordering::SeqCst);

        match &self.drain_error {
            Some(message) => Err(ProcessorError::Other(message.clone())),
            None => Ok(()),
        }
    }
}

/// A listener that already holds `signals`, delivered in order.
pub fn signalled(signals: &[TerminationSignal]) -> SignalListener {
    let (tx, rx) = mpsc::channel(signals.len().max(1));
    for sig in signals {
        tx.try_send(*sig).unwrap();
    }
    SignalListener::from_channel(rx)
}

/// A replacement forced-exit action that only counts how often it ran.
pub fn kill_counter() -> (Arc<AtomicU32>, impl FnOnce() + Send + 'static) {
    let kills = Arc::new(AtomicU32::new(0));
    let k = kills.clone();
    (kills, move || {
        k.fetch_add(1, Ordering::SeqCst);
    })
}
