//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGHUP, SIGINT, SIGTERM and SIGQUIT
//! - Collapse their arrival into a single in-process shutdown event
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Registration happens in `register()`, before any work is admitted
//! - Only the first signal of any kind is delivered; the rest are dropped
//! - Never touches process state itself

use std::fmt;

use tokio::sync::mpsc;

/// An OS-delivered stop signal. All kinds trigger the same shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationSignal {
    Hangup,
    Interrupt,
    Terminate,
    Quit,
}

impl TerminationSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminationSignal::Hangup => "SIGHUP",
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
            TerminationSignal::Quit => "SIGQUIT",
        }
    }
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produces at most one termination event for the lifetime of the process.
///
/// Construct it once, before the request processor starts, and hand it to
/// the coordinator. [`SignalListener::recv`] consumes the listener, so a
/// second shutdown sequence cannot be started from it.
#[derive(Debug)]
pub struct SignalListener {
    events: mpsc::Receiver<TerminationSignal>,
}

impl SignalListener {
    /// Register OS handlers for all termination signals.
    ///
    /// Must be called from within a Tokio runtime. Handlers are installed
    /// before this returns, so no signal delivered afterwards is lost.
    #[cfg(unix)]
    pub fn register() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let (tx, rx) = mpsc::channel(1);
        let kinds = [
            (SignalKind::hangup(), TerminationSignal::Hangup),
            (SignalKind::interrupt(), TerminationSignal::Interrupt),
            (SignalKind::terminate(), TerminationSignal::Terminate),
            (SignalKind::quit(), TerminationSignal::Quit),
        ];

        for (kind, sig) in kinds {
            let mut stream = signal(kind)?;
            let tx = tx.clone();
            tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    if tx.try_send(sig).is_err() {
                        tracing::debug!(signal = %sig, "Shutdown already underway, signal ignored");
                    }
                }
            });
        }

        tracing::debug!("Termination signal handlers registered");
        Ok(Self { events: rx })
    }

    /// Register the Ctrl+C handler (the only stop signal exposed here).
    #[cfg(not(unix))]
    pub fn register() -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if tx.try_send(TerminationSignal::Interrupt).is_err() {
                    tracing::debug!("Shutdown already underway, signal ignored");
                }
            }
        });
        Ok(Self { events: rx })
    }

    /// Listen on an in-process source instead of OS signals.
    pub fn from_channel(events: mpsc::Receiver<TerminationSignal>) -> Self {
        Self { events }
    }

    /// Wait for the first termination signal.
    ///
    /// Returns `None` if the source closed without delivering one.
    pub async fn recv(mut self) -> Option<TerminationSignal> {
        let first = self.events.recv().await;
        self.events.close();
        first
    }
}
