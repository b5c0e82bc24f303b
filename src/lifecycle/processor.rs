//! The request processor seam.
//!
//! The coordinator starts a processor, later asks it to drain, and never
//! looks at the work it does. `http::HttpServer` is the production
//! implementation.

use std::future::Future;

use thiserror::Error;

use crate::net::listener::ListenerError;

/// Errors reported by a request processor.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Could not bind the listen address.
    #[error(transparent)]
    Bind(#[from] ListenerError),

    /// The serve loop failed while running or draining.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    /// The serve task panicked or was aborted.
    #[error("server task failed: {0}")]
    Task(String),

    /// Implementation-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Something that accepts work while running and can be drained.
pub trait RequestProcessor: Send + Sync + 'static {
    /// Token for a running processor, consumed by `drain`.
    type Handle: Send + 'static;

    /// Begin accepting work.
    fn start(&self) -> impl Future<Output = Result<Self::Handle, ProcessorError>> + Send;

    /// Stop admitting new work immediately, then wait for admitted work.
    fn drain(&self, handle: Self::Handle) -> impl Future<Output = Result<(), ProcessorError>> + Send;
}
