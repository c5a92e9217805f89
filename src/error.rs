//! Error taxonomy for pipeline construction and execution.
//!
//! Public entry points return [`anyhow::Result`] so callers can attach context
//! freely; the typed [`FlowError`] stays reachable through
//! [`anyhow::Error::downcast_ref`]. Nothing in a bounded pass is retried: a pass
//! either completes or fails once.

use std::time::Duration;
use thiserror::Error;

/// Failures raised by windowing, grouping, combining and the I/O boundary.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A window function was built with a non-positive size, period or gap
    /// (or a sliding period larger than its size).
    #[error("invalid window spec: {0}")]
    InvalidWindowSpec(String),

    /// An internal contract was violated, e.g. accumulators that cannot be merged.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// A value was emitted to, or looked up under, a tag that was not declared.
    #[error("unknown output tag {tag:?}; declared: {declared:?}")]
    UnknownTag { tag: Option<String>, declared: Vec<String> },

    /// The bounded source failed while being read.
    #[error("source error: {0}")]
    Source(#[source] anyhow::Error),

    /// The sink failed while being opened, written or closed.
    #[error("sink error: {0}")]
    Sink(#[source] anyhow::Error),

    /// Pipeline configuration could not be parsed or validated.
    #[error("config error: {0}")]
    Config(String),

    /// The whole pass exceeded the runner's time limit.
    #[error("pipeline pass exceeded time-out of {0:?}")]
    Timeout(Duration),

    /// A type-erased partition did not hold the expected type.
    #[error("type mismatch: expected {expected}")]
    TypeMismatch { expected: &'static str },
}

impl FlowError {
    pub(crate) fn invariant(msg: impl Into<String>) -> Self {
        FlowError::Invariant(msg.into())
    }

    pub(crate) fn window_spec(msg: impl Into<String>) -> Self {
        FlowError::InvalidWindowSpec(msg.into())
    }
}

/// Shorthand used throughout the core modules.
pub type FlowResult<T> = Result<T, FlowError>;
