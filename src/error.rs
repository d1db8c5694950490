//! Error kinds shared across the graph runtime and DSP kernels.

use thiserror::Error;

/// Errors raised by graph nodes, transforms, and matrix storage.
///
/// `Exhaustion` (end of stream) and cancellation are deliberately *not*
/// variants here: both are cooperative, non-erroring outcomes and are
/// modeled as ordinary return values (see [`crate::source::ReadOutcome`]
/// and [`crate::graph::PumpOutcome`]).
#[derive(Debug, Error)]
pub enum Error {
    /// A node or transform was given parameters it cannot honor: an
    /// unsupported sample size, non-mono input to a mono-only transform, a
    /// non-power-of-two length incompatible with the chosen kernel, an
    /// unsupported resampling factor, an even bandwidth, and similar.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The underlying signal source failed to read, or a decoded format
    /// could not be interpreted.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal consistency invariant was violated, e.g. mismatched
    /// real/imaginary array lengths on a frame that requires both.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Error::Invariant(message.into())
    }
}
