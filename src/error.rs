//! Error taxonomy for the capture pipeline.
//!
//! Nothing in the pipeline is fatal - it is designed to survive arbitrary
//! input, including random bytes. The variants here cover the cases that are
//! surfaced to callers:
//!
//! - [`CaptureError::InvalidArgument`] - bad geometry or out-of-range view
//!   reads; returned before any state mutation.
//! - [`CaptureError::Dispatch`] - a damage listener failed; logged by the
//!   dispatcher, which then continues with the next listener.
//! - [`CaptureError::Disconnected`] - the terminal worker is gone and can no
//!   longer accept commands.
//!
//! Malformed VT sequences never surface as errors: the emulator's scanner
//! resynchronizes internally. Output-queue overflow is handled by dropping
//! the oldest event and counting the drop (see
//! [`TranscriptQueue`](crate::worker::TranscriptQueue)).

// Rust guideline compliant 2026-03

use thiserror::Error;

/// Errors surfaced by the capture pipeline.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// A caller-supplied argument was out of range: non-positive geometry,
    /// an `end < start` range, or a range beyond the view bounds.
    ///
    /// No state is mutated when this is returned.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A damage listener returned an error during dispatch.
    ///
    /// The dispatcher logs this and invokes the remaining listeners; the
    /// terminal model's state is unaffected.
    #[error("damage listener failed: {0}")]
    Dispatch(String),

    /// The terminal worker thread has shut down; commands can no longer be
    /// delivered.
    #[error("terminal worker disconnected")]
    Disconnected,
}

impl CaptureError {
    /// Build an [`CaptureError::InvalidArgument`] for a bad line range.
    pub(crate) fn bad_range(what: &str, start: usize, end: usize, bound: usize) -> Self {
        Self::InvalidArgument(format!(
            "{what} range {start}..{end} out of bounds (len {bound})"
        ))
    }
}
