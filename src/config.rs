//! Capture pipeline configuration.
//!
//! All options are fixed for the lifetime of a pipeline; there is no hot
//! reload. The defaults are tuned for interactive agent CLIs that redraw a
//! status band at the bottom of the screen while streaming output above it.

// Rust guideline compliant 2026-03

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of bottom screen rows excluded from stability emission.
///
/// Interactive CLIs typically keep a one-row status line plus a spinner or
/// input prompt at the bottom of the screen. Two rows covers the common
/// layouts without eating into streamed output.
pub const DEFAULT_VOLATILE_ROW_COUNT: usize = 2;

/// Default minimum unchanged duration before a screen row may be emitted.
///
/// 350ms sits above the frame interval of every spinner observed in the
/// wild (60-250ms) while keeping end-of-response latency unnoticeable.
pub const DEFAULT_STABILITY_WINDOW: Duration = Duration::from_millis(350);

/// Default scrollback line limit for the terminal model.
///
/// 50K lines captures multi-hour sessions at typical agent output rates
/// (~100 lines/minute) for a few megabytes per pipeline.
pub const DEFAULT_MAX_HISTORY: usize = 50_000;

/// Default transcript queue capacity before oldest-drop kicks in.
///
/// Consumers polling at any sane interval stay far below this; the bound
/// exists so an abandoned consumer cannot grow the queue without limit.
pub const DEFAULT_MAX_QUEUED_EVENTS: usize = 8_192;

/// Options for the capture pipeline.
///
/// Construct with [`CaptureConfig::default`] and override fields as needed:
///
/// ```
/// use ptyscribe::CaptureConfig;
/// use std::time::Duration;
///
/// let config = CaptureConfig {
///     stability_window: Duration::from_millis(200),
///     ..CaptureConfig::default()
/// };
/// assert!(config.suppress_alternate_screen);
/// ```
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CaptureConfig {
    /// Number of bottom screen rows excluded from screen-stability emission
    /// (the status/spinner band).
    pub volatile_row_count: usize,
    /// Minimum contiguous unchanged time required before a screen row may be
    /// emitted.
    pub stability_window: Duration,
    /// When true, screen-stability emission is inhibited while the child has
    /// the alternate screen buffer active; history emission continues.
    pub suppress_alternate_screen: bool,
    /// Scrollback line limit for the terminal model. Oldest lines are
    /// evicted once the bound is reached.
    pub max_history: usize,
    /// Transcript queue capacity; the oldest event is dropped on overflow.
    pub max_queued_events: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            volatile_row_count: DEFAULT_VOLATILE_ROW_COUNT,
            stability_window: DEFAULT_STABILITY_WINDOW,
            suppress_alternate_screen: true,
            max_history: DEFAULT_MAX_HISTORY,
            max_queued_events: DEFAULT_MAX_QUEUED_EVENTS,
        }
    }
}
