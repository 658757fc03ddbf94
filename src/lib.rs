//! ptyscribe - capture pipeline for PTY-driven CLI automation.
//!
//! Drives the output side of an interactive command-line program attached to
//! a pseudo-terminal and produces a clean, append-only textual transcript of
//! what the program meant to say, suppressing the visual noise of terminal
//! animations: spinners, progress bars, in-place rewrites, and
//! alternate-screen UIs.
//!
//! # Pipeline
//!
//! ```text
//! raw PTY bytes ──▶ TerminalModel ──damage──▶ CaptureEngine ──▶ TranscriptEvent
//!                   (grid + history)          (stability + churn filter)
//! ```
//!
//! Most callers use [`TerminalWorker`], which owns the whole sequence on a
//! dedicated thread and publishes events into a [`TranscriptQueue`]:
//!
//! ```
//! use ptyscribe::{CaptureConfig, TerminalWorker};
//! use std::time::Duration;
//!
//! let config = CaptureConfig {
//!     stability_window: Duration::ZERO,
//!     volatile_row_count: 0,
//!     ..CaptureConfig::default()
//! };
//! let worker = TerminalWorker::spawn(1, 120, config);
//! let queue = worker.events();
//! worker.feed(&b"hello\n"[..]).expect("worker running");
//! # std::thread::sleep(Duration::from_millis(200));
//! # assert_eq!(queue.drain().len(), 1);
//! worker.shutdown();
//! ```
//!
//! Embedders that already own an event loop can instead drive
//! [`TerminalModel`] directly and subscribe a [`CaptureListener`] (or their
//! own [`DamageListener`]).
//!
//! Spawning the child process, owning PTY file descriptors, and the
//! prompt/response session logic are deliberately out of scope; this crate
//! is the engine those layers sit on.

// Library modules
pub mod capture;
pub mod config;
pub mod error;
pub mod events;
pub mod screen;
pub mod terminal;
pub mod worker;

// Re-export commonly used types
pub use capture::{CaptureEngine, CaptureState, ChurnPolicy, DefaultChurnPolicy};
pub use config::CaptureConfig;
pub use error::CaptureError;
pub use events::{DamageEvent, EventKind, EventSource, TranscriptEvent, WireEvent, WireMeta};
pub use screen::{line_fingerprint, ScrollbackView};
pub use terminal::{DamageListener, TermSnapshot, TerminalModel};
pub use worker::{CaptureListener, TerminalWorker, TranscriptQueue, WorkerCommand};
