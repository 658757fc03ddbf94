//! Terminal worker thread and transcript hand-off queue.
//!
//! The pipeline is single-threaded by design: exactly one execution context
//! (the terminal worker) owns the feed -> damage dispatch -> capture
//! sequence. The PTY reader runs elsewhere and hands byte chunks to the
//! worker over a channel; consumers of transcript events read from the
//! [`TranscriptQueue`] published by the worker.
//!
//! ```text
//! PTY reader ──WorkerCommand::Feed──▶ TerminalWorker
//!                                      ├── TerminalModel (feed, damage)
//!                                      └── CaptureListener
//!                                           ├── CaptureEngine (on_damage)
//!                                           └── TranscriptQueue ──▶ consumer
//! ```
//!
//! # Ordering
//!
//! Commands are processed in send order. Events produced by one damage
//! dispatch land in the queue as a contiguous run, history before screen,
//! before anything from the next dispatch.
//!
//! # Overflow
//!
//! The queue is bounded. When a consumer stops draining, the oldest event is
//! dropped to admit the newest and a dropped counter is incremented -
//! progress is preserved over completeness.
//!
//! # Rust guideline compliant 2026-03

use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::capture::CaptureEngine;
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::events::{DamageEvent, TranscriptEvent};
use crate::screen::ScrollbackView;
use crate::terminal::{DamageListener, TermSnapshot, TerminalModel};

/// Commands accepted by the terminal worker.
#[derive(Debug)]
pub enum WorkerCommand {
    /// Raw PTY bytes to feed into the terminal model.
    Feed(Bytes),
    /// Resize the terminal.
    Resize {
        /// New height in rows.
        rows: u16,
        /// New width in columns.
        cols: u16,
    },
    /// Stop the worker after draining already-queued commands.
    Shutdown,
}

// ── TranscriptQueue ───────────────────────────────────────────────────────────

#[derive(Debug)]
struct QueueInner {
    events: Mutex<VecDeque<TranscriptEvent>>,
    capacity: usize,
    dropped: AtomicU64,
}

/// Bounded hand-off queue between the terminal worker and the event
/// consumer.
///
/// Single producer (the worker), single consumer. Cloning the handle shares
/// the same queue.
#[derive(Debug, Clone)]
pub struct TranscriptQueue {
    inner: Arc<QueueInner>,
}

impl TranscriptQueue {
    /// Create a queue holding at most `capacity` events (floor of 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                events: Mutex::new(VecDeque::new()),
                capacity: capacity.max(1),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Append an event, dropping the oldest one if the queue is full.
    pub(crate) fn push(&self, event: TranscriptEvent) {
        let mut events = self
            .inner
            .events
            .lock()
            .expect("transcript queue lock poisoned");
        if events.len() == self.inner.capacity {
            events.pop_front();
            self.inner.dropped.fetch_add(1, Ordering::Relaxed);
            log::debug!("transcript queue full, dropped oldest event");
        }
        events.push_back(event);
    }

    /// Remove and return all queued events in emission order.
    #[must_use]
    pub fn drain(&self) -> Vec<TranscriptEvent> {
        let mut events = self
            .inner
            .events
            .lock()
            .expect("transcript queue lock poisoned");
        events.drain(..).collect()
    }

    /// Number of events currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .events
            .lock()
            .expect("transcript queue lock poisoned")
            .len()
    }

    /// True when no events are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of events dropped to overflow since creation.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }
}

// ── CaptureListener ───────────────────────────────────────────────────────────

/// Damage listener that runs the capture engine and publishes its events.
///
/// This is the glue registered on the terminal model by the worker; it can
/// also be subscribed manually when embedding the pipeline without the
/// worker thread.
pub struct CaptureListener {
    engine: CaptureEngine,
    queue: TranscriptQueue,
}

impl std::fmt::Debug for CaptureListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureListener")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl CaptureListener {
    /// Bridge `engine` output into `queue`.
    #[must_use]
    pub fn new(engine: CaptureEngine, queue: TranscriptQueue) -> Self {
        Self { engine, queue }
    }
}

impl DamageListener for CaptureListener {
    fn on_damage(
        &mut self,
        view: &ScrollbackView<'_>,
        snapshot: &TermSnapshot,
        damage: &DamageEvent,
    ) -> Result<(), CaptureError> {
        for event in self.engine.on_damage(view, snapshot, damage)? {
            self.queue.push(event);
        }
        Ok(())
    }
}

// ── TerminalWorker ────────────────────────────────────────────────────────────

/// Handle to the terminal worker thread.
///
/// Spawns a dedicated thread owning the terminal model and capture engine.
/// Dropping the handle shuts the worker down; in-flight commands are
/// processed first, after which no more events are produced.
#[derive(Debug)]
pub struct TerminalWorker {
    commands: Sender<WorkerCommand>,
    queue: TranscriptQueue,
    handle: Option<thread::JoinHandle<()>>,
}

impl TerminalWorker {
    /// Start a worker with the given initial geometry.
    #[must_use]
    pub fn spawn(rows: u16, cols: u16, config: CaptureConfig) -> Self {
        let queue = TranscriptQueue::new(config.max_queued_events);
        let worker_queue = queue.clone();
        let (commands, rx) = mpsc::channel::<WorkerCommand>();

        let handle = thread::Builder::new()
            .name("terminal-worker".to_string())
            .spawn(move || {
                let mut model = TerminalModel::new(rows, cols, config.max_history);
                let engine = CaptureEngine::new(config);
                model.subscribe(Box::new(CaptureListener::new(engine, worker_queue)));
                log::info!("terminal worker started ({rows}x{cols})");
                while let Ok(command) = rx.recv() {
                    match command {
                        WorkerCommand::Feed(bytes) => model.feed(&bytes),
                        WorkerCommand::Resize { rows, cols } => {
                            if let Err(e) = model.resize(rows, cols) {
                                log::warn!("resize to {rows}x{cols} rejected: {e}");
                            }
                        }
                        WorkerCommand::Shutdown => break,
                    }
                }
                log::info!("terminal worker stopped");
            })
            .expect("spawn terminal worker thread");

        Self {
            commands,
            queue,
            handle: Some(handle),
        }
    }

    /// Queue PTY bytes for the worker.
    pub fn feed(&self, bytes: impl Into<Bytes>) -> Result<(), CaptureError> {
        self.send(WorkerCommand::Feed(bytes.into()))
    }

    /// Queue a resize for the worker.
    pub fn resize(&self, rows: u16, cols: u16) -> Result<(), CaptureError> {
        self.send(WorkerCommand::Resize { rows, cols })
    }

    /// Handle to the transcript queue the worker publishes into.
    #[must_use]
    pub fn events(&self) -> TranscriptQueue {
        self.queue.clone()
    }

    /// Stop the worker and join its thread. Queued commands are processed
    /// before the worker exits.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn send(&self, command: WorkerCommand) -> Result<(), CaptureError> {
        if self.commands.send(command).is_err() {
            return Err(CaptureError::Disconnected);
        }
        Ok(())
    }

    fn stop(&mut self) {
        if self.handle.is_some() {
            // Best effort - the worker may already have exited.
            if self.commands.send(WorkerCommand::Shutdown).is_err() {
                log::debug!("terminal worker already stopped");
            }
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("terminal worker thread panicked");
            }
        }
    }
}

impl Drop for TerminalWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
