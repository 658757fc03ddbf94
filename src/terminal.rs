//! Terminal-state model wrapping [`alacritty_terminal`].
//!
//! Provides [`TerminalModel`] - a wrapper around [`Term`] and [`Processor`]
//! that consumes raw PTY bytes, maintains the screen grid plus scrollback
//! history, and fires one [`DamageEvent`] per feed so the capture engine
//! knows when to re-read the view.
//!
//! # Architecture
//!
//! ```text
//! TerminalModel
//!  ├── term: Term<NoopListener>   (alacritty grid, cursor, modes, history)
//!  ├── processor: Processor       (VTE state machine - feeds bytes into term)
//!  └── listeners: Vec<Box<dyn DamageListener>>  (notified after each feed)
//! ```
//!
//! The VTE state machine buffers partial escape sequences internally, so a
//! sequence split across `feed` calls parses identically to one delivered in
//! a single chunk. Malformed sequences are logged by the emulator at debug
//! level and the scanner resynchronizes; nothing is surfaced to callers.
//!
//! # Thread Safety
//!
//! `TerminalModel` is `Send` but not `Sync`: exactly one execution context
//! (the terminal worker) owns the feed -> dispatch -> capture sequence. Views
//! and snapshots handed to listeners are read-only and cannot outlive the
//! dispatch callback.
//!
//! # Rust guideline compliant 2026-03

use alacritty_terminal::event::EventListener;
use alacritty_terminal::grid::Dimensions;
use alacritty_terminal::term::{Config, Term, TermDamage, TermMode};
use alacritty_terminal::vte::ansi::Processor;
use std::cell::RefCell;
use std::time::Instant;

use crate::error::CaptureError;
use crate::events::DamageEvent;
use crate::screen::ScrollbackView;

// ── Constants ─────────────────────────────────────────────────────────────────

/// Minimum rows clamped on construction.
///
/// alacritty_terminal is robust at 1 row; the floor exists so a zero-sized
/// construction request cannot produce an empty grid.
pub const MIN_ROWS: u16 = 1;

/// Minimum columns clamped on construction.
pub const MIN_COLS: u16 = 1;

// ── Dimensions helper ─────────────────────────────────────────────────────────

/// Minimal [`Dimensions`] implementor for constructing and resizing a [`Term`].
///
/// `Term::new` and `Term::resize` require `&D: Dimensions`. This struct
/// satisfies that bound without pulling in alacritty's full `SizeInfo`.
#[derive(Debug, Clone, Copy)]
struct TermSize {
    columns: usize,
    screen_lines: usize,
}

impl Dimensions for TermSize {
    fn columns(&self) -> usize {
        self.columns
    }

    fn screen_lines(&self) -> usize {
        self.screen_lines
    }

    fn total_lines(&self) -> usize {
        // For construction/resize purposes the viewport height is sufficient;
        // scrollback grows dynamically via Config::scrolling_history.
        self.screen_lines
    }
}

// ── Event listener ────────────────────────────────────────────────────────────

/// No-op alacritty event listener.
///
/// Title changes, bell, and PTY-write requests from the emulator are not part
/// of the capture pipeline; damage notification happens through
/// [`DamageListener`] instead.
#[derive(Debug, Clone, Copy)]
pub struct NoopListener;

impl EventListener for NoopListener {
    fn send_event(&self, _event: alacritty_terminal::event::Event) {}
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Immutable summary of terminal state at a point in time.
///
/// Handed to damage listeners alongside the view; cheap to copy.
#[derive(Debug, Clone, Copy)]
pub struct TermSnapshot {
    /// Screen height in rows.
    pub rows: u16,
    /// Screen width in columns.
    pub cols: u16,
    /// Cursor row within `[0, rows)`.
    pub cursor_row: u16,
    /// Cursor column within `[0, cols)`.
    pub cursor_col: u16,
    /// True while the child has the alternate screen buffer active.
    pub alternate_screen: bool,
    /// Monotonic instant the snapshot was taken.
    pub taken_at: Instant,
}

// ── Damage listener ───────────────────────────────────────────────────────────

/// Observer notified after each terminal state change.
///
/// Listeners run synchronously on the terminal worker during `feed` and
/// `resize`, in registration order. The view and snapshot must be consumed
/// inside the callback. A listener returning an error is logged and the
/// remaining listeners still run. Listeners must not call back into the
/// model that is dispatching to them.
pub trait DamageListener: Send {
    /// React to a damage notification.
    fn on_damage(
        &mut self,
        view: &ScrollbackView<'_>,
        snapshot: &TermSnapshot,
        damage: &DamageEvent,
    ) -> Result<(), CaptureError>;
}

// ── TerminalModel ─────────────────────────────────────────────────────────────

/// Terminal emulator state plus damage notification.
///
/// `Term` has no direct byte-ingestion method - bytes must be driven through
/// a [`Processor`] state machine. This wrapper bundles both, tracks the
/// alternate-screen flag across feeds, and converts alacritty's damage
/// tracking into one [`DamageEvent`] per feed.
pub struct TerminalModel {
    term: Term<NoopListener>,
    processor: Processor,
    /// RefCell so dispatch can hand out a view borrowing `term` while
    /// mutably iterating the listener set.
    listeners: RefCell<Vec<Box<dyn DamageListener>>>,
    /// Alt-screen flag as of the previous feed; a toggle forces full redraw.
    was_alt: bool,
}

impl std::fmt::Debug for TerminalModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // M-PUBLIC-DEBUG: custom impl avoids leaking Term internals.
        f.debug_struct("TerminalModel")
            .field("rows", &self.term.grid().screen_lines())
            .field("cols", &self.term.grid().columns())
            .field("history_size", &self.history_size())
            .field("alternate_screen", &self.was_alt)
            .finish_non_exhaustive()
    }
}

impl TerminalModel {
    /// Create a model with the given geometry and scrollback bound.
    ///
    /// Dimensions are clamped to a floor of 1. `max_history` bounds the
    /// scrollback; oldest lines are evicted once it is reached. The
    /// alternate buffer never commits scrolled rows to history.
    #[must_use]
    pub fn new(rows: u16, cols: u16, max_history: usize) -> Self {
        let size = TermSize {
            columns: cols.max(MIN_COLS) as usize,
            screen_lines: rows.max(MIN_ROWS) as usize,
        };
        let config = Config {
            scrolling_history: max_history,
            ..Config::default()
        };
        let term = Term::new(config, &size, NoopListener);
        Self {
            term,
            processor: Processor::new(),
            listeners: RefCell::new(Vec::new()),
            was_alt: false,
        }
    }

    /// Register a damage listener. Delivery order is registration order.
    pub fn subscribe(&mut self, listener: Box<dyn DamageListener>) {
        self.listeners.get_mut().push(listener);
    }

    /// Feed raw PTY bytes into the emulator.
    ///
    /// Hot path - bytes from the PTY reader arrive here and update the grid,
    /// cursor, and mode state. Arbitrary chunking is tolerated: partial
    /// escape sequences are buffered by the VTE state machine until the next
    /// feed completes them. After processing, exactly one damage event
    /// summarizing the changed region is dispatched to listeners.
    pub fn feed(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let at = Instant::now();
        self.processor.advance(&mut self.term, bytes);
        let alt = self.is_alt_screen();
        let buffer_switched = alt != self.was_alt;
        self.was_alt = alt;
        let damage = self.take_damage(at, buffer_switched);
        self.dispatch(&damage);
    }

    /// Resize the terminal to new dimensions.
    ///
    /// A no-op when the geometry is unchanged. Otherwise the grid reflows,
    /// the cursor is clamped, and a `full_redraw` damage event is
    /// dispatched.
    pub fn resize(&mut self, rows: u16, cols: u16) -> Result<(), CaptureError> {
        if rows == 0 || cols == 0 {
            return Err(CaptureError::InvalidArgument(format!(
                "terminal dimensions must be positive, got {rows}x{cols}"
            )));
        }
        let grid = self.term.grid();
        if grid.screen_lines() == rows as usize && grid.columns() == cols as usize {
            return Ok(());
        }
        let at = Instant::now();
        self.term.resize(TermSize {
            columns: cols as usize,
            screen_lines: rows as usize,
        });
        let damage = self.take_damage(at, true);
        self.dispatch(&damage);
        Ok(())
    }

    /// Immutable summary of the current terminal state.
    #[must_use]
    pub fn snapshot(&self) -> TermSnapshot {
        let grid = self.term.grid();
        let cursor = grid.cursor.point;
        TermSnapshot {
            rows: grid.screen_lines() as u16,
            cols: grid.columns() as u16,
            // Cursor line is always inside the viewport (non-negative).
            cursor_row: cursor.line.0.max(0) as u16,
            cursor_col: cursor.column.0 as u16,
            alternate_screen: self.is_alt_screen(),
            taken_at: Instant::now(),
        }
    }

    /// Read-only view of history lines and screen rows.
    #[must_use]
    pub fn scrollback(&self) -> ScrollbackView<'_> {
        ScrollbackView::new(self.term.grid())
    }

    /// Whether the child has the alternate screen buffer active.
    #[must_use]
    pub fn is_alt_screen(&self) -> bool {
        self.term.mode().contains(TermMode::ALT_SCREEN)
    }

    /// Whether the child has requested the cursor be hidden (`\x1b[?25l`).
    ///
    /// Exposed for the session layer to mirror modes; unused by capture.
    #[must_use]
    pub fn cursor_hidden(&self) -> bool {
        !self.term.mode().contains(TermMode::SHOW_CURSOR)
    }

    /// Total number of lines currently stored in scrollback history.
    #[must_use]
    pub fn history_size(&self) -> usize {
        self.term.grid().history_size()
    }

    /// Convert alacritty's damage tracking into one [`DamageEvent`] and
    /// reset it for the next feed.
    ///
    /// `force_full` is set for buffer switches and resizes, which must bump
    /// the capture epoch even when the emulator reports partial damage.
    fn take_damage(&mut self, at: Instant, force_full: bool) -> DamageEvent {
        let rows = self.term.grid().screen_lines();
        let mut full = force_full;
        let mut start = 0;
        let mut end = 0;
        match self.term.damage() {
            TermDamage::Full => full = true,
            TermDamage::Partial(lines) => {
                let mut min = usize::MAX;
                let mut max = 0;
                for bounds in lines {
                    min = min.min(bounds.line);
                    max = max.max(bounds.line + 1);
                }
                if min != usize::MAX {
                    start = min;
                    end = max.min(rows);
                }
            }
        }
        self.term.reset_damage();
        if full {
            start = 0;
            end = rows;
        }
        DamageEvent {
            at,
            changed_row_start: start,
            changed_row_end: end,
            full_redraw: full,
        }
    }

    /// Deliver a damage event to every listener in registration order.
    ///
    /// A failing listener is logged at warn and does not stop delivery to
    /// the listeners after it; the model's state is unaffected either way.
    fn dispatch(&self, damage: &DamageEvent) {
        let snapshot = self.snapshot();
        let view = self.scrollback();
        let mut listeners = self.listeners.borrow_mut();
        for listener in listeners.iter_mut() {
            if let Err(e) = listener.on_damage(&view, &snapshot, damage) {
                log::warn!("damage listener failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every damage delivery for assertions.
    struct RecordingListener {
        label: &'static str,
        log: Arc<Mutex<Vec<(&'static str, bool, usize, usize)>>>,
        fail: bool,
    }

    impl DamageListener for RecordingListener {
        fn on_damage(
            &mut self,
            _view: &ScrollbackView<'_>,
            _snapshot: &TermSnapshot,
            damage: &DamageEvent,
        ) -> Result<(), CaptureError> {
            self.log.lock().expect("log lock").push((
                self.label,
                damage.full_redraw,
                damage.changed_row_start,
                damage.changed_row_end,
            ));
            if self.fail {
                return Err(CaptureError::Dispatch("listener under test".into()));
            }
            Ok(())
        }
    }

    fn recorded(
        log: &Arc<Mutex<Vec<(&'static str, bool, usize, usize)>>>,
    ) -> Vec<(&'static str, bool, usize, usize)> {
        log.lock().expect("log lock").clone()
    }

    #[test]
    fn new_clamps_zero_dimensions() {
        let model = TerminalModel::new(0, 0, 100);
        let snapshot = model.snapshot();
        assert_eq!(snapshot.rows, MIN_ROWS);
        assert_eq!(snapshot.cols, MIN_COLS);
    }

    #[test]
    fn feed_writes_text_to_screen() {
        let mut model = TerminalModel::new(4, 40, 100);
        model.feed(b"Hello, World!");
        assert!(model.scrollback().screen_text().contains("Hello, World!"));
    }

    #[test]
    fn feed_fires_one_damage_per_call() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut model = TerminalModel::new(4, 40, 100);
        model.subscribe(Box::new(RecordingListener {
            label: "a",
            log: Arc::clone(&log),
            fail: false,
        }));
        model.feed(b"one");
        model.feed(b"two");
        assert_eq!(recorded(&log).len(), 2);
    }

    #[test]
    fn empty_feed_is_silent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut model = TerminalModel::new(4, 40, 100);
        model.subscribe(Box::new(RecordingListener {
            label: "a",
            log: Arc::clone(&log),
            fail: false,
        }));
        model.feed(b"");
        assert!(recorded(&log).is_empty());
    }

    #[test]
    fn listeners_run_in_registration_order_past_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut model = TerminalModel::new(4, 40, 100);
        model.subscribe(Box::new(RecordingListener {
            label: "first",
            log: Arc::clone(&log),
            fail: true,
        }));
        model.subscribe(Box::new(RecordingListener {
            label: "second",
            log: Arc::clone(&log),
            fail: false,
        }));
        model.feed(b"x");
        let labels: Vec<&str> = recorded(&log).iter().map(|e| e.0).collect();
        assert_eq!(labels, vec!["first", "second"]);
    }

    #[test]
    fn resize_updates_dimensions_and_fires_full_redraw() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut model = TerminalModel::new(24, 80, 100);
        model.subscribe(Box::new(RecordingListener {
            label: "a",
            log: Arc::clone(&log),
            fail: false,
        }));
        model.resize(30, 100).expect("valid resize");
        let snapshot = model.snapshot();
        assert_eq!((snapshot.rows, snapshot.cols), (30, 100));
        let events = recorded(&log);
        assert_eq!(events.len(), 1);
        // Full redraw spanning the new screen.
        assert_eq!(events[0], ("a", true, 0, 30));
    }

    #[test]
    fn resize_to_same_geometry_is_a_noop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut model = TerminalModel::new(24, 80, 100);
        model.subscribe(Box::new(RecordingListener {
            label: "a",
            log: Arc::clone(&log),
            fail: false,
        }));
        model.resize(24, 80).expect("same-size resize");
        assert!(recorded(&log).is_empty());
    }

    #[test]
    fn resize_rejects_zero_dimension() {
        let mut model = TerminalModel::new(24, 80, 100);
        assert!(matches!(
            model.resize(0, 80),
            Err(CaptureError::InvalidArgument(_))
        ));
        assert!(matches!(
            model.resize(24, 0),
            Err(CaptureError::InvalidArgument(_))
        ));
        // Geometry unchanged by the failed calls.
        assert_eq!(model.snapshot().rows, 24);
    }

    #[test]
    fn alt_screen_enter_and_exit_force_full_redraw() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut model = TerminalModel::new(4, 40, 100);
        model.subscribe(Box::new(RecordingListener {
            label: "a",
            log: Arc::clone(&log),
            fail: false,
        }));
        model.feed(b"\x1b[?1049h");
        assert!(model.is_alt_screen());
        model.feed(b"\x1b[?1049l");
        assert!(!model.is_alt_screen());
        let events = recorded(&log);
        assert_eq!(events.len(), 2);
        assert!(events[0].1, "alt-screen enter must be a full redraw");
        assert!(events[1].1, "alt-screen exit must be a full redraw");
    }

    #[test]
    fn escape_sequence_split_across_feeds_parses() {
        let mut model = TerminalModel::new(4, 40, 100);
        for byte in b"\x1b[?1049h" {
            model.feed(&[*byte]);
        }
        assert!(model.is_alt_screen());
    }

    #[test]
    fn lines_scrolled_off_the_top_land_in_history() {
        let mut model = TerminalModel::new(1, 40, 100);
        model.feed(b"gone\nvisible");
        assert_eq!(model.history_size(), 1);
        let view = model.scrollback();
        assert_eq!(
            view.read_history_lines(0, 1).expect("history read"),
            vec!["gone"]
        );
        assert_eq!(view.screen_text(), "visible");
    }

    #[test]
    fn alt_screen_discards_scrolled_rows() {
        let mut model = TerminalModel::new(2, 40, 100);
        model.feed(b"\x1b[?1049h");
        model.feed(b"one\r\ntwo\r\nthree\r\nfour\r\n");
        // Rows scrolled off the alternate buffer never reach history.
        assert_eq!(model.history_size(), 0);
        model.feed(b"\x1b[?1049l");
        assert_eq!(model.history_size(), 0);
    }

    #[test]
    fn cursor_hidden_tracks_dectcem() {
        let mut model = TerminalModel::new(4, 40, 100);
        assert!(!model.cursor_hidden());
        model.feed(b"\x1b[?25l");
        assert!(model.cursor_hidden());
        model.feed(b"\x1b[?25h");
        assert!(!model.cursor_hidden());
    }

    #[test]
    fn snapshot_reports_cursor_position() {
        let mut model = TerminalModel::new(4, 40, 100);
        model.feed(b"ab\r\ncd");
        let snapshot = model.snapshot();
        assert_eq!(snapshot.cursor_row, 1);
        assert_eq!(snapshot.cursor_col, 2);
        assert!(!snapshot.alternate_screen);
    }
}
