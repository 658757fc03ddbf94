//! Capture engine: terminal damage in, transcript events out.
//!
//! The engine is the stateful transformer at the heart of the pipeline. On
//! each damage notification it reads the scrollback view and emits the lines
//! that represent committed output, using two signals:
//!
//! 1. **History commits** (primary): a row that scrolled off the top of the
//!    normal buffer can never change again; it is emitted immediately.
//! 2. **Screen stability** (secondary): a row in the stable screen region
//!    that has not changed for the configured stability window is assumed
//!    final and emitted. This catches output that never scrolls (short
//!    responses, final screens).
//!
//! Spinner frames and progress bars are kept out by the churn filter
//! ([`churn`]); content-level dedup across both signals uses 64-bit FNV-1a
//! fingerprints so a line captured from the screen is not emitted again when
//! it later scrolls into history.
//!
//! # Empty-line policy
//!
//! Empty history lines are skipped entirely (no `"\n"` events). Paragraph
//! gaps in child output therefore collapse in the transcript; this matches
//! the behavior the pipeline is calibrated against.
//!
//! # Reactivity
//!
//! The engine owns no timers. Stability is measured against the monotonic
//! instant carried by each damage event, so rows advance through the window
//! only as damage notifications arrive - and tests can replay a timeline
//! deterministically.
//!
//! # Rust guideline compliant 2026-03

pub mod churn;

pub use churn::{ChurnPolicy, DefaultChurnPolicy};

use fnv::{FnvHashMap, FnvHashSet};
use std::time::Instant;

use crate::config::CaptureConfig;
use crate::error::CaptureError;
use crate::events::{DamageEvent, EventSource, TranscriptEvent};
use crate::screen::{line_fingerprint, ScrollbackView};
use crate::terminal::TermSnapshot;

/// Recent-sample ring size per tracked row.
///
/// Eight observations is enough for the rolling-distinct churn heuristic
/// (which needs six) without holding spinner frames alive for long.
const RECENT_SAMPLE_CAP: usize = 8;

/// Stability bookkeeping for one screen row.
#[derive(Debug)]
struct RowTrack {
    /// Last observed normalized content.
    content: String,
    /// Instant the current content was first observed.
    first_seen_at: Instant,
    /// Whether the current content already passed a stability evaluation.
    emitted: bool,
    /// Recently observed values, oldest first, for the churn filter.
    recent: Vec<String>,
}

impl RowTrack {
    fn new(content: String, now: Instant) -> Self {
        Self {
            recent: vec![content.clone()],
            content,
            first_seen_at: now,
            emitted: false,
        }
    }

    /// Record a content change: restart the stability clock.
    fn observe(&mut self, content: String, now: Instant) {
        if self.recent.len() == RECENT_SAMPLE_CAP {
            self.recent.remove(0);
        }
        self.recent.push(content.clone());
        self.content = content;
        self.first_seen_at = now;
        self.emitted = false;
    }
}

/// Observable engine state, exposed for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureState {
    /// Bumped on every full-redraw damage; invalidates row bookkeeping.
    pub epoch: u64,
    /// Next history line to consider for emission.
    pub last_emitted_history_index: usize,
    /// Number of screen rows currently tracked for stability.
    pub tracked_rows: usize,
    /// Number of distinct line fingerprints emitted so far.
    pub emitted_fingerprints: usize,
}

/// Stateful transformer from damage notifications to transcript events.
///
/// Purely reactive: call [`CaptureEngine::on_damage`] whenever the terminal
/// model reports a change. All state is owned by the engine and mutated only
/// there; the terminal worker serializes invocations.
pub struct CaptureEngine {
    config: CaptureConfig,
    policy: Box<dyn ChurnPolicy>,
    epoch: u64,
    last_emitted_history_index: usize,
    /// Per-row stability tracker for the current epoch. Cleared on epoch
    /// bump, which is how geometry changes reset stability cheaply.
    row_state: FnvHashMap<usize, RowTrack>,
    /// Content-level dedup across both signals.
    emitted_hashes: FnvHashSet<u64>,
    /// Fingerprint of the newest history line consumed so far. Used to
    /// realign the history cursor when the saturated history window slides
    /// instead of growing (see [`CaptureEngine::emit_history`]).
    history_tail_fingerprint: Option<u64>,
}

impl std::fmt::Debug for CaptureEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureEngine")
            .field("epoch", &self.epoch)
            .field("last_emitted_history_index", &self.last_emitted_history_index)
            .field("tracked_rows", &self.row_state.len())
            .field("emitted_fingerprints", &self.emitted_hashes.len())
            .finish_non_exhaustive()
    }
}

impl CaptureEngine {
    /// Create an engine with the default churn policy.
    #[must_use]
    pub fn new(config: CaptureConfig) -> Self {
        Self::with_churn_policy(config, Box::new(DefaultChurnPolicy))
    }

    /// Create an engine with a custom churn policy.
    #[must_use]
    pub fn with_churn_policy(config: CaptureConfig, policy: Box<dyn ChurnPolicy>) -> Self {
        Self {
            config,
            policy,
            epoch: 0,
            last_emitted_history_index: 0,
            row_state: FnvHashMap::default(),
            emitted_hashes: FnvHashSet::default(),
            history_tail_fingerprint: None,
        }
    }

    /// Current engine state for tests and diagnostics.
    #[must_use]
    pub fn current_state(&self) -> CaptureState {
        CaptureState {
            epoch: self.epoch,
            last_emitted_history_index: self.last_emitted_history_index,
            tracked_rows: self.row_state.len(),
            emitted_fingerprints: self.emitted_hashes.len(),
        }
    }

    /// React to one damage notification.
    ///
    /// Returns the transcript events committed by this invocation: history
    /// events first (oldest first), then screen-stability events in
    /// top-to-bottom row order.
    pub fn on_damage(
        &mut self,
        view: &ScrollbackView<'_>,
        snapshot: &TermSnapshot,
        damage: &DamageEvent,
    ) -> Result<Vec<TranscriptEvent>, CaptureError> {
        let mut events = Vec::new();

        // A full redraw (clear, buffer switch, resize) invalidates every
        // stability timer; the epoch bump records that for observers.
        if damage.full_redraw {
            self.epoch += 1;
            self.row_state.clear();
        }

        self.emit_history(view, &mut events)?;

        // While the child owns the alternate screen, rows repaint freely;
        // stability means nothing there. History emission above still ran.
        if snapshot.alternate_screen && self.config.suppress_alternate_screen {
            self.row_state.clear();
            return Ok(events);
        }

        self.emit_stable_rows(view, damage.at, &mut events)?;
        Ok(events)
    }

    /// Primary signal: emit history lines past the high-water mark.
    fn emit_history(
        &mut self,
        view: &ScrollbackView<'_>,
        events: &mut Vec<TranscriptEvent>,
    ) -> Result<(), CaptureError> {
        let count = view.history_line_count();
        // Clamp tolerates history truncation (e.g. the alternate buffer
        // reports an empty history).
        self.last_emitted_history_index = self.last_emitted_history_index.min(count);
        self.realign_after_eviction(view, count)?;
        if self.last_emitted_history_index == count {
            return Ok(());
        }
        let lines = view.read_history_lines(self.last_emitted_history_index, count)?;
        if let Some(last) = lines.last() {
            self.history_tail_fingerprint = Some(line_fingerprint(last));
        }
        for line in lines {
            // Empty-line policy: skip empty.
            if line.is_empty() {
                continue;
            }
            // History lines have no row identity, so no recent samples.
            if self.policy.should_suppress(&line, &[]) {
                log::debug!("churn filter suppressed history line: {line:?}");
                continue;
            }
            if self.emitted_hashes.insert(line_fingerprint(&line)) {
                events.push(TranscriptEvent::append(
                    format!("{line}\n"),
                    EventSource::History,
                ));
            }
        }
        self.last_emitted_history_index = count;
        Ok(())
    }

    /// Realign the history cursor when the window slid at capacity.
    ///
    /// Once history is saturated, the line count stays pinned at the bound
    /// while the oldest lines are evicted for new ones - the cursor would
    /// sit at `count` forever and new lines would never emit. When the
    /// cursor is caught up but the newest line no longer matches the last
    /// consumed fingerprint, the window has slid: walk back from the end to
    /// the last consumed line and resume after it. A nearer duplicate of
    /// the tail line can shorten the walk; the skipped lines are exactly
    /// the ones fingerprint dedup would have swallowed.
    fn realign_after_eviction(
        &mut self,
        view: &ScrollbackView<'_>,
        count: usize,
    ) -> Result<(), CaptureError> {
        if count == 0 || self.last_emitted_history_index != count {
            return Ok(());
        }
        let Some(tail) = self.history_tail_fingerprint else {
            return Ok(());
        };
        let newest = view.read_history_lines(count - 1, count)?;
        let Some(newest) = newest.first() else {
            return Ok(());
        };
        if line_fingerprint(newest) == tail {
            return Ok(());
        }
        let mut resume_at = 0;
        for i in (0..count - 1).rev() {
            let line = view.read_history_lines(i, i + 1)?;
            let Some(line) = line.first() else {
                break;
            };
            if line_fingerprint(line) == tail {
                resume_at = i + 1;
                break;
            }
        }
        log::debug!(
            "history window slid at capacity, resuming emission at {resume_at}/{count}"
        );
        self.last_emitted_history_index = resume_at;
        Ok(())
    }

    /// Secondary signal: emit screen rows that sat unchanged through the
    /// stability window, excluding the volatile bottom band.
    fn emit_stable_rows(
        &mut self,
        view: &ScrollbackView<'_>,
        now: Instant,
        events: &mut Vec<TranscriptEvent>,
    ) -> Result<(), CaptureError> {
        let screen_rows = view.screen_row_count();
        let stable_end = screen_rows.saturating_sub(self.config.volatile_row_count);

        for row in 0..stable_end {
            let content = view
                .read_screen_lines(row, row + 1)?
                .into_iter()
                .next()
                .unwrap_or_default();

            if let Some(track) = self.row_state.get_mut(&row) {
                if track.content != content {
                    track.observe(content, now);
                }
            } else {
                self.row_state.insert(row, RowTrack::new(content, now));
            }

            let Some(track) = self.row_state.get_mut(&row) else {
                continue;
            };
            if track.emitted
                || now.duration_since(track.first_seen_at) < self.config.stability_window
            {
                continue;
            }
            if !track.content.is_empty()
                && !self.policy.should_suppress(&track.content, &track.recent)
                && self.emitted_hashes.insert(line_fingerprint(&track.content))
            {
                events.push(TranscriptEvent::append(
                    format!("{}\n", track.content),
                    EventSource::ScreenStable,
                ));
            }
            // Evaluated once per content value, whether or not the churn
            // filter or dedup let it through.
            track.emitted = true;
        }

        // Geometry shrank: drop trackers for rows that no longer exist.
        self.row_state.retain(|&row, _| row < screen_rows);
        Ok(())
    }
}
