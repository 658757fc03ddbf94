//! Plain-text projection of terminal state.
//!
//! This module provides [`ScrollbackView`], the read-only view the capture
//! engine consumes during damage dispatch: history lines that scrolled off
//! the top of the screen (immutable) and the current screen rows (volatile).
//! All styling is discarded; every line is right-trimmed of the padding
//! emulators use for untouched cells.
//!
//! It also hosts [`line_fingerprint`], the 64-bit FNV-1a content hash used
//! for transcript dedup.
//!
//! # Performance
//!
//! Row extraction is on the hot path for capture. Lines are built with a
//! capacity hint from the column count, and wide-char spacer cells are
//! skipped rather than rendered.

// Rust guideline compliant 2026-03

use alacritty_terminal::grid::{Dimensions, Grid};
use alacritty_terminal::index::{Column, Line};
use alacritty_terminal::term::cell::{Cell, Flags};
use fnv::FnvHasher;
use std::hash::Hasher;

use crate::error::CaptureError;

/// Read-only projection of a terminal grid.
///
/// Borrowed from the terminal model for the duration of a damage dispatch;
/// the lifetime parameter prevents a listener from stashing the view past
/// the callback.
#[derive(Debug, Clone, Copy)]
pub struct ScrollbackView<'a> {
    grid: &'a Grid<Cell>,
}

impl<'a> ScrollbackView<'a> {
    /// Wrap a grid reference. Crate-internal: views are handed out by
    /// [`TerminalModel::scrollback`](crate::terminal::TerminalModel::scrollback).
    pub(crate) fn new(grid: &'a Grid<Cell>) -> Self {
        Self { grid }
    }

    /// Number of history lines (rows scrolled off the top of the screen).
    #[must_use]
    pub fn history_line_count(&self) -> usize {
        self.grid.history_size()
    }

    /// Number of screen rows (viewport height).
    #[must_use]
    pub fn screen_row_count(&self) -> usize {
        self.grid.screen_lines()
    }

    /// Plain-text history lines, oldest first.
    ///
    /// `start..end` indexes into `0..history_line_count()`; index 0 is the
    /// oldest stored line.
    pub fn read_history_lines(&self, start: usize, end: usize) -> Result<Vec<String>, CaptureError> {
        let count = self.history_line_count();
        if start > end || end > count {
            return Err(CaptureError::bad_range("history", start, end, count));
        }
        // Line(-count) is the oldest stored history line, Line(-1) the most
        // recent (one row above the viewport).
        Ok((start..end)
            .map(|i| self.row_text(Line(i as i32 - count as i32)))
            .collect())
    }

    /// Plain-text screen rows, top first.
    ///
    /// `start..end` indexes into `0..screen_row_count()`.
    pub fn read_screen_lines(&self, start: usize, end: usize) -> Result<Vec<String>, CaptureError> {
        let rows = self.screen_row_count();
        if start > end || end > rows {
            return Err(CaptureError::bad_range("screen", start, end, rows));
        }
        Ok((start..end).map(|i| self.row_text(Line(i as i32))).collect())
    }

    /// The whole visible screen as one string, rows joined with `\n`.
    ///
    /// Used by tests and by session-layer pattern detection; not part of the
    /// capture hot path.
    #[must_use]
    pub fn screen_text(&self) -> String {
        let rows = self.screen_row_count();
        let mut out = String::new();
        for row in 0..rows {
            if row > 0 {
                out.push('\n');
            }
            out.push_str(&self.row_text(Line(row as i32)));
        }
        out
    }

    /// Extract one grid row as normalized plain text.
    ///
    /// Walks the cells left to right, skipping wide-char continuation
    /// spacers (the base wide character was already emitted by the
    /// preceding cell) and appending zero-width combining characters after
    /// their base character. Styling is discarded.
    fn row_text(&self, line: Line) -> String {
        let cols = self.grid.columns();
        let mut out = String::with_capacity(cols);
        let row = &self.grid[line];
        for col in 0..cols {
            let cell = &row[Column(col)];
            if cell.flags.contains(Flags::WIDE_CHAR_SPACER) {
                continue;
            }
            out.push(cell.c);
            if let Some(zerowidth) = cell.zerowidth() {
                out.extend(zerowidth.iter().copied());
            }
        }
        normalize_line(&out).to_string()
    }
}

/// Right-trim the padding characters emulators leave in untouched cells:
/// ASCII space, horizontal tab, and NUL.
///
/// Indentation is content - the left side is never trimmed.
pub(crate) fn normalize_line(line: &str) -> &str {
    line.trim_end_matches(|c| matches!(c, ' ' | '\t' | '\0'))
}

/// 64-bit FNV-1a fingerprint of a normalized line.
///
/// Content-level dedup key shared by the history and screen-stability
/// signals. FNV-1a is fast, stable across platforms, and collision-safe
/// enough for a per-session dedup set; this is not a cryptographic hash.
#[must_use]
pub fn line_fingerprint(line: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(line.as_bytes());
    hasher.finish()
}
