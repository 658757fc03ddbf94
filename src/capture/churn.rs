//! Churn suppression heuristics.
//!
//! Interactive CLIs repaint spinners, progress bars, and status lines many
//! times per second. Those rows are visual noise: they describe the program's
//! mood, not its output. The churn filter decides, per candidate line,
//! whether it looks like animation residue and should be kept out of the
//! transcript.
//!
//! The default policy is a set of plain byte/char scans - no regex, no
//! locale-dependent case mapping (ASCII case folding only). Alternative
//! policies can be installed via
//! [`CaptureEngine::with_churn_policy`](crate::capture::CaptureEngine::with_churn_policy);
//! they must be pure functions of their inputs.

// Rust guideline compliant 2026-03

use std::collections::HashSet;

/// Pluggable suppression decision.
///
/// `recent_samples` is the sequence of recently observed values for the same
/// screen row, oldest first. It may be empty (history lines have no row
/// identity) and is only consulted by the rolling-distinct heuristic.
pub trait ChurnPolicy: Send {
    /// True when `text` should be kept out of the transcript.
    fn should_suppress(&self, text: &str, recent_samples: &[String]) -> bool;
}

/// The built-in heuristics, in check order:
///
/// 1. **Spinner glyph** - a lone `| / \ - * .` or Braille spinner frame, or
///    up to three dots.
/// 2. **Trailing spinner** - `Compiling /`-style lines: letters and spaces
///    followed by a spinner glyph.
/// 3. **Progress bar** - a `[===>   ]` gauge or a line ending in a percent
///    figure.
/// 4. **Status prefix** - `Loading...` / `Thinking...`-style status lines.
/// 5. **High-churn short lines** - a short row whose recent values keep
///    flipping between many distinct strings.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultChurnPolicy;

impl ChurnPolicy for DefaultChurnPolicy {
    fn should_suppress(&self, text: &str, recent_samples: &[String]) -> bool {
        is_spinner_frame(text)
            || has_trailing_spinner(text)
            || is_progress_bar(text)
            || is_status_line(text)
            || is_high_churn(text, recent_samples)
    }
}

/// ASCII spinner glyphs plus the Braille patterns block used by braille
/// spinners (U+2800..U+28FF).
fn is_spinner_glyph(c: char) -> bool {
    matches!(c, '|' | '/' | '\\' | '-' | '*' | '.') || ('\u{2800}'..='\u{28FF}').contains(&c)
}

/// Heuristic 1: the whole line is a spinner frame.
fn is_spinner_frame(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    let mut chars = text.chars();
    if let (Some(only), None) = (chars.next(), chars.next()) {
        if is_spinner_glyph(only) {
            return true;
        }
    }
    // "." ".." "..." ellipsis animations.
    text.chars().count() <= 3 && text.chars().all(|c| c == '.')
}

/// Heuristic 2: a word or phrase followed by a spinner glyph, e.g.
/// `Compiling /` or `spinner |`.
fn has_trailing_spinner(text: &str) -> bool {
    if text.chars().count() < 3 {
        return false;
    }
    let Some(last) = text.chars().last() else {
        return false;
    };
    if !is_spinner_glyph(last) {
        return false;
    }
    let prefix: String = {
        let mut chars: Vec<char> = text.chars().collect();
        chars.pop();
        chars.into_iter().collect()
    };
    prefix.chars().any(|c| c.is_ascii_alphabetic())
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == ' ')
}

/// Heuristic 3: a bracketed gauge of fill characters, or a trailing percent
/// figure.
fn is_progress_bar(text: &str) -> bool {
    if ends_with_percent(text) {
        return true;
    }
    let chars: Vec<char> = text.chars().collect();
    for (open, &c) in chars.iter().enumerate() {
        if c != '[' {
            continue;
        }
        let Some(close_offset) = chars[open + 1..].iter().position(|&c| c == ']') else {
            // No closing bracket anywhere to the right; later opens won't
            // find one either.
            break;
        };
        let interior = &chars[open + 1..open + 1 + close_offset];
        if interior.len() >= 10 {
            // One non-fill character is tolerated (a moving marker such as
            // a percentage digit inside the gauge).
            let misfits = interior
                .iter()
                .filter(|&&c| !matches!(c, '=' | '-' | '#' | '>' | ' '))
                .count();
            if misfits <= 1 {
                return true;
            }
        }
    }
    false
}

/// `... 50%` / `100%` endings.
fn ends_with_percent(text: &str) -> bool {
    let mut chars = text.chars().rev();
    chars.next() == Some('%') && chars.next().is_some_and(|c| c.is_ascii_digit())
}

/// Heuristic 4: `Loading...`-style status lines.
fn is_status_line(text: &str) -> bool {
    const STATUS_PREFIXES: [&str; 5] = ["loading", "thinking", "working", "waiting", "analyzing"];
    if !text.ends_with("...") {
        return false;
    }
    let lowered = text.to_ascii_lowercase();
    STATUS_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
}

/// Heuristic 5: a short row whose recent observations keep flipping.
///
/// Collapses consecutive duplicate samples, then counts distinct values in
/// the reduced sequence. Five or more distinct values across at least six
/// raw samples means the row is animating, not printing.
fn is_high_churn(text: &str, recent_samples: &[String]) -> bool {
    if recent_samples.len() < 6 || text.chars().count() > 40 {
        return false;
    }
    let mut reduced: Vec<&str> = Vec::with_capacity(recent_samples.len());
    for sample in recent_samples {
        if reduced.last() != Some(&sample.as_str()) {
            reduced.push(sample);
        }
    }
    let distinct: HashSet<&str> = reduced.into_iter().collect();
    distinct.len() >= 5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suppressed(text: &str) -> bool {
        DefaultChurnPolicy.should_suppress(text, &[])
    }

    #[test]
    fn lone_spinner_glyphs_are_suppressed() {
        for frame in ["|", "/", "\\", "-", "*", ".", "\u{280b}"] {
            assert!(suppressed(frame), "expected {frame:?} suppressed");
        }
    }

    #[test]
    fn short_ellipsis_is_suppressed() {
        assert!(suppressed(".."));
        assert!(suppressed("..."));
        assert!(!suppressed("...."), "four dots is content");
    }

    #[test]
    fn ordinary_single_chars_are_kept() {
        assert!(!suppressed("x"));
        assert!(!suppressed("0"));
    }

    #[test]
    fn trailing_spinner_after_words_is_suppressed() {
        assert!(suppressed("Compiling /"));
        assert!(suppressed("spinner |"));
        assert!(suppressed("fetching deps \u{2819}"));
    }

    #[test]
    fn trailing_spinner_requires_clean_prefix() {
        // Digits or punctuation in the prefix mean this is real output.
        assert!(!suppressed("progress 3/"));
        assert!(!suppressed("a+b=c-"));
        assert!(!suppressed("v1.2-"));
    }

    #[test]
    fn bar_gauges_are_suppressed() {
        assert!(suppressed("[==========          ]"));
        assert!(suppressed("[=========>          ] building"));
        assert!(suppressed("[####------]"));
    }

    #[test]
    fn gauge_tolerates_one_misfit_char() {
        assert!(suppressed("[=====5====>]"));
        assert!(!suppressed("[==ab=cd==ef]"), "too many misfits");
    }

    #[test]
    fn short_brackets_are_content() {
        assert!(!suppressed("[ok]"));
        assert!(!suppressed("array[10] = 3"));
    }

    #[test]
    fn percent_endings_are_suppressed() {
        assert!(suppressed("downloading 50%"));
        assert!(suppressed("100%"));
        assert!(!suppressed("discount %"), "bare percent is content");
        assert!(!suppressed("50% done"), "percent mid-line is content");
    }

    #[test]
    fn status_lines_are_suppressed_case_insensitively() {
        assert!(suppressed("Loading..."));
        assert!(suppressed("THINKING..."));
        assert!(suppressed("waiting for response..."));
    }

    #[test]
    fn status_words_without_ellipsis_are_content() {
        assert!(!suppressed("loading"));
        assert!(!suppressed("working set size: 42"));
        assert!(!suppressed("reloading..."), "prefix must match at start");
    }

    #[test]
    fn flickering_short_rows_are_suppressed() {
        let samples: Vec<String> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert!(DefaultChurnPolicy.should_suppress("g", &samples));
    }

    #[test]
    fn stable_repeats_are_not_high_churn() {
        // Run-length reduction collapses the repeats to two distinct values.
        let samples: Vec<String> = ["a", "a", "a", "b", "b", "a"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert!(!DefaultChurnPolicy.should_suppress("a", &samples));
    }

    #[test]
    fn high_churn_needs_enough_samples() {
        let samples: Vec<String> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert!(!DefaultChurnPolicy.should_suppress("f", &samples));
    }

    #[test]
    fn long_lines_are_never_high_churn() {
        let samples: Vec<String> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let long_line = "x".repeat(41);
        assert!(!DefaultChurnPolicy.should_suppress(&long_line, &samples));
    }
}
