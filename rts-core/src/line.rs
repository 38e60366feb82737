/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Fixed-capacity text lines for the event log and the status plot.
//!
//! Both outputs are formatted into a stack buffer with a hard upper bound.
//! Formatting never fails and never grows the buffer: once it is full the rest
//! of the text is dropped and the line is flagged as truncated, so callers and
//! tests can see the truncation instead of it being silent.

use core::fmt;

use heapless::String;

/// Characters in one event log line, excluding the terminator (128-byte buffer).
pub const EVENT_LINE_CAPACITY: usize = 127;

/// Characters in one plot line, excluding the terminator (64-byte buffer).
pub const PLOT_LINE_CAPACITY: usize = 63;

/// A formatted line of at most `N` bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundedLine<const N: usize> {
    text: String<N>,
    truncated: bool,
}

impl<const N: usize> BoundedLine<N> {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            truncated: false,
        }
    }

    /// Format `args` into a fresh line.
    pub fn format(args: fmt::Arguments<'_>) -> Self {
        let mut line = Self::new();
        // `write_str` below never reports an error.
        let _ = fmt::write(&mut line, args);
        line
    }

    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// `true` if some of the formatted text did not fit.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub const fn capacity() -> usize {
        N
    }
}

impl<const N: usize> fmt::Write for BoundedLine<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.truncated {
            return Ok(());
        }
        // Char by char so a multi-byte character is never split.
        for c in s.chars() {
            if self.text.push(c).is_err() {
                self.truncated = true;
                break;
            }
        }
        Ok(())
    }
}

impl<const N: usize> fmt::Display for BoundedLine<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type EventLine = BoundedLine<EVENT_LINE_CAPACITY>;
pub type PlotLine = BoundedLine<PLOT_LINE_CAPACITY>;

// ── Tests ─────────────────────────────────────────────────────────────────────
