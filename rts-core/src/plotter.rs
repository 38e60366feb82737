/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Three-channel status feed for a serial plotting tool.
//!
//! Every call emits exactly one line `v1 v2 v3`; nothing is buffered between
//! calls.  Lines are bounded by [`PLOT_LINE_CAPACITY`].

use std::io::Write;

use crate::job::Job;
use crate::line::{PlotLine, PLOT_LINE_CAPACITY};
use crate::sink::{LineWriter, SinkStats};

/// Number of channels in one plot line.
pub const PLOT_CHANNELS: usize = 3;

pub fn format_plot(v1: i32, v2: i32, v3: i32) -> PlotLine {
    PlotLine::format(format_args!("{v1} {v2} {v3}"))
}

pub struct StatusPlotter<W> {
    out: LineWriter<W>,
}

impl<W: Write> StatusPlotter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            out: LineWriter::new(sink),
        }
    }

    pub fn plot(&self, v1: i32, v2: i32, v3: i32) {
        let line = format_plot(v1, v2, v3);
        debug_assert!(line.len() <= PLOT_LINE_CAPACITY);
        self.out.emit(line.as_str(), line.truncated());
    }

    /// Plot the `running` flag of up to three jobs; missing channels read 0.
    pub fn plot_running<S>(&self, jobs: &[&Job<S>]) {
        let mut v = [0i32; PLOT_CHANNELS];
        for (slot, job) in v.iter_mut().zip(jobs) {
            *slot = i32::from(job.is_running());
        }
        self.plot(v[0], v[1], v[2]);
    }

    pub fn flush(&self) {
        self.out.flush();
    }

    pub fn stats(&self) -> SinkStats {
        self.out.stats()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
