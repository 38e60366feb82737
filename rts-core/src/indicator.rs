/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-job boolean status outputs.
//!
//! On the board each job drives one LED while it is running.  Which output
//! maps to which pin is board configuration; this module only defines the
//! [`StatusIndicator`] seam and a bank that mirrors the jobs' `running` flags
//! onto up to three indicators.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::job::Job;

/// Maximum indicators in a bank, one per job.
pub const MAX_INDICATORS: usize = 3;

/// A single on/off output.
pub trait StatusIndicator: Send + Sync {
    fn set(&self, on: bool);
}

/// Indicator for hosts without LEDs: reports edges as `tracing` events.
#[derive(Debug)]
pub struct TracingIndicator {
    label: String,
    lit: AtomicBool,
}

impl TracingIndicator {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            lit: AtomicBool::new(false),
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit.load(Ordering::Relaxed)
    }
}

impl StatusIndicator for TracingIndicator {
    fn set(&self, on: bool) {
        if self.lit.swap(on, Ordering::Relaxed) != on {
            debug!(indicator = %self.label, on, "status indicator");
        }
    }
}

/// Up to [`MAX_INDICATORS`] indicators, index-aligned with a job list.
#[derive(Default)]
pub struct IndicatorBank {
    outputs: Vec<Box<dyn StatusIndicator>>,
}

impl IndicatorBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an output; ignored (returns `false`) once the bank is full.
    pub fn push(&mut self, indicator: Box<dyn StatusIndicator>) -> bool {
        if self.outputs.len() >= MAX_INDICATORS {
            return false;
        }
        self.outputs.push(indicator);
        true
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Drive indicator `i` from `jobs[i].is_running()`.
    pub fn refresh<S>(&self, jobs: &[&Job<S>]) {
        for (out, job) in self.outputs.iter().zip(jobs) {
            out.set(job.is_running());
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobSpec;
    use std::sync::Arc;

    /// Records the last value so the test can read it back.
    struct Probe(Arc<AtomicBool>);

    impl StatusIndicator for Probe {
        fn set(&self, on: bool) {
            self.0.store(on, Ordering::Relaxed);
        }
    }

    #[test]
    fn bank_mirrors_running_flags() {
        let probes: Vec<_> = (0..3).map(|_| Arc::new(AtomicBool::new(false))).collect();
        let mut bank = IndicatorBank::new();
        for p in &probes {
            assert!(bank.push(Box::new(Probe(Arc::clone(p)))));
        }

        let jobs: Vec<Job> = ["Task1", "Task2", "Task3"]
            .iter()
            .map(|n| Job::new(JobSpec::new(*n, 100).unwrap(), 0).unwrap())
            .collect();
        jobs[1].release(0);
        jobs[1].begin_execution(0).unwrap();

        let refs: Vec<&Job> = jobs.iter().collect();
        bank.refresh(&refs);
        let lit: Vec<bool> = probes.iter().map(|p| p.load(Ordering::Relaxed)).collect();
        assert_eq!(lit, vec![false, true, false]);

        jobs[1].end_execution(5).unwrap();
        bank.refresh(&refs);
        assert!(!probes[1].load(Ordering::Relaxed));
    }

    #[test]
    fn bank_holds_at_most_three() {
        let mut bank = IndicatorBank::new();
        for i in 0..MAX_INDICATORS {
            assert!(bank.push(Box::new(TracingIndicator::new(format!("LED{i}")))));
        }
        assert!(!bank.push(Box::new(TracingIndicator::new("extra"))));
        assert_eq!(bank.len(), MAX_INDICATORS);
    }

    #[test]
    fn tracing_indicator_tracks_state() {
        let led = TracingIndicator::new("LED1");
        led.set(true);
        assert!(led.is_lit());
        led.set(false);
        assert!(!led.is_lit());
    }
}
