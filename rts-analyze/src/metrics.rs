/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Per-task timing metrics derived from an event log.
//!
//! Execution time pairs each `START` with the earliest unused `COMPLETE` at or
//! after it; response time does the same from each `RELEASE`.  Unpaired
//! anchors (a run cut off mid-instance) contribute no sample.

use rts_core::logger::EventKind;

use crate::parse::LogRecord;

/// Task names that are not jobs.
pub const NON_JOB_TASKS: [&str; 3] = ["WDT", "INFO", "Supervisor"];

#[derive(Debug, Clone, PartialEq)]
pub struct TaskMetrics {
    pub task: String,
    pub exec_samples: Vec<u64>,
    pub response_samples: Vec<u64>,
    pub release_count: usize,
    pub miss_count: usize,
    pub overrun_count: usize,
    pub lock_timeout_count: usize,
}

impl TaskMetrics {
    pub fn avg_exec_ms(&self) -> Option<f64> {
        mean(&self.exec_samples)
    }

    pub fn avg_response_ms(&self) -> Option<f64> {
        mean(&self.response_samples)
    }

    pub fn total_exec_ms(&self) -> u64 {
        self.exec_samples.iter().sum()
    }

    /// `misses / releases`, with a task that never released counted over 1.
    pub fn miss_ratio(&self) -> f64 {
        self.miss_count as f64 / self.release_count.max(1) as f64
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogMetrics {
    /// In order of first appearance in the log.
    pub tasks: Vec<TaskMetrics>,
    /// Mean gap between consecutive watchdog records.
    pub watchdog_interval_ms: Option<f64>,
}

impl LogMetrics {
    pub fn task(&self, name: &str) -> Option<&TaskMetrics> {
        self.tasks.iter().find(|t| t.task == name)
    }

    /// Mean of the per-task average response times, over tasks that have one.
    pub fn mean_response_ms(&self) -> Option<f64> {
        let per_task: Vec<f64> = self.tasks.iter().filter_map(TaskMetrics::avg_response_ms).collect();
        mean_f64(&per_task)
    }

    pub fn mean_miss_ratio(&self) -> Option<f64> {
        let per_task: Vec<f64> = self.tasks.iter().map(TaskMetrics::miss_ratio).collect();
        mean_f64(&per_task)
    }
}

pub fn analyze(records: &[LogRecord]) -> LogMetrics {
    let mut names: Vec<&str> = Vec::new();
    for r in records {
        if !NON_JOB_TASKS.contains(&r.task.as_str()) && !names.contains(&r.task.as_str()) {
            names.push(&r.task);
        }
    }

    LogMetrics {
        tasks: names.into_iter().map(|n| task_metrics(records, n)).collect(),
        watchdog_interval_ms: watchdog_interval(records),
    }
}

fn task_metrics(records: &[LogRecord], task: &str) -> TaskMetrics {
    let times = |kind: EventKind| -> Vec<u64> {
        let mut t: Vec<u64> = records
            .iter()
            .filter(|r| r.task == task && r.event == kind)
            .map(|r| r.time_ms)
            .collect();
        t.sort_unstable();
        t
    };
    let count = |kind: EventKind| records.iter().filter(|r| r.task == task && r.event == kind).count();

    let completes = times(EventKind::Complete);
    let releases = times(EventKind::Release);

    TaskMetrics {
        task: task.to_string(),
        exec_samples: pair_durations(&times(EventKind::Start), &completes),
        response_samples: pair_durations(&releases, &completes),
        release_count: releases.len(),
        miss_count: count(EventKind::Miss),
        overrun_count: count(EventKind::Overrun),
        lock_timeout_count: count(EventKind::LockTimeout),
    }
}

/// For each anchor, take the earliest not-yet-used end at or after it.
pub fn pair_durations(anchors: &[u64], ends: &[u64]) -> Vec<u64> {
    let mut used = vec![false; ends.len()];
    let mut out = Vec::with_capacity(anchors.len());
    for &a in anchors {
        if let Some(i) = (0..ends.len()).find(|&i| !used[i] && ends[i] >= a) {
            used[i] = true;
            out.push(ends[i] - a);
        }
    }
    out
}

/// Mean gap between `WDT` records in log order; `None` with fewer than two.
pub fn watchdog_interval(records: &[LogRecord]) -> Option<f64> {
    let times: Vec<i128> = records
        .iter()
        .filter(|r| r.task == "WDT")
        .map(|r| i128::from(r.time_ms))
        .collect();
    if times.len() < 2 {
        return None;
    }
    let gaps: i128 = times.windows(2).map(|w| w[1] - w[0]).sum();
    Some(gaps as f64 / (times.len() - 1) as f64)
}

fn mean(samples: &[u64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<u64>() as f64 / samples.len() as f64)
}

fn mean_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
