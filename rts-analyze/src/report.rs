/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Plain-text rendering of analysis results.

use std::fmt::Write;

use crate::metrics::LogMetrics;

fn opt(v: Option<f64>, precision: usize) -> String {
    match v {
        Some(x) => format!("{x:.precision$}"),
        None => "-".to_string(),
    }
}

/// Metrics table for one log.
pub fn render_metrics(label: &str, m: &LogMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "===== {label} METRICS =====");
    let _ = writeln!(
        out,
        "{:<12} {:>10} {:>10} {:>8} {:>12} {:>9} {:>9} {:>9}",
        "task", "avg_exec", "avg_resp", "miss", "total_exec", "releases", "overruns", "lock_to"
    );
    for t in &m.tasks {
        let _ = writeln!(
            out,
            "{:<12} {:>10} {:>10} {:>8.3} {:>12} {:>9} {:>9} {:>9}",
            t.task,
            opt(t.avg_exec_ms(), 2),
            opt(t.avg_response_ms(), 2),
            t.miss_ratio(),
            t.total_exec_ms(),
            t.release_count,
            t.overrun_count,
            t.lock_timeout_count,
        );
    }
    let _ = writeln!(
        out,
        "{label} watchdog avg interval: {} ms",
        opt(m.watchdog_interval_ms, 2)
    );
    out
}

/// Which of two logs responds faster and misses fewer deadlines.
pub fn render_comparison(a: (&str, &LogMetrics), b: (&str, &LogMetrics)) -> String {
    let (la, ma) = a;
    let (lb, mb) = b;
    let mut out = String::from("===== COMPARISON SUMMARY =====\n");

    match (ma.mean_response_ms(), mb.mean_response_ms()) {
        (Some(ra), Some(rb)) => {
            let (win, wv, lose, lv) = if ra < rb { (la, ra, lb, rb) } else { (lb, rb, la, ra) };
            let _ = writeln!(
                out,
                "{win} shows better average response time ({wv:.2} ms) vs {lose} ({lv:.2} ms)."
            );
        }
        _ => out.push_str("Unable to compare mean response times (missing data).\n"),
    }

    match (ma.mean_miss_ratio(), mb.mean_miss_ratio()) {
        (Some(xa), Some(xb)) => {
            let (win, wv, lose, lv) = if xa < xb { (la, xa, lb, xb) } else { (lb, xb, la, xa) };
            let _ = writeln!(
                out,
                "{win} is more deadline-tolerant (miss ratio {wv:.3} vs {lose} {lv:.3})."
            );
        }
        _ => out.push_str("Unable to compare miss ratios (missing data).\n"),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::analyze;
    use crate::parse::parse_str;

    const FAST: &str = "0,RELEASE,Task1,ok\n1,START,Task1,ok\n4,COMPLETE,Task1,exec_3ms\n";
    const SLOW: &str = "0,RELEASE,Task1,ok\n5,START,Task1,ok\n20,COMPLETE,Task1,exec_15ms\n20,MISS,Task1,late_5ms\n";

    #[test]
    fn metrics_table_lists_each_task() {
        let text = render_metrics("EDF", &analyze(&parse_str(FAST)));
        assert!(text.starts_with("===== EDF METRICS ====="));
        let row = text.lines().find(|l| l.starts_with("Task1")).unwrap();
        assert!(row.contains("3.00"));
        assert!(row.contains("4.00"));
        assert!(text.contains("watchdog avg interval: - ms"));
    }

    #[test]
    fn comparison_names_the_better_log() {
        let fast = analyze(&parse_str(FAST));
        let slow = analyze(&parse_str(SLOW));
        let text = render_comparison(("RM", &slow), ("EDF", &fast));
        assert!(text.contains("EDF shows better average response time (4.00 ms) vs RM (20.00 ms)."));
        assert!(text.contains("EDF is more deadline-tolerant (miss ratio 0.000 vs RM 1.000)."));
    }

    #[test]
    fn comparison_reports_missing_data() {
        let empty = analyze(&[]);
        let fast = analyze(&parse_str(FAST));
        let text = render_comparison(("A", &empty), ("B", &fast));
        assert!(text.contains("Unable to compare mean response times"));
        assert!(text.contains("Unable to compare miss ratios"));
    }
}
