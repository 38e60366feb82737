/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Utilisation-based feasibility checks for a job set.
//!
//! The report is advisory: it is computed and logged at startup, and nothing
//! is rejected on its basis.  The demo lets jobs miss deadlines on purpose.
//!
//! # Theory
//! **Rate monotonic** (Liu & Layland, 1973): `n` independent periodic jobs
//! with implicit deadlines are guaranteed schedulable on one CPU under
//! fixed rate-monotonic priorities if
//!
//! $$U = \sum_{i=1}^{n} \frac{C_i}{T_i} \leq n \left(2^{1/n} - 1\right)$$
//!
//! | n | Bound |
//! |---|---|
//! | 1 | 1.000 |
//! | 2 | 0.828 |
//! | 3 | 0.780 |
//! | ∞ | ln(2) ≈ 0.693 |
//!
//! **EDF**: the density test `Σ C_i / D_i ≤ 1` is sufficient for
//! constrained deadlines and exact when every deadline equals its period.
//!
//! The hyperperiod (LCM of all periods) is the window after which the release
//! pattern repeats.

use thiserror::Error;

use super::JobSpec;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeasibilityError {
    #[error("no jobs to analyse")]
    NoJobs,

    #[error("hyperperiod overflow computing lcm({a}, {b})")]
    Overflow { a: u64, b: u64 },
}

/// Outcome of [`analyze`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibilityReport {
    pub job_count: usize,
    /// `Σ budget / period`.
    pub utilization: f64,
    /// Liu & Layland bound for `job_count` jobs.
    pub rm_bound: f64,
    /// `utilization ≤ rm_bound`.
    pub rm_guaranteed: bool,
    /// `Σ budget / relative deadline`.
    pub edf_density: f64,
    /// `edf_density ≤ 1`.
    pub edf_feasible: bool,
    pub hyperperiod_ms: u64,
}

/// `U_bound(n) = n × (2^(1/n) − 1)`; `0.0` for no jobs.
pub fn liu_layland_bound(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    nf * (2.0_f64.powf(1.0 / nf) - 1.0)
}

pub fn analyze(specs: &[JobSpec]) -> Result<FeasibilityReport, FeasibilityError> {
    if specs.is_empty() {
        return Err(FeasibilityError::NoJobs);
    }

    let utilization: f64 = specs.iter().map(JobSpec::utilization).sum();
    let edf_density: f64 = specs.iter().map(JobSpec::density).sum();
    let rm_bound = liu_layland_bound(specs.len());
    let periods: Vec<u64> = specs.iter().map(|s| u64::from(s.period_ms)).collect();

    Ok(FeasibilityReport {
        job_count: specs.len(),
        utilization,
        rm_bound,
        rm_guaranteed: utilization <= rm_bound,
        edf_density,
        edf_feasible: edf_density <= 1.0,
        hyperperiod_ms: lcm_of_slice(&periods)?,
    })
}

// ── GCD / LCM ─────────────────────────────────────────────────────────────────

/// Iterative Euclidean GCD.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Checked LCM; `Ok(0)` when either input is zero.
pub fn lcm(a: u64, b: u64) -> Result<u64, FeasibilityError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    (a / gcd(a, b))
        .checked_mul(b)
        .ok_or(FeasibilityError::Overflow { a, b })
}

pub fn lcm_of_slice(values: &[u64]) -> Result<u64, FeasibilityError> {
    values
        .iter()
        .try_fold(values.first().copied().unwrap_or(0), |acc, &v| lcm(acc, v))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(period_ms: u32, budget_ms: u32) -> JobSpec {
        JobSpec::new("t", period_ms).unwrap().with_budget(budget_ms)
    }

    #[test]
    fn bound_values() {
        assert_eq!(liu_layland_bound(0), 0.0);
        assert!((liu_layland_bound(1) - 1.0).abs() < 1e-10);
        assert!((liu_layland_bound(3) - 0.7798).abs() < 1e-3);
        assert!((liu_layland_bound(1000) - 2.0_f64.ln()).abs() < 1e-3);
    }

    #[test]
    fn demo_job_set_is_rm_schedulable() {
        // 100/20, 200/40, 300/60 → U = 0.6 ≤ 0.780
        let report = analyze(&[spec(100, 20), spec(200, 40), spec(300, 60)]).unwrap();
        assert!((report.utilization - 0.6).abs() < 1e-9);
        assert!(report.rm_guaranteed);
        assert!(report.edf_feasible);
        assert_eq!(report.hyperperiod_ms, 600);
    }

    #[test]
    fn between_rm_bound_and_one_only_edf_is_guaranteed() {
        // U = 0.9: above bound(2) = 0.828 but ≤ 1
        let report = analyze(&[spec(10, 5), spec(10, 4)]).unwrap();
        assert!(!report.rm_guaranteed);
        assert!(report.edf_feasible);
    }

    #[test]
    fn constrained_deadline_raises_density() {
        let tight = JobSpec::new("t", 100)
            .unwrap()
            .with_budget(60)
            .with_deadline(50)
            .unwrap();
        let report = analyze(&[tight]).unwrap();
        assert!((report.utilization - 0.6).abs() < 1e-9);
        assert!((report.edf_density - 1.2).abs() < 1e-9);
        assert!(!report.edf_feasible);
    }

    #[test]
    fn empty_set_is_an_error() {
        assert_eq!(analyze(&[]), Err(FeasibilityError::NoJobs));
    }

    #[test]
    fn gcd_and_lcm() {
        assert_eq!(gcd(12, 8), 4);
        assert_eq!(gcd(0, 5), 5);
        assert_eq!(lcm(4, 6).unwrap(), 12);
        assert_eq!(lcm(0, 6).unwrap(), 0);
        assert_eq!(lcm_of_slice(&[]).unwrap(), 0);
        assert_eq!(lcm_of_slice(&[100, 250, 40]).unwrap(), 1_000);
    }

    #[test]
    fn lcm_overflow_is_reported() {
        let a = u64::MAX / 2 + 1;
        let b = u64::MAX / 2 + 3;
        assert!(matches!(lcm(a, b), Err(FeasibilityError::Overflow { .. })));
    }
}
