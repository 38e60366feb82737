/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Static timing parameters of a periodic job.

use super::JobError;

/// Timing parameters fixed for the lifetime of a [`Job`](super::Job).
///
/// All values are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSpec {
    /// Human-readable identifier; used only in log records.
    pub name: String,

    /// Release period.  Must be non-zero.
    pub period_ms: u32,

    /// Relative deadline.  `None` means implicit (equal to the period).
    pub deadline_ms: Option<u32>,

    /// Delay of the first release after the job is created.
    pub offset_ms: u32,

    /// Budgeted execution time per instance, used for feasibility analysis
    /// and by the demo runtime as the simulated workload.
    pub budget_ms: u32,
}

impl JobSpec {
    /// A job with an implicit deadline, no offset and no budget.
    pub fn new(name: impl Into<String>, period_ms: u32) -> Result<Self, JobError> {
        let spec = Self {
            name: name.into(),
            period_ms,
            ..Default::default()
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn with_deadline(mut self, deadline_ms: u32) -> Result<Self, JobError> {
        self.deadline_ms = Some(deadline_ms);
        self.validate()?;
        Ok(self)
    }

    pub fn with_offset(mut self, offset_ms: u32) -> Self {
        self.offset_ms = offset_ms;
        self
    }

    pub fn with_budget(mut self, budget_ms: u32) -> Self {
        self.budget_ms = budget_ms;
        self
    }

    /// Check the period and deadline invariants.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.period_ms == 0 {
            return Err(JobError::ZeroPeriod {
                job: self.name.clone(),
            });
        }
        let deadline_ms = self.relative_deadline_ms();
        if deadline_ms == 0 || deadline_ms > self.period_ms {
            return Err(JobError::InvalidDeadline {
                job: self.name.clone(),
                deadline_ms,
                period_ms: self.period_ms,
            });
        }
        Ok(())
    }

    pub fn relative_deadline_ms(&self) -> u32 {
        self.deadline_ms.unwrap_or(self.period_ms)
    }

    /// `budget / period`; `0.0` for a zero period.
    pub fn utilization(&self) -> f64 {
        if self.period_ms == 0 {
            0.0
        } else {
            f64::from(self.budget_ms) / f64::from(self.period_ms)
        }
    }

    /// `budget / relative deadline`; equals utilization for implicit deadlines.
    pub fn density(&self) -> f64 {
        match self.relative_deadline_ms() {
            0 => 0.0,
            d => f64::from(self.budget_ms) / f64::from(d),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
