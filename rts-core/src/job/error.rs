/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error type for job definition and lifecycle misuse.
//!
//! Timing faults (deadline miss, overrun) are *not* errors: they are normal
//! outcomes reported through [`Completion`](super::Completion) and
//! [`ReleaseOutcome`](super::ReleaseOutcome) and logged as events.  The
//! variants here cover invalid definitions and calls made in the wrong state.

use thiserror::Error;

use crate::resource::ResourceError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// A periodic job needs a non-zero period.
    #[error("job '{job}': period must be greater than zero")]
    ZeroPeriod { job: String },

    /// Relative deadline outside `1..=period_ms` (implicit/constrained
    /// deadlines only).
    #[error("job '{job}': relative deadline {deadline_ms} ms must be within 1..={period_ms} ms")]
    InvalidDeadline {
        job: String,
        deadline_ms: u32,
        period_ms: u32,
    },

    /// `begin_execution` without a pending release.
    #[error("job '{job}' has no pending release to execute")]
    NotReady { job: String },

    /// `end_execution` while no instance is running.
    #[error("job '{job}' is not running")]
    NotRunning { job: String },

    /// The runtime tried to bind a second execution context.
    #[error("job '{job}' is already bound to an execution context")]
    HandleAlreadyBound { job: String },

    /// A critical section was requested on a job built without a resource.
    #[error("job '{job}' was built without a shared resource")]
    NoSharedResource { job: String },

    /// The shared resource could not be acquired.
    #[error("job '{job}' could not enter its critical section")]
    Resource {
        job: String,
        #[source]
        source: ResourceError,
    },
}
