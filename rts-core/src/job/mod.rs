/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Periodic job descriptor.
//!
//! A [`Job`] tracks one periodic activity through the cycle
//!
//! ```text
//!   Idle ──release()──► Ready ──begin_execution()──► Running ──end_execution()──► Idle
//! ```
//!
//! once per period, for the lifetime of the system.
//!
//! # Writers
//! Three kinds of execution context touch a job:
//!
//! | Context | Writes |
//! |---|---|
//! | release mechanism (exactly one) | `next_release`, `abs_deadline`, sets `ready` |
//! | the job's own worker | `exec_ms`, start time, clears `ready`, `running` |
//! | status reporting | nothing (reads `running`) |
//!
//! `ready` and `running` are the only fields written by more than one context
//! and are published with release/acquire ordering.  The release mechanism
//! writes `next_release` / `abs_deadline` *before* raising `ready`, so a worker
//! that observes `ready` also observes the deadline of its instance.  The
//! other fields are single-writer atomics read with relaxed ordering; a reader
//! sees them current at its next synchronization point.
//!
//! # Overrun policy
//! A release that comes due while the previous instance is still pending or
//! running is **skipped**: the release slot is consumed (`next_release`
//! advances so the periodic sequence is preserved), `ready` is not re-armed,
//! and the caller gets [`ReleaseOutcome::Overrun`].  Releases never queue up.

pub mod error;
pub mod feasibility;
pub mod spec;

pub use error::JobError;
pub use spec::JobSpec;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::clock::{elapsed_ms, is_after, reached, Millis};
use crate::resource::SharedResource;

// ── Handle & state ────────────────────────────────────────────────────────────

/// Opaque reference to the execution context that runs a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(ThreadId);

impl TaskHandle {
    /// Handle of the calling thread.
    pub fn current() -> Self {
        TaskHandle(thread::current().id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Ready,
    Running,
}

/// Result of offering a release to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// `now` has not reached `next_release`.
    NotDue,
    /// A new instance is ready.
    Released {
        release_at: Millis,
        abs_deadline: Millis,
    },
    /// The previous instance is still pending or running; this release was
    /// dropped.
    Overrun { skipped_release: Millis },
}

/// Accounting for one finished instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub started_at: Millis,
    pub finished_at: Millis,
    pub exec_ms: u32,
    pub abs_deadline: Millis,
    /// Finished strictly after the absolute deadline.
    pub deadline_missed: bool,
    /// How far past the deadline it finished (0 when met).
    pub lateness_ms: u32,
}

/// Point-in-time copy of every job field, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub name: String,
    pub state: JobState,
    pub period_ms: u32,
    pub deadline_ms: u32,
    pub exec_ms: u32,
    pub worst_exec_ms: u32,
    pub next_release: Millis,
    pub abs_deadline: Millis,
    pub releases: u32,
    pub completions: u32,
    pub deadline_misses: u32,
    pub overruns: u32,
}

#[derive(Debug, Default)]
struct Counters {
    releases: AtomicU32,
    completions: AtomicU32,
    misses: AtomicU32,
    overruns: AtomicU32,
    worst_exec_ms: AtomicU32,
}

// ── Job ───────────────────────────────────────────────────────────────────────

/// Descriptor of one periodic activity.
///
/// `S` is the type guarded by the shared resource the job was built with;
/// jobs without one use the default `()`.
pub struct Job<S = ()> {
    spec: JobSpec,
    handle: OnceLock<TaskHandle>,

    exec_ms: AtomicU32,
    started_at: AtomicU32,
    next_release: AtomicU32,
    abs_deadline: AtomicU32,

    ready: AtomicBool,
    running: AtomicU8,

    counters: Counters,
    resource: Option<Arc<SharedResource<S>>>,
}

impl Job {
    /// A job with no shared resource, first released at `now + offset_ms`.
    pub fn new(spec: JobSpec, now: Millis) -> Result<Self, JobError> {
        Self::build(spec, now, None)
    }
}

impl<S> Job<S> {
    /// A job that may enter critical sections on `resource`.
    pub fn with_resource(
        spec: JobSpec,
        now: Millis,
        resource: Arc<SharedResource<S>>,
    ) -> Result<Self, JobError> {
        Self::build(spec, now, Some(resource))
    }

    fn build(
        spec: JobSpec,
        now: Millis,
        resource: Option<Arc<SharedResource<S>>>,
    ) -> Result<Self, JobError> {
        spec.validate()?;
        let first_release = now.wrapping_add(spec.offset_ms);
        let first_deadline = first_release.wrapping_add(spec.relative_deadline_ms());
        Ok(Self {
            handle: OnceLock::new(),
            exec_ms: AtomicU32::new(0),
            started_at: AtomicU32::new(0),
            next_release: AtomicU32::new(first_release),
            abs_deadline: AtomicU32::new(first_deadline),
            ready: AtomicBool::new(false),
            running: AtomicU8::new(0),
            counters: Counters::default(),
            resource,
            spec,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    pub fn period_ms(&self) -> u32 {
        self.spec.period_ms
    }

    pub fn handle(&self) -> Option<TaskHandle> {
        self.handle.get().copied()
    }

    /// Record the execution context that runs this job.  Bound once.
    pub fn bind_handle(&self, handle: TaskHandle) -> Result<(), JobError> {
        self.handle
            .set(handle)
            .map_err(|_| JobError::HandleAlreadyBound {
                job: self.spec.name.clone(),
            })
    }

    pub fn next_release(&self) -> Millis {
        self.next_release.load(Ordering::Acquire)
    }

    pub fn abs_deadline(&self) -> Millis {
        self.abs_deadline.load(Ordering::Acquire)
    }

    /// Execution time of the most recently finished instance.
    pub fn exec_ms(&self) -> u32 {
        self.exec_ms.load(Ordering::Relaxed)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire) == 1
    }

    pub fn state(&self) -> JobState {
        if self.is_running() {
            JobState::Running
        } else if self.is_ready() {
            JobState::Ready
        } else {
            JobState::Idle
        }
    }

    pub fn is_due(&self, now: Millis) -> bool {
        reached(now, self.next_release())
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Offer a release at `now`.  Must be driven by a single release context.
    ///
    /// Fires at most one release per call: a job polled late is released
    /// once and catches up on later calls, never in a burst.
    pub fn release(&self, now: Millis) -> ReleaseOutcome {
        let release_at = self.next_release.load(Ordering::Acquire);
        if !reached(now, release_at) {
            return ReleaseOutcome::NotDue;
        }

        let next = release_at.wrapping_add(self.spec.period_ms);

        if self.is_running() || self.is_ready() {
            self.next_release.store(next, Ordering::Release);
            self.counters.overruns.fetch_add(1, Ordering::Relaxed);
            return ReleaseOutcome::Overrun {
                skipped_release: release_at,
            };
        }

        let abs_deadline = next.wrapping_add(self.spec.relative_deadline_ms());
        self.next_release.store(next, Ordering::Release);
        self.abs_deadline.store(abs_deadline, Ordering::Release);
        self.counters.releases.fetch_add(1, Ordering::Relaxed);
        self.ready.store(true, Ordering::Release);

        ReleaseOutcome::Released {
            release_at,
            abs_deadline,
        }
    }

    /// Consume the pending release and mark the job running.
    pub fn begin_execution(&self, now: Millis) -> Result<(), JobError> {
        if !self.is_ready() {
            return Err(JobError::NotReady {
                job: self.spec.name.clone(),
            });
        }
        self.started_at.store(now, Ordering::Relaxed);
        // `running` goes up before `ready` comes down so the release context
        // never sees the job idle in between.
        self.running.store(1, Ordering::Release);
        self.ready.store(false, Ordering::Release);
        Ok(())
    }

    /// Finish the running instance and check its deadline.
    ///
    /// Returns `NotRunning` if there is no instance to finish, so a given
    /// instance is accounted (and a miss reported) exactly once.
    pub fn end_execution(&self, now: Millis) -> Result<Completion, JobError> {
        if !self.is_running() {
            return Err(JobError::NotRunning {
                job: self.spec.name.clone(),
            });
        }

        // Read before clearing `running`: once it drops the release context
        // may install the next instance's deadline.
        let started_at = self.started_at.load(Ordering::Relaxed);
        let abs_deadline = self.abs_deadline.load(Ordering::Acquire);

        let exec_ms = elapsed_ms(started_at, now);
        let deadline_missed = is_after(now, abs_deadline);
        let lateness_ms = if deadline_missed {
            elapsed_ms(abs_deadline, now)
        } else {
            0
        };

        self.exec_ms.store(exec_ms, Ordering::Relaxed);
        self.counters.worst_exec_ms.fetch_max(exec_ms, Ordering::Relaxed);
        self.counters.completions.fetch_add(1, Ordering::Relaxed);
        if deadline_missed {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
        }

        self.running.store(0, Ordering::Release);

        Ok(Completion {
            started_at,
            finished_at: now,
            exec_ms,
            abs_deadline,
            deadline_missed,
            lateness_ms,
        })
    }

    /// Run `f` on the shared state while holding the shared resource.
    ///
    /// `timeout = None` waits indefinitely.  On timeout `f` is not run.
    pub fn critical_section<R>(
        &self,
        timeout: Option<Duration>,
        f: impl FnOnce(&mut S) -> R,
    ) -> Result<R, JobError> {
        let resource = self
            .resource
            .as_ref()
            .ok_or_else(|| JobError::NoSharedResource {
                job: self.spec.name.clone(),
            })?;
        let mut guard = resource
            .acquire_timeout(timeout)
            .map_err(|source| JobError::Resource {
                job: self.spec.name.clone(),
                source,
            })?;
        Ok(f(&mut *guard))
    }

    pub fn has_resource(&self) -> bool {
        self.resource.is_some()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            name: self.spec.name.clone(),
            state: self.state(),
            period_ms: self.spec.period_ms,
            deadline_ms: self.spec.relative_deadline_ms(),
            exec_ms: self.exec_ms(),
            worst_exec_ms: self.counters.worst_exec_ms.load(Ordering::Relaxed),
            next_release: self.next_release(),
            abs_deadline: self.abs_deadline(),
            releases: self.counters.releases.load(Ordering::Relaxed),
            completions: self.counters.completions.load(Ordering::Relaxed),
            deadline_misses: self.counters.misses.load(Ordering::Relaxed),
            overruns: self.counters.overruns.load(Ordering::Relaxed),
        }
    }
}

impl<S> fmt::Debug for Job<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("snapshot", &self.snapshot())
            .field("handle", &self.handle())
            .field("has_resource", &self.has_resource())
            .finish()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
