/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Body of one job's execution context.

use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{SharedCounter, StopSignal};
use crate::clock::Clock;
use crate::job::{Job, JobError, TaskHandle};
use crate::logger::{EventKind, EventLogger};
use crate::resource::ResourceError;

/// Sleep granularity while waiting for a release.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(1);

pub(crate) struct Worker<W> {
    pub job: Arc<Job<SharedCounter>>,
    pub critical_section_ms: u32,
    pub lock_timeout: Option<Duration>,
    pub clock: Arc<dyn Clock>,
    pub logger: Arc<EventLogger<W>>,
    pub stop: StopSignal,
}

impl<W: Write> Worker<W> {
    /// Serve releases until the stop signal is raised.
    ///
    /// An instance that has begun always runs to `end_execution`, so a stop
    /// never leaves the job marked running.
    pub(crate) fn run(self) -> Result<u32, JobError> {
        self.job.bind_handle(TaskHandle::current())?;
        info!(job = %self.job.name(), "worker started");

        let mut instances = 0u32;
        while !self.stop.is_stopped() {
            if !self.job.is_ready() {
                thread::sleep(POLL_INTERVAL);
                continue;
            }
            self.run_instance()?;
            instances += 1;
        }

        info!(job = %self.job.name(), instances, "worker stopped");
        Ok(instances)
    }

    fn run_instance(&self) -> Result<(), JobError> {
        let name = self.job.name();
        self.job.begin_execution(self.clock.now_ms())?;
        self.logger.log_event(EventKind::Start, name, "ok");

        let spec = self.job.spec();
        if self.critical_section_ms > 0 {
            self.enter_critical_section()?;
        }
        let remaining = spec.budget_ms.saturating_sub(self.critical_section_ms);
        if remaining > 0 {
            thread::sleep(Duration::from_millis(u64::from(remaining)));
        }

        let done = self.job.end_execution(self.clock.now_ms())?;
        self.logger
            .log_event(EventKind::Complete, name, &format!("exec_{}ms", done.exec_ms));

        if done.deadline_missed {
            warn!(
                job = %name,
                finished_at = done.finished_at,
                abs_deadline = done.abs_deadline,
                lateness_ms = done.lateness_ms,
                "deadline miss"
            );
            self.logger
                .log_event(EventKind::Miss, name, &format!("late_{}ms", done.lateness_ms));
        }
        Ok(())
    }

    /// Hold the shared resource for `critical_section_ms`.  A lock timeout is
    /// logged and the section skipped; other resource errors are fatal.
    fn enter_critical_section(&self) -> Result<(), JobError> {
        let name = self.job.name();
        let hold = Duration::from_millis(u64::from(self.critical_section_ms));

        match self.job.critical_section(self.lock_timeout, |shared| {
            thread::sleep(hold);
            shared.record(name)
        }) {
            Ok(updates) => {
                debug!(job = %name, updates, "critical section done");
                Ok(())
            }
            Err(JobError::Resource {
                source: ResourceError::Timeout { waited_ms, .. },
                ..
            }) => {
                warn!(job = %name, waited_ms, "shared resource timeout, critical section skipped");
                self.logger
                    .log_event(EventKind::LockTimeout, name, &format!("waited_{waited_ms}ms"));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
