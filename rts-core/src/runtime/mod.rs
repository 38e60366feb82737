/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Host demo runtime: drives a workload of periodic jobs for a fixed time.
//!
//! ```text
//!                       ┌──────────── release task (1 ms tick) ─────────────┐
//!                       │  job.release(now) → RELEASE / OVERRUN             │
//!                       └───────────────────────────────────────────────────┘
//!   spawn_blocking ×N   ┌──────────── worker (one per job) ─────────────────┐
//!                       │  ready? → START → [lock] → work → COMPLETE [MISS] │
//!                       └───────────────────────────────────────────────────┘
//!                       ┌──────────── plot task ────────────────────────────┐
//!                       │  "r1 r2 r3" + indicator refresh                   │
//!                       └───────────────────────────────────────────────────┘
//!                       ┌──────────── watchdog task ────────────────────────┐
//!                       │  WDT_PET,WDT,ok                                   │
//!                       └───────────────────────────────────────────────────┘
//! ```
//!
//! The runtime is not a scheduler: the host OS decides which worker runs.  It
//! only supplies releases, the shared resource and the output channels.

mod stop;
mod worker;

pub use stop::StopSignal;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::{elapsed_ms, Clock};
use crate::config::WorkloadConfig;
use crate::indicator::IndicatorBank;
use crate::job::{Job, JobError, JobSnapshot, ReleaseOutcome};
use crate::logger::{EventKind, EventLogger};
use crate::plotter::StatusPlotter;
use crate::resource::{ResourceStats, SharedResource};
use crate::sink::SinkStats;
use worker::Worker;

/// Release mechanism period.
pub const RELEASE_TICK: Duration = Duration::from_millis(1);

/// Task name used for the runtime's own INFO records.
pub const SUPERVISOR_TASK: &str = "Supervisor";

/// Task name used for watchdog records.
pub const WATCHDOG_TASK: &str = "WDT";

// ── Shared state ──────────────────────────────────────────────────────────────

/// State guarded by the workload's shared resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedCounter {
    pub updates: u64,
    pub last_writer: Option<String>,
}

impl SharedCounter {
    /// Count one critical-section entry by `job`; returns the new total.
    pub fn record(&mut self, job: &str) -> u64 {
        self.updates += 1;
        self.last_writer = Some(job.to_string());
        self.updates
    }
}

// ── Summary ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub elapsed_ms: u32,
    pub jobs: Vec<JobSnapshot>,
    pub events: SinkStats,
    pub plots: SinkStats,
    pub resource: ResourceStats,
    pub shared: SharedCounter,
}

impl RunSummary {
    pub fn total_misses(&self) -> u32 {
        self.jobs.iter().map(|j| j.deadline_misses).sum()
    }

    pub fn total_overruns(&self) -> u32 {
        self.jobs.iter().map(|j| j.overruns).sum()
    }

    /// Write the summary to the diagnostic log.
    pub fn log(&self) {
        info!(
            elapsed_ms = self.elapsed_ms,
            events = self.events.written,
            plots = self.plots.written,
            dropped = self.events.dropped + self.plots.dropped,
            "Run summary"
        );
        for j in &self.jobs {
            info!(
                "  [{name}]  releases={rel}  completions={done}  misses={miss}  overruns={over}  last_exec={exec}ms  worst_exec={worst}ms",
                name = j.name,
                rel = j.releases,
                done = j.completions,
                miss = j.deadline_misses,
                over = j.overruns,
                exec = j.exec_ms,
                worst = j.worst_exec_ms,
            );
        }
        info!(
            acquisitions = self.resource.acquisitions,
            contended = self.resource.contended,
            timeouts = self.resource.timeouts,
            updates = self.shared.updates,
            "Shared resource"
        );
    }
}

// ── DemoRuntime ───────────────────────────────────────────────────────────────

/// Owns the jobs, the shared resource and both output channels of one run.
pub struct DemoRuntime<W, P> {
    config: WorkloadConfig,
    clock: Arc<dyn Clock>,
    jobs: Arc<Vec<Arc<Job<SharedCounter>>>>,
    resource: Arc<SharedResource<SharedCounter>>,
    logger: Arc<EventLogger<W>>,
    plotter: Arc<StatusPlotter<P>>,
    indicators: Arc<IndicatorBank>,
    stop: StopSignal,
}

impl<W, P> DemoRuntime<W, P>
where
    W: Write + Send + 'static,
    P: Write + Send + 'static,
{
    /// Build every job from `config`, seeding releases from `clock.now_ms()`.
    pub fn new(
        config: WorkloadConfig,
        clock: Arc<dyn Clock>,
        event_sink: W,
        plot_sink: P,
    ) -> Result<Self, JobError> {
        let resource = Arc::new(SharedResource::new("shared", SharedCounter::default()));
        let now = clock.now_ms();

        let jobs = config
            .jobs
            .iter()
            .map(|j| Job::with_resource(j.spec.clone(), now, Arc::clone(&resource)).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            logger: Arc::new(EventLogger::new(Arc::clone(&clock), event_sink)),
            plotter: Arc::new(StatusPlotter::new(plot_sink)),
            indicators: Arc::new(IndicatorBank::new()),
            jobs: Arc::new(jobs),
            stop: StopSignal::new(),
            resource,
            clock,
            config,
        })
    }

    pub fn with_indicators(mut self, bank: IndicatorBank) -> Self {
        self.indicators = Arc::new(bank);
        self
    }

    /// A handle that ends the run early when stopped.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn jobs(&self) -> &[Arc<Job<SharedCounter>>] {
        &self.jobs
    }

    /// Run until `duration` has elapsed or the stop signal is raised, then
    /// wait for every worker to finish its current instance.
    pub async fn run(self, duration: Duration) -> Result<RunSummary> {
        let started = self.clock.now_ms();
        info!(
            jobs = self.jobs.len(),
            duration_ms = duration.as_millis() as u64,
            lock_timeout_ms = ?self.config.lock_timeout_ms,
            "Demo runtime starting"
        );
        self.logger.log_event(EventKind::Info, SUPERVISOR_TASK, "start");

        let workers = self.spawn_workers();
        let tasks = [
            tokio::spawn(release_loop(
                Arc::clone(&self.jobs),
                Arc::clone(&self.clock),
                Arc::clone(&self.logger),
                self.stop.clone(),
            )),
            tokio::spawn(plot_loop(
                Arc::clone(&self.jobs),
                Arc::clone(&self.plotter),
                Arc::clone(&self.indicators),
                millis(self.config.plot_interval_ms),
                self.stop.clone(),
            )),
            tokio::spawn(watchdog_loop(
                Arc::clone(&self.logger),
                millis(self.config.watchdog_interval_ms),
                self.stop.clone(),
            )),
        ];

        tokio::select! {
            _ = tokio::time::sleep(duration) => debug!("run duration elapsed"),
            _ = self.stop.stopped() => info!("stop requested"),
        }
        self.stop.stop();

        for task in tasks {
            task.await.context("runtime task panicked")?;
        }
        for (job, worker) in self.jobs.iter().zip(workers) {
            let instances = worker
                .await
                .with_context(|| format!("worker for '{}' panicked", job.name()))?
                .with_context(|| format!("worker for '{}' failed", job.name()))?;
            debug!(job = %job.name(), instances, "worker joined");
        }

        let refs: Vec<&Job<SharedCounter>> = self.jobs.iter().map(AsRef::as_ref).collect();
        self.indicators.refresh(&refs);
        self.logger.log_event(EventKind::Info, SUPERVISOR_TASK, "stop");
        self.logger.flush();
        self.plotter.flush();

        let shared = self
            .resource
            .acquire()
            .map(|guard| SharedCounter::clone(&guard))
            .context("shared resource unavailable after run")?;

        Ok(RunSummary {
            elapsed_ms: elapsed_ms(started, self.clock.now_ms()),
            jobs: self.jobs.iter().map(|j| j.snapshot()).collect(),
            events: self.logger.stats(),
            plots: self.plotter.stats(),
            resource: self.resource.stats(),
            shared,
        })
    }

    fn spawn_workers(&self) -> Vec<JoinHandle<Result<u32, JobError>>> {
        let lock_timeout = self.config.lock_timeout_ms.map(millis);
        self.jobs
            .iter()
            .zip(&self.config.jobs)
            .map(|(job, cfg)| {
                let worker = Worker {
                    job: Arc::clone(job),
                    critical_section_ms: cfg.critical_section_ms,
                    lock_timeout,
                    clock: Arc::clone(&self.clock),
                    logger: Arc::clone(&self.logger),
                    stop: self.stop.clone(),
                };
                tokio::task::spawn_blocking(move || worker.run())
            })
            .collect()
    }
}

fn millis(ms: u32) -> Duration {
    Duration::from_millis(u64::from(ms))
}

// ── Periodic tasks ────────────────────────────────────────────────────────────

async fn release_loop<W: Write>(
    jobs: Arc<Vec<Arc<Job<SharedCounter>>>>,
    clock: Arc<dyn Clock>,
    logger: Arc<EventLogger<W>>,
    stop: StopSignal,
) {
    let mut ticker = interval(RELEASE_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop.stopped() => break,
            _ = ticker.tick() => {}
        }
        let now = clock.now_ms();
        for job in jobs.iter() {
            match job.release(now) {
                ReleaseOutcome::NotDue => {}
                ReleaseOutcome::Released {
                    release_at,
                    abs_deadline,
                } => {
                    debug!(job = %job.name(), release_at, abs_deadline, now_ms = now, "released");
                    logger.log_event(EventKind::Release, job.name(), "ok");
                }
                ReleaseOutcome::Overrun { skipped_release } => {
                    warn!(job = %job.name(), skipped_release, "overrun, release skipped");
                    logger.log_event(
                        EventKind::Overrun,
                        job.name(),
                        &format!("skipped_{skipped_release}"),
                    );
                }
            }
        }
    }
}

async fn plot_loop<P: Write>(
    jobs: Arc<Vec<Arc<Job<SharedCounter>>>>,
    plotter: Arc<StatusPlotter<P>>,
    indicators: Arc<IndicatorBank>,
    period: Duration,
    stop: StopSignal,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stop.stopped() => break,
            _ = ticker.tick() => {}
        }
        let refs: Vec<&Job<SharedCounter>> = jobs.iter().map(AsRef::as_ref).collect();
        plotter.plot_running(&refs);
        indicators.refresh(&refs);
    }
}

async fn watchdog_loop<W: Write>(logger: Arc<EventLogger<W>>, period: Duration, stop: StopSignal) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = stop.stopped() => break,
            _ = ticker.tick() => {}
        }
        logger.log_event(EventKind::WatchdogPet, WATCHDOG_TASK, "ok");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::config::JobConfig;
    use crate::indicator::StatusIndicator;
    use crate::job::{JobSpec, JobState};
    use crate::line::EVENT_LINE_CAPACITY;
    use crate::sink::MemorySink;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    fn job(name: &str, period_ms: u32, budget_ms: u32, critical_section_ms: u32) -> JobConfig {
        JobConfig {
            spec: JobSpec::new(name, period_ms).unwrap().with_budget(budget_ms),
            critical_section_ms,
        }
    }

    fn workload(jobs: Vec<JobConfig>) -> WorkloadConfig {
        WorkloadConfig {
            jobs,
            lock_timeout_ms: Some(20),
            plot_interval_ms: 10,
            watchdog_interval_ms: 25,
        }
    }

    fn runtime(
        config: WorkloadConfig,
    ) -> (DemoRuntime<MemorySink, MemorySink>, MemorySink, MemorySink) {
        let events = MemorySink::new();
        let plots = MemorySink::new();
        let rt = DemoRuntime::new(
            config,
            Arc::new(SystemClock::new()),
            events.clone(),
            plots.clone(),
        )
        .unwrap();
        (rt, events, plots)
    }

    fn count(lines: &[String], event: &str, task: &str) -> usize {
        lines
            .iter()
            .filter(|l| {
                let mut f = l.split(',');
                f.next();
                f.next() == Some(event) && f.next() == Some(task)
            })
            .count()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn runs_workload_and_emits_well_formed_records() {
        let (rt, events, plots) = runtime(workload(vec![
            job("Task1", 20, 4, 1),
            job("Task2", 40, 6, 2),
            job("Task3", 60, 8, 0),
        ]));

        let summary = rt.run(Duration::from_millis(300)).await.unwrap();
        let lines = events.lines();

        for line in &lines {
            assert!(line.len() <= EVENT_LINE_CAPACITY);
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 4, "{line}");
            fields[0].parse::<u32>().unwrap();
            EventKind::from_str(fields[1]).unwrap();
        }

        assert!(count(&lines, "RELEASE", "Task1") >= 1);
        assert!(count(&lines, "START", "Task1") >= 1);
        assert!(count(&lines, "COMPLETE", "Task1") >= 1);
        assert!(count(&lines, "WDT_PET", WATCHDOG_TASK) >= 1);
        assert_eq!(count(&lines, "INFO", SUPERVISOR_TASK), 2);

        for line in plots.lines() {
            let v: Vec<i32> = line.split(' ').map(|s| s.parse().unwrap()).collect();
            assert_eq!(v.len(), 3);
            assert!(v.iter().all(|&x| x == 0 || x == 1));
        }

        for snap in &summary.jobs {
            assert_ne!(snap.state, JobState::Running, "{} left running", snap.name);
            assert!(snap.completions <= snap.releases);
        }
        assert!(summary.shared.updates >= 1);
        assert_eq!(summary.events.written as usize, lines.len());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn overloaded_job_overruns_and_misses() {
        // budget 35 ms every 10 ms: later releases land while it is running
        let (rt, events, _plots) = runtime(workload(vec![job("Hog", 10, 35, 0)]));

        let summary = rt.run(Duration::from_millis(200)).await.unwrap();
        let lines = events.lines();

        assert!(summary.total_overruns() >= 1);
        assert!(summary.total_misses() >= 1);
        assert!(count(&lines, "OVERRUN", "Hog") >= 1);
        assert!(count(&lines, "MISS", "Hog") >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_signal_ends_run_early() {
        let (rt, _events, _plots) = runtime(workload(vec![job("Task1", 20, 2, 0)]));
        let stop = rt.stop_signal();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            stop.stop();
        });

        let summary = tokio::time::timeout(Duration::from_secs(5), rt.run(Duration::from_secs(60)))
            .await
            .expect("run did not stop")
            .unwrap();
        assert!(summary.elapsed_ms < 5_000);
    }

    /// Remembers the last level and counts rising edges.
    struct Probe {
        lit: Arc<AtomicBool>,
        edges: Arc<AtomicU32>,
    }

    impl StatusIndicator for Probe {
        fn set(&self, on: bool) {
            if on && !self.lit.swap(true, Ordering::Relaxed) {
                self.edges.fetch_add(1, Ordering::Relaxed);
            }
            if !on {
                self.lit.store(false, Ordering::Relaxed);
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn indicators_follow_running_and_end_dark() {
        let lit = Arc::new(AtomicBool::new(false));
        let edges = Arc::new(AtomicU32::new(0));
        let mut bank = IndicatorBank::new();
        bank.push(Box::new(Probe {
            lit: Arc::clone(&lit),
            edges: Arc::clone(&edges),
        }));

        // running 40 of every 50 ms, sampled every 10 ms
        let (rt, _events, _plots) = runtime(workload(vec![job("Task1", 50, 40, 0)]));
        let rt = rt.with_indicators(bank);
        rt.run(Duration::from_millis(200)).await.unwrap();

        assert!(edges.load(Ordering::Relaxed) >= 1);
        assert!(!lit.load(Ordering::Relaxed));
    }

    #[test]
    fn invalid_job_fails_construction() {
        let bad = JobConfig {
            spec: JobSpec {
                name: "Bad".into(),
                period_ms: 0,
                ..Default::default()
            },
            critical_section_ms: 0,
        };
        let result = DemoRuntime::new(
            workload(vec![bad]),
            Arc::new(SystemClock::new()),
            MemorySink::new(),
            MemorySink::new(),
        );
        assert!(matches!(result, Err(JobError::ZeroPeriod { .. })));
    }

    #[test]
    fn shared_counter_records_writer() {
        let mut c = SharedCounter::default();
        assert_eq!(c.record("Task1"), 1);
        assert_eq!(c.record("Task2"), 2);
        assert_eq!(c.last_writer.as_deref(), Some("Task2"));
    }
}
