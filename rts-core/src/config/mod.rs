//! Workload configuration loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! jobs:
//!   - name: Task1
//!     period_ms: 100
//!     deadline_ms: 100        # optional, defaults to period_ms
//!     offset_ms: 0            # optional
//!     budget_ms: 20           # simulated execution time per instance
//!     critical_section_ms: 5  # optional, part of budget_ms spent holding the lock
//! lock_timeout_ms: 50         # optional, absent = wait forever
//! plot_interval_ms: 50
//! watchdog_interval_ms: 500
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::job::JobSpec;

/// Default plot cadence when the file does not set one.
pub const DEFAULT_PLOT_INTERVAL_MS: u32 = 50;

/// Default watchdog cadence when the file does not set one.
pub const DEFAULT_WATCHDOG_INTERVAL_MS: u32 = 500;

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkloadFile {
    #[serde(default)]
    jobs: Vec<JobEntry>,
    lock_timeout_ms: Option<u32>,
    #[serde(default = "default_plot_interval_ms")]
    plot_interval_ms: u32,
    #[serde(default = "default_watchdog_interval_ms")]
    watchdog_interval_ms: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JobEntry {
    name: String,
    period_ms: u32,
    deadline_ms: Option<u32>,
    #[serde(default)]
    offset_ms: u32,
    #[serde(default)]
    budget_ms: u32,
    #[serde(default)]
    critical_section_ms: u32,
}

fn default_plot_interval_ms() -> u32 {
    DEFAULT_PLOT_INTERVAL_MS
}

fn default_watchdog_interval_ms() -> u32 {
    DEFAULT_WATCHDOG_INTERVAL_MS
}

// ── Public data structures ────────────────────────────────────────────────────

/// One job of the workload: its timing plus how long it holds the lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub spec: JobSpec,
    /// Portion of `spec.budget_ms` spent inside the critical section.
    /// `0` = the job never takes the shared resource.
    pub critical_section_ms: u32,
}

/// Everything the demo runtime needs to know about a workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadConfig {
    pub jobs: Vec<JobConfig>,
    pub lock_timeout_ms: Option<u32>,
    pub plot_interval_ms: u32,
    pub watchdog_interval_ms: u32,
}

impl WorkloadConfig {
    /// The built-in three-job workload used when no file is supplied.
    pub fn default_demo() -> Self {
        let job = |name: &str, period_ms: u32, budget_ms: u32, critical_section_ms: u32| JobConfig {
            spec: JobSpec {
                name: name.to_string(),
                period_ms,
                deadline_ms: None,
                offset_ms: 0,
                budget_ms,
            },
            critical_section_ms,
        };
        Self {
            jobs: vec![
                job("Task1", 100, 20, 5),
                job("Task2", 200, 40, 10),
                job("Task3", 300, 60, 15),
            ],
            lock_timeout_ms: Some(50),
            plot_interval_ms: DEFAULT_PLOT_INTERVAL_MS,
            watchdog_interval_ms: DEFAULT_WATCHDOG_INTERVAL_MS,
        }
    }

    /// Parse and validate the YAML file at `path`.
    ///
    /// An empty `jobs` list falls back to the default three jobs while keeping
    /// the file's other settings.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid YAML, or
    /// contains an invalid job definition.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading workload configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid workload configuration: {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: WorkloadFile =
            serde_yaml::from_str(content).context("Failed to parse workload YAML")?;

        if file.plot_interval_ms == 0 {
            bail!("plot_interval_ms must be greater than zero");
        }
        if file.watchdog_interval_ms == 0 {
            bail!("watchdog_interval_ms must be greater than zero");
        }

        let mut jobs = Vec::with_capacity(file.jobs.len());
        for entry in file.jobs {
            let spec = JobSpec {
                name: entry.name,
                period_ms: entry.period_ms,
                deadline_ms: entry.deadline_ms,
                offset_ms: entry.offset_ms,
                budget_ms: entry.budget_ms,
            };
            spec.validate()?;

            if entry.critical_section_ms > spec.budget_ms {
                bail!(
                    "job '{}': critical_section_ms {} exceeds budget_ms {}",
                    spec.name,
                    entry.critical_section_ms,
                    spec.budget_ms
                );
            }
            if jobs.iter().any(|j: &JobConfig| j.spec.name == spec.name) {
                bail!("job '{}' is defined more than once", spec.name);
            }

            debug!(
                "  Job: {} | period: {}ms | deadline: {}ms | offset: {}ms | budget: {}ms | cs: {}ms",
                spec.name,
                spec.period_ms,
                spec.relative_deadline_ms(),
                spec.offset_ms,
                spec.budget_ms,
                entry.critical_section_ms,
            );

            jobs.push(JobConfig {
                spec,
                critical_section_ms: entry.critical_section_ms,
            });
        }

        if jobs.is_empty() {
            warn!("No jobs found in configuration, using the default job set");
            jobs = Self::default_demo().jobs;
        }

        info!("Loaded {} job definition(s)", jobs.len());

        Ok(Self {
            jobs,
            lock_timeout_ms: file.lock_timeout_ms,
            plot_interval_ms: file.plot_interval_ms,
            watchdog_interval_ms: file.watchdog_interval_ms,
        })
    }

    pub fn specs(&self) -> Vec<JobSpec> {
        self.jobs.iter().map(|j| j.spec.clone()).collect()
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self::default_demo()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn default_demo_has_three_valid_jobs() {
        let cfg = WorkloadConfig::default_demo();
        assert_eq!(cfg.jobs.len(), 3);
        for job in &cfg.jobs {
            job.spec.validate().unwrap();
            assert!(job.critical_section_ms <= job.spec.budget_ms);
        }
    }

    #[test]
    fn load_full_yaml() {
        let yaml = r#"
jobs:
  - name: Task1
    period_ms: 100
    budget_ms: 20
    critical_section_ms: 5
  - name: Task2
    period_ms: 250
    deadline_ms: 200
    offset_ms: 10
    budget_ms: 30
lock_timeout_ms: 40
plot_interval_ms: 25
watchdog_interval_ms: 1000
"#;
        let f = yaml_tempfile(yaml);
        let cfg = WorkloadConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.jobs.len(), 2);
        assert_eq!(cfg.jobs[0].spec.name, "Task1");
        assert_eq!(cfg.jobs[0].spec.relative_deadline_ms(), 100);
        assert_eq!(cfg.jobs[0].critical_section_ms, 5);

        let t2 = &cfg.jobs[1];
        assert_eq!(t2.spec.deadline_ms, Some(200));
        assert_eq!(t2.spec.offset_ms, 10);
        assert_eq!(t2.critical_section_ms, 0);

        assert_eq!(cfg.lock_timeout_ms, Some(40));
        assert_eq!(cfg.plot_interval_ms, 25);
        assert_eq!(cfg.watchdog_interval_ms, 1000);
    }

    #[test]
    fn optional_settings_use_defaults() {
        let cfg = WorkloadConfig::from_yaml_str("jobs:\n  - name: A\n    period_ms: 10\n").unwrap();
        assert_eq!(cfg.lock_timeout_ms, None);
        assert_eq!(cfg.plot_interval_ms, DEFAULT_PLOT_INTERVAL_MS);
        assert_eq!(cfg.watchdog_interval_ms, DEFAULT_WATCHDOG_INTERVAL_MS);
        assert_eq!(cfg.jobs[0].spec.budget_ms, 0);
    }

    #[test]
    fn empty_jobs_fall_back_to_default_set() {
        let cfg = WorkloadConfig::from_yaml_str("jobs: []\nplot_interval_ms: 10\n").unwrap();
        assert_eq!(cfg.jobs, WorkloadConfig::default_demo().jobs);
        assert_eq!(cfg.plot_interval_ms, 10);
    }

    #[test]
    fn zero_period_fails_with_job_name() {
        let err = WorkloadConfig::from_yaml_str("jobs:\n  - name: Broken\n    period_ms: 0\n")
            .unwrap_err();
        assert!(format!("{err:#}").contains("Broken"));
    }

    #[test]
    fn critical_section_longer_than_budget_is_rejected() {
        let yaml = "jobs:\n  - name: A\n    period_ms: 10\n    budget_ms: 2\n    critical_section_ms: 3\n";
        assert!(WorkloadConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn duplicate_job_names_are_rejected() {
        let yaml = "jobs:\n  - name: A\n    period_ms: 10\n  - name: A\n    period_ms: 20\n";
        assert!(WorkloadConfig::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn zero_plot_interval_is_rejected() {
        assert!(WorkloadConfig::from_yaml_str("plot_interval_ms: 0\n").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(WorkloadConfig::from_yaml_str("jobz: []\n").is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = WorkloadConfig::load_from_file(Path::new("/nonexistent/path/workload.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(WorkloadConfig::load_from_file(f.path()).is_err());
    }
}
