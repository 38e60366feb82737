/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

use rts_core::clock::SystemClock;
use rts_core::config::WorkloadConfig;
use rts_core::indicator::{IndicatorBank, TracingIndicator};
use rts_core::job::feasibility;
use rts_core::runtime::DemoRuntime;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Periodic job demo: releases, critical sections, event log and plot feed.
///
/// Event records (`ms,event,task,detail`) and plot records (`v1 v2 v3`) are
/// written to stdout; diagnostics go to stderr.
///
/// Example:
///   rts-demo --config workload.yaml --duration-ms 10000 --log-file run.csv
#[derive(Debug, Parser)]
#[command(name = "rts-demo", about = "Periodic real-time job demo", long_about = None)]
struct Cli {
    /// Path to the YAML workload configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// How long to run before stopping, in milliseconds.
    #[arg(short = 'd', long = "duration-ms", default_value_t = 5_000)]
    duration_ms: u64,

    /// Write event records to this file instead of stdout.
    #[arg(short = 'l', long = "log-file")]
    log_file: Option<PathBuf>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        config      = ?cli.config,
        duration_ms = cli.duration_ms,
        log_file    = ?cli.log_file,
        "Configuration"
    );

    if let Err(e) = run(cli).await {
        error!("rts-demo failed: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // ── Load workload ─────────────────────────────────────────────────────────
    let workload = match &cli.config {
        Some(path) => WorkloadConfig::load_from_file(path)?,
        None => {
            warn!("No workload configuration file provided, using the default job set");
            WorkloadConfig::default_demo()
        }
    };

    report_feasibility(&workload);

    // ── Output channels ───────────────────────────────────────────────────────
    let events: Box<dyn Write + Send> = match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create log file: {}", path.display()))?;
            info!("Writing event records to: {}", path.display());
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout()),
    };

    let mut indicators = IndicatorBank::new();
    for job in &workload.jobs {
        if !indicators.push(Box::new(TracingIndicator::new(format!("LED_{}", job.spec.name)))) {
            warn!(job = %job.spec.name, "No status indicator left for job");
        }
    }

    // ── Run ───────────────────────────────────────────────────────────────────
    let runtime = DemoRuntime::new(workload, Arc::new(SystemClock::new()), events, io::stdout())
        .context("Invalid workload")?
        .with_indicators(indicators);

    let stop = runtime.stop_signal();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            stop.stop();
        }
    });

    let summary = runtime.run(Duration::from_millis(cli.duration_ms)).await?;
    summary.log();

    if summary.total_misses() > 0 {
        warn!(misses = summary.total_misses(), "Deadline misses observed");
    }
    Ok(())
}

/// Log the utilisation analysis.  Advisory only: nothing is rejected.
fn report_feasibility(workload: &WorkloadConfig) {
    match feasibility::analyze(&workload.specs()) {
        Ok(report) => {
            info!(
                jobs = report.job_count,
                utilization = report.utilization,
                rm_bound = report.rm_bound,
                edf_density = report.edf_density,
                hyperperiod_ms = report.hyperperiod_ms,
                "Feasibility"
            );
            if !report.rm_guaranteed {
                warn!(
                    "Utilization {:.3} exceeds the rate-monotonic bound {:.3}; deadlines may be missed",
                    report.utilization, report.rm_bound
                );
            }
            if !report.edf_feasible {
                warn!(
                    "Density {:.3} exceeds 1.0; the job set is overloaded",
                    report.edf_density
                );
            }
        }
        Err(e) => warn!("Feasibility analysis unavailable: {}", e),
    }
}
