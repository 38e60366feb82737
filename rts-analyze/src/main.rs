/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

mod metrics;
mod parse;
mod report;

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{error, info, warn};

use crate::metrics::{analyze, LogMetrics};

/// Offline analyzer for RTS demo event logs.
///
/// Computes per-task execution time, response time and deadline-miss ratio,
/// plus the watchdog interval.  Given two logs it also compares them.
///
/// Example:
///   rts-analyze edf_log.csv rm_log.csv --labels EDF,RM
#[derive(Debug, Parser)]
#[command(name = "rts-analyze", about = "RTS event log analyzer", long_about = None)]
struct Cli {
    /// One or two event log files.
    #[arg(required = true, num_args = 1..=2)]
    logs: Vec<PathBuf>,

    /// Display names for the logs, comma-separated (default: file stems).
    #[arg(short = 'l', long = "labels", value_delimiter = ',')]
    labels: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("rts-analyze failed: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    if !cli.labels.is_empty() && cli.labels.len() != cli.logs.len() {
        bail!(
            "{} label(s) given for {} log(s)",
            cli.labels.len(),
            cli.logs.len()
        );
    }

    let mut analyzed: Vec<(String, LogMetrics)> = Vec::with_capacity(cli.logs.len());
    for (i, path) in cli.logs.iter().enumerate() {
        let label = cli
            .labels
            .get(i)
            .cloned()
            .unwrap_or_else(|| default_label(path));
        let records = parse::parse_file(path)?;
        if records.is_empty() {
            warn!("No event records found in {}", path.display());
        }
        let metrics = analyze(&records);
        info!(
            log = %path.display(),
            records = records.len(),
            tasks = metrics.tasks.len(),
            "Analyzed"
        );
        println!("{}", report::render_metrics(&label, &metrics));
        analyzed.push((label, metrics));
    }

    if let [(la, ma), (lb, mb)] = analyzed.as_slice() {
        println!("{}", report::render_comparison((la.as_str(), ma), (lb.as_str(), mb)));
    }
    Ok(())
}

fn default_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_else(|| path.display().to_string())
}
