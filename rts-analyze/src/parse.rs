/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Event log parsing.
//!
//! A record is `time,event,task[,detail]`.  Captured serial output is noisy
//! (plot lines, boot banners, partial lines), so a record may be preceded by
//! junk on the same line and lines without a record are skipped.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, trace};

use rts_core::logger::EventKind;

/// One parsed event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub time_ms: u64,
    pub event: EventKind,
    pub task: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no record found")]
    NoRecord,

    #[error("timestamp '{0}' is not a millisecond count")]
    BadTimestamp(String),

    #[error("unknown event '{0}'")]
    UnknownEvent(String),

    #[error("task name '{0}' is empty or has invalid characters")]
    BadTask(String),
}

fn is_task_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a record starting exactly at the beginning of `s`.
fn parse_at(s: &str) -> Result<LogRecord, ParseError> {
    let mut fields = s.splitn(4, ',');
    let (Some(time), Some(event), Some(task)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(ParseError::NoRecord);
    };

    let time_ms = time
        .parse::<u64>()
        .map_err(|_| ParseError::BadTimestamp(time.to_string()))?;
    let event =
        EventKind::from_str(event).map_err(|_| ParseError::UnknownEvent(event.to_string()))?;
    if !is_task_name(task) {
        return Err(ParseError::BadTask(task.to_string()));
    }

    Ok(LogRecord {
        time_ms,
        event,
        task: task.to_string(),
        detail: fields.next().unwrap_or_default().to_string(),
    })
}

/// Find the first record in `line`.
///
/// Every position where a digit run begins is tried in turn, so a record
/// glued to the end of other output is still found.
pub fn parse_line(line: &str) -> Result<LogRecord, ParseError> {
    let line = line.trim();
    let mut last_err = ParseError::NoRecord;
    let mut prev_digit = false;

    for (i, c) in line.char_indices() {
        let digit = c.is_ascii_digit();
        if digit && !prev_digit {
            match parse_at(&line[i..]) {
                Ok(rec) => return Ok(rec),
                Err(ParseError::NoRecord) => {}
                // report the first candidate that looked like a record
                Err(e) if last_err == ParseError::NoRecord => last_err = e,
                Err(_) => {}
            }
        }
        prev_digit = digit;
    }
    Err(last_err)
}

/// Parse every record in `content`, in file order.
pub fn parse_str(content: &str) -> Vec<LogRecord> {
    let mut records = Vec::new();
    for (n, line) in content.lines().enumerate() {
        match parse_line(line) {
            Ok(rec) => records.push(rec),
            Err(e) => trace!(line = n + 1, "skipped: {}", e),
        }
    }
    records
}

/// Read and parse the log at `path`.  Invalid UTF-8 is replaced, not fatal.
pub fn parse_file(path: &Path) -> Result<Vec<LogRecord>> {
    let bytes =
        fs::read(path).with_context(|| format!("Cannot read event log: {}", path.display()))?;
    let records = parse_str(&String::from_utf8_lossy(&bytes));
    debug!("Parsed {} record(s) from {}", records.len(), path.display());
    Ok(records)
}
