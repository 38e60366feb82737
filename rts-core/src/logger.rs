/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Timestamped scheduling event log.
//!
//! Each record is one line:
//!
//! ```text
//! <u32 timestamp_ms>,<event>,<task>,<detail>
//! ```
//!
//! Fields are comma-separated with no escaping; callers keep commas out of
//! them.  A line is at most [`EVENT_LINE_CAPACITY`] characters and is cut,
//! never grown, when the fields are longer.
//!
//! ```rust
//! use std::sync::Arc;
//! use rts_core::clock::ManualClock;
//! use rts_core::logger::EventLogger;
//! use rts_core::sink::MemorySink;
//!
//! let clock = Arc::new(ManualClock::new(12_345));
//! let sink = MemorySink::new();
//! let logger = EventLogger::new(clock, sink.clone());
//!
//! logger.log("RELEASE", "Task1", "ok");
//! assert_eq!(sink.lines(), vec!["12345,RELEASE,Task1,ok"]);
//! ```

use std::fmt;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

use tracing::trace;

use crate::clock::{Clock, Millis};
use crate::line::{EventLine, EVENT_LINE_CAPACITY};
use crate::sink::{LineWriter, SinkStats};

// ── Event kinds ───────────────────────────────────────────────────────────────

/// The event names written by the runtime and understood by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Release,
    Start,
    Complete,
    /// Deadline miss at completion.
    Miss,
    /// Release skipped because the previous instance had not finished.
    Overrun,
    WatchdogPet,
    LockTimeout,
    Info,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Release,
        EventKind::Start,
        EventKind::Complete,
        EventKind::Miss,
        EventKind::Overrun,
        EventKind::WatchdogPet,
        EventKind::LockTimeout,
        EventKind::Info,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Release => "RELEASE",
            EventKind::Start => "START",
            EventKind::Complete => "COMPLETE",
            EventKind::Miss => "MISS",
            EventKind::Overrun => "OVERRUN",
            EventKind::WatchdogPet => "WDT_PET",
            EventKind::LockTimeout => "LOCK_TIMEOUT",
            EventKind::Info => "INFO",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The string is not one of the known event names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEvent(pub String);

impl fmt::Display for UnknownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event name '{}'", self.0)
    }
}

impl std::error::Error for UnknownEvent {}

impl FromStr for EventKind {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

// ── Formatting ────────────────────────────────────────────────────────────────

/// Format one event record without emitting it.
pub fn format_event(timestamp: Millis, event: &str, task: &str, detail: &str) -> EventLine {
    EventLine::format(format_args!("{timestamp},{event},{task},{detail}"))
}

// ── EventLogger ───────────────────────────────────────────────────────────────

/// Writes event records to a sink, stamping each with the clock's time.
///
/// Safe to share between execution contexts: records from different callers
/// are serialized line by line.
pub struct EventLogger<W> {
    clock: Arc<dyn Clock>,
    out: LineWriter<W>,
}

impl<W: Write> EventLogger<W> {
    pub fn new(clock: Arc<dyn Clock>, sink: W) -> Self {
        Self {
            clock,
            out: LineWriter::new(sink),
        }
    }

    /// Emit `timestamp,event,task,detail`.
    pub fn log(&self, event: &str, task: &str, detail: &str) {
        let line = format_event(self.clock.now_ms(), event, task, detail);
        if line.truncated() {
            trace!(event, task, capacity = EVENT_LINE_CAPACITY, "event line truncated");
        }
        self.out.emit(line.as_str(), line.truncated());
    }

    pub fn log_event(&self, kind: EventKind, task: &str, detail: &str) {
        self.log(kind.as_str(), task, detail);
    }

    pub fn flush(&self) {
        self.out.flush();
    }

    pub fn stats(&self) -> SinkStats {
        self.out.stats()
    }

    pub fn into_sink(self) -> W {
        self.out.into_inner()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
