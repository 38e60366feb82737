/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Line sinks shared by the event logger and the status plotter.
//!
//! Any `std::io::Write` can be a sink (stdout, a file, a serial port handle).
//! The sink sits behind a mutex so concurrent callers never interleave partial
//! lines.  Writes are fire-and-forget: a failed write is counted and dropped.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Counters for one output channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Lines handed to the sink successfully.
    pub written: u64,
    /// Lines emitted with their tail cut off.
    pub truncated: u64,
    /// Lines lost because the sink returned an error.
    pub dropped: u64,
}

/// A serialized line writer with drop-on-error semantics.
#[derive(Debug)]
pub(crate) struct LineWriter<W> {
    sink: Mutex<W>,
    written: AtomicU64,
    truncated: AtomicU64,
    dropped: AtomicU64,
}

impl<W: Write> LineWriter<W> {
    pub(crate) fn new(sink: W) -> Self {
        Self {
            sink: Mutex::new(sink),
            written: AtomicU64::new(0),
            truncated: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Write `line` plus a newline as one unit.
    pub(crate) fn emit(&self, line: &str, truncated: bool) {
        if truncated {
            self.truncated.fetch_add(1, Ordering::Relaxed);
        }
        // One write per line: two writers sharing stdout must not split it.
        let mut framed = Vec::with_capacity(line.len() + 1);
        framed.extend_from_slice(line.as_bytes());
        framed.push(b'\n');

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        match sink.write_all(&framed) {
            Ok(()) => self.written.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.dropped.fetch_add(1, Ordering::Relaxed),
        };
    }

    pub(crate) fn flush(&self) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = sink.flush();
    }

    pub(crate) fn stats(&self) -> SinkStats {
        SinkStats {
            written: self.written.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── MemorySink ────────────────────────────────────────────────────────────────

/// In-memory sink whose clones share one buffer.
///
/// Lets a test (or an embedding application) hand a sink to a logger and read
/// back what was written while the logger is still alive.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, split into lines.
    pub fn lines(&self) -> Vec<String> {
        let buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl Write for MemorySink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// A sink that always fails, like an unplugged serial port.
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn emitted_lines_are_newline_terminated() {
        let sink = MemorySink::new();
        let writer = LineWriter::new(sink.clone());
        writer.emit("a", false);
        writer.emit("b", true);
        assert_eq!(sink.lines(), vec!["a", "b"]);
        assert_eq!(
            writer.stats(),
            SinkStats {
                written: 2,
                truncated: 1,
                dropped: 0
            }
        );
    }

    #[test]
    fn write_errors_are_counted_not_propagated() {
        let writer = LineWriter::new(BrokenSink);
        writer.emit("lost", false);
        writer.flush();
        assert_eq!(writer.stats().dropped, 1);
        assert_eq!(writer.stats().written, 0);
    }
}
