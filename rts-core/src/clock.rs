/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Millisecond clock source shared by every component.
//!
//! Timestamps are `u32` milliseconds that wrap at 2^32 (about 49.7 days), the
//! same width as a microcontroller `millis()` counter.  Raw `<` / `>` on two
//! timestamps is wrong across the wrap, so every comparison in the crate goes
//! through [`reached`], [`is_after`] or [`elapsed_ms`], which use the signed
//! wrapping difference.  This is correct as long as the two instants are less
//! than 2^31 ms apart.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// A millisecond timestamp, wrapping at 2^32.
pub type Millis = u32;

// ── Wrap-safe comparisons ─────────────────────────────────────────────────────

/// `true` once `now` is at or past `target`.
pub fn reached(now: Millis, target: Millis) -> bool {
    (now.wrapping_sub(target) as i32) >= 0
}

/// `true` if `a` is strictly later than `b`.
pub fn is_after(a: Millis, b: Millis) -> bool {
    (a.wrapping_sub(b) as i32) > 0
}

/// Milliseconds from `since` to `now`.
pub fn elapsed_ms(since: Millis, now: Millis) -> u32 {
    now.wrapping_sub(since)
}

// ── Clock trait ───────────────────────────────────────────────────────────────

/// Monotonic millisecond counter.
///
/// Implementations must be non-blocking and callable from any execution
/// context; the trait is `Send + Sync` so one clock can be shared through an
/// `Arc<dyn Clock>`.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> Millis;
}

/// Host clock backed by [`Instant`], counting from construction.
///
/// The elapsed time is truncated to 32 bits, so it wraps exactly like the
/// hardware counter it stands in for.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_millis() as u64 as u32
    }
}

/// Hand-driven clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU32,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: AtomicU32::new(start),
        }
    }

    pub fn set(&self, now: Millis) {
        self.now.store(now, Ordering::Release);
    }

    /// Advance by `delta` ms, wrapping at 2^32.  Returns the new time.
    pub fn advance(&self, delta: u32) -> Millis {
        self.now
            .fetch_add(delta, Ordering::AcqRel)
            .wrapping_add(delta)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::Acquire)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reached_is_inclusive() {
        assert!(reached(100, 100));
        assert!(reached(101, 100));
        assert!(!reached(99, 100));
    }

    #[test]
    fn comparisons_survive_wraparound() {
        let before_wrap = u32::MAX - 5;
        let after_wrap = 10u32; // 16 ms later
        assert!(reached(after_wrap, before_wrap));
        assert!(is_after(after_wrap, before_wrap));
        assert!(!is_after(before_wrap, after_wrap));
        assert_eq!(elapsed_ms(before_wrap, after_wrap), 16);
    }

    #[test]
    fn is_after_is_strict() {
        assert!(!is_after(500, 500));
        assert!(is_after(501, 500));
    }

    #[test]
    fn manual_clock_advances_and_wraps() {
        let clock = ManualClock::new(u32::MAX - 1);
        assert_eq!(clock.advance(3), 1);
        assert_eq!(clock.now_ms(), 1);
        clock.set(12_345);
        assert_eq!(clock.now_ms(), 12_345);
    }

    #[test]
    fn system_clock_is_non_decreasing() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(reached(b, a));
    }
}
