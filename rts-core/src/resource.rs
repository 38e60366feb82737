/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The single shared mutual-exclusion resource.
//!
//! [`SharedResource<T>`] is a binary, non-reentrant lock around a value `T`
//! that several jobs update inside their critical sections.  It is created
//! once by the runtime and handed to each job as an `Arc` at construction, so
//! tests can build an isolated instance per case.
//!
//! # Wake order
//! Ownership is handed over in strict FIFO order of arrival.  On release the
//! owner passes ownership directly to the oldest waiter (if any); a newcomer
//! can never barge ahead of a queued waiter.  All waiters share one condvar,
//! but only the waiter whose ticket was handed ownership proceeds.
//!
//! # Timeouts
//! [`SharedResource::try_acquire_for`] gives up after the timeout, leaves the
//! queue, and returns [`ResourceError::Timeout`].  There is no path that
//! yields access to `T` without ownership.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why an acquisition did not yield ownership.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// No ownership within the requested timeout.  The caller must skip,
    /// retry or abort its critical section.
    #[error("timed out after {waited_ms} ms waiting for resource '{resource}'")]
    Timeout { resource: String, waited_ms: u64 },

    /// The calling execution context already owns the resource.
    #[error("resource '{resource}' is already held by this execution context (not reentrant)")]
    Reentrant { resource: String },

    /// The internal queue lock was poisoned by a panic.
    #[error("internal state of resource '{resource}' is poisoned")]
    Poisoned { resource: String },
}

// ── Internal state ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Owner {
    ticket: u64,
    thread: ThreadId,
}

#[derive(Debug, Default)]
struct QueueState {
    owner: Option<Owner>,
    waiters: VecDeque<Owner>,
    next_ticket: u64,
    stats: ResourceStats,
}

/// Counters kept by a [`SharedResource`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceStats {
    /// Successful acquisitions.
    pub acquisitions: u64,
    /// Acquisitions that had to queue behind another owner.
    pub contended: u64,
    /// Acquisitions abandoned on timeout.
    pub timeouts: u64,
}

// ── SharedResource ────────────────────────────────────────────────────────────

pub struct SharedResource<T> {
    name: String,
    queue: Mutex<QueueState>,
    handoff: Condvar,
    data: Mutex<T>,
}

impl<T> SharedResource<T> {
    pub fn new(name: impl Into<String>, value: T) -> Self {
        Self {
            name: name.into(),
            queue: Mutex::new(QueueState::default()),
            handoff: Condvar::new(),
            data: Mutex::new(value),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until exclusive ownership is obtained.
    pub fn acquire(&self) -> Result<ResourceGuard<'_, T>, ResourceError> {
        self.acquire_timeout(None)
    }

    /// Block for at most `timeout`.
    pub fn try_acquire_for(&self, timeout: Duration) -> Result<ResourceGuard<'_, T>, ResourceError> {
        self.acquire_timeout(Some(timeout))
    }

    /// Acquire with an optional timeout; `None` waits indefinitely.
    pub fn acquire_timeout(
        &self,
        timeout: Option<Duration>,
    ) -> Result<ResourceGuard<'_, T>, ResourceError> {
        let me = Owner {
            ticket: 0,
            thread: thread::current().id(),
        };
        let started = Instant::now();
        let mut queue = self.lock_queue()?;

        if queue.owner.is_some_and(|o| o.thread == me.thread)
            || queue.waiters.iter().any(|w| w.thread == me.thread)
        {
            return Err(ResourceError::Reentrant {
                resource: self.name.clone(),
            });
        }

        let me = Owner {
            ticket: queue.next_ticket,
            ..me
        };
        queue.next_ticket = queue.next_ticket.wrapping_add(1);

        if queue.owner.is_none() && queue.waiters.is_empty() {
            queue.owner = Some(me);
        } else {
            queue.stats.contended += 1;
            queue.waiters.push_back(me);
            debug!(
                resource = %self.name,
                ticket = me.ticket,
                queued = queue.waiters.len(),
                "waiting for shared resource"
            );

            let deadline = timeout.map(|t| started + t);
            while queue.owner.map(|o| o.ticket) != Some(me.ticket) {
                queue = match deadline {
                    None => self.handoff.wait(queue).map_err(|_| self.poisoned())?,
                    Some(deadline) => {
                        let now = Instant::now();
                        if now >= deadline {
                            queue.waiters.retain(|w| w.ticket != me.ticket);
                            queue.stats.timeouts += 1;
                            let waited_ms = started.elapsed().as_millis() as u64;
                            warn!(resource = %self.name, waited_ms, "shared resource acquisition timed out");
                            return Err(ResourceError::Timeout {
                                resource: self.name.clone(),
                                waited_ms,
                            });
                        }
                        self.handoff
                            .wait_timeout(queue, deadline - now)
                            .map_err(|_| self.poisoned())?
                            .0
                    }
                };
            }
        }

        queue.stats.acquisitions += 1;
        drop(queue);

        // The queue above is the real lock; `data` is never contended, and a
        // panic inside an earlier critical section must not wedge it.
        let data = self.data.lock().unwrap_or_else(PoisonError::into_inner);

        Ok(ResourceGuard {
            resource: self,
            data,
            acquired_at: Instant::now(),
        })
    }

    /// `true` while some context owns the resource.
    pub fn is_locked(&self) -> bool {
        self.lock_queue().map(|q| q.owner.is_some()).unwrap_or(false)
    }

    /// Number of contexts queued behind the current owner.
    pub fn waiting(&self) -> usize {
        self.lock_queue().map(|q| q.waiters.len()).unwrap_or(0)
    }

    pub fn stats(&self) -> ResourceStats {
        self.lock_queue().map(|q| q.stats).unwrap_or_default()
    }

    fn release_ownership(&self) {
        // Poisoning here would need a panic while the queue lock is held,
        // which none of the paths above can do.
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.owner = queue.waiters.pop_front();
        if let Some(next) = queue.owner {
            debug!(resource = %self.name, ticket = next.ticket, "ownership handed to next waiter");
            drop(queue);
            self.handoff.notify_all();
        }
    }

    fn lock_queue(&self) -> Result<MutexGuard<'_, QueueState>, ResourceError> {
        self.queue.lock().map_err(|_| self.poisoned())
    }

    fn poisoned(&self) -> ResourceError {
        ResourceError::Poisoned {
            resource: self.name.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SharedResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedResource")
            .field("name", &self.name)
            .field("locked", &self.is_locked())
            .field("waiting", &self.waiting())
            .finish()
    }
}

// ── ResourceGuard ─────────────────────────────────────────────────────────────

/// Proof of ownership.  Dropping it (or calling [`release`](Self::release))
/// hands the resource to the next waiter.
pub struct ResourceGuard<'a, T> {
    resource: &'a SharedResource<T>,
    data: MutexGuard<'a, T>,
    acquired_at: Instant,
}

impl<T> ResourceGuard<'_, T> {
    /// How long this guard has held the resource.
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    pub fn release(self) {
        drop(self);
    }
}

impl<T> Deref for ResourceGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> DerefMut for ResourceGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.data
    }
}

impl<T> Drop for ResourceGuard<'_, T> {
    fn drop(&mut self) {
        self.resource.release_ownership();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn wait_for_waiters<T>(res: &SharedResource<T>, n: usize) {
        let start = Instant::now();
        while res.waiting() < n {
            assert!(
                start.elapsed() < Duration::from_secs(5),
                "waiters never reached {n}"
            );
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn acquire_and_mutate() {
        let res = SharedResource::new("counter", 0u32);
        {
            let mut g = res.acquire().unwrap();
            *g += 5;
            assert!(res.is_locked());
        }
        assert!(!res.is_locked());
        assert_eq!(*res.acquire().unwrap(), 5);
        assert_eq!(res.stats().acquisitions, 2);
    }

    #[test]
    fn same_context_cannot_reacquire() {
        let res = SharedResource::new("shared", ());
        let _g = res.acquire().unwrap();
        let err = res.try_acquire_for(Duration::from_millis(1)).err();
        assert!(matches!(err, Some(ResourceError::Reentrant { .. })));
    }

    #[test]
    fn three_contexts_never_own_simultaneously() {
        let res = Arc::new(SharedResource::new("shared", 0u64));
        let inside = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..3)
            .map(|_| {
                let res = Arc::clone(&res);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let mut g = res.acquire().unwrap();
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0, "two owners at once");
                        *g += 1;
                        thread::yield_now();
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(*res.acquire().unwrap(), 600);
    }

    #[test]
    fn ownership_is_handed_over_in_arrival_order() {
        let res = Arc::new(SharedResource::new("order", Vec::<usize>::new()));
        let holder = res.acquire().unwrap();

        let mut handles = Vec::new();
        for id in 0..3 {
            let r = Arc::clone(&res);
            handles.push(thread::spawn(move || {
                r.acquire().unwrap().push(id);
            }));
            wait_for_waiters(&res, id + 1);
        }

        holder.release();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*res.acquire().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn timeout_is_reported_and_leaves_the_queue() {
        let res = Arc::new(SharedResource::new("slow", ()));
        let holder = res.acquire().unwrap();

        let r = Arc::clone(&res);
        let result = thread::spawn(move || {
            r.try_acquire_for(Duration::from_millis(20)).map(|_| ())
        })
        .join()
        .unwrap();

        assert!(matches!(result, Err(ResourceError::Timeout { .. })));
        assert_eq!(res.waiting(), 0);
        assert_eq!(res.stats().timeouts, 1);

        holder.release();
        assert!(!res.is_locked(), "release after a timed-out waiter must free the lock");
    }

    #[test]
    fn waiter_with_timeout_gets_ownership_when_released_in_time() {
        let res = Arc::new(SharedResource::new("quick", 0u8));
        let holder = res.acquire().unwrap();

        let r = Arc::clone(&res);
        let waiter = thread::spawn(move || {
            r.try_acquire_for(Duration::from_secs(5)).map(|mut g| {
                *g = 7;
            })
        });
        wait_for_waiters(&res, 1);
        holder.release();

        assert!(waiter.join().unwrap().is_ok());
        assert_eq!(*res.acquire().unwrap(), 7);
        assert_eq!(res.stats().contended, 1);
    }
}
