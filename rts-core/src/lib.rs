/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Periodic real-time job model with a shared critical-section resource,
//! timestamped event logging and a three-channel status plot feed.
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── clock         – wrapping u32 millisecond clock + wrap-safe comparisons
//! ├── job/          – periodic job descriptor, its errors and feasibility report
//! ├── resource      – FIFO hand-off mutual-exclusion resource
//! ├── line          – fixed-capacity, truncating line buffers
//! ├── sink          – serialized fire-and-forget line writers
//! ├── logger        – `timestamp,event,task,detail` event records
//! ├── plotter       – `v1 v2 v3` plot records
//! ├── indicator     – per-job status outputs
//! ├── config/       – YAML workload configuration
//! └── runtime/      – tokio host runtime that drives a workload
//! ```

pub mod clock;
pub mod config;
pub mod indicator;
pub mod job;
pub mod line;
pub mod logger;
pub mod plotter;
pub mod resource;
pub mod runtime;
pub mod sink;
