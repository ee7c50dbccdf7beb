// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The asynchronous conversion pipeline for the Imgpress service.
//!
//! This crate holds the parts with real behavior: the pure conversion
//! [`policy`], the [`ConversionJob`](job::ConversionJob) state machine, the
//! [`WorkerPool`](worker::WorkerPool) driving the durable queue, the
//! [`RetrySweeper`](sweeper::RetrySweeper) that rehabilitates failed
//! conversions, and the [`ImageService`](upload::ImageService) upload/dedup
//! front door.

pub mod job;
pub mod policy;
pub mod sweeper;
pub mod upload;
pub mod worker;

pub use job::{ConversionJob, JobOutcome};
pub use sweeper::{RetrySweeper, SweepOutcome};
pub use upload::{ImageService, UploadOutcome, UploadRequest};
pub use worker::WorkerPool;
