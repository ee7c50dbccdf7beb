// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `imgpress-core::types` for use across
//! trait boundaries. This module re-exports them for convenience within the
//! storage crate.

pub use imgpress_core::types::{
    ConversionStatus, ConversionTransition, FailOutcome, ImageRecord, NewImage, Page, QueueEntry,
    RetryCriteria, RetryStatusFilter,
};
