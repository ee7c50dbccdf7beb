// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared mocks and test harness for Imgpress integration tests.
//!
//! Provides [`StubCodec`] (scriptable codec), [`FlakyStore`] (failure
//! injection around a real store), and [`TestHarness`] (temp SQLite +
//! in-memory blob store).

pub mod flaky_store;
pub mod harness;
pub mod stub_codec;

pub use flaky_store::FlakyStore;
pub use harness::TestHarness;
pub use stub_codec::StubCodec;
