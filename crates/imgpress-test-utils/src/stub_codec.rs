// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scriptable codec for pipeline tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use imgpress_core::{ImageCodec, ImgpressError};

/// Codec that returns canned bytes, optionally failing or stalling first.
///
/// Records every call so tests can assert how often the pipeline reached
/// the encode step.
pub struct StubCodec {
    output: Vec<u8>,
    fail_remaining: Mutex<u64>,
    delay: Option<Duration>,
    calls: Mutex<u64>,
}

impl StubCodec {
    /// Succeed on every call, returning `output`.
    pub fn returning(output: Vec<u8>) -> Self {
        Self {
            output,
            fail_remaining: Mutex::new(0),
            delay: None,
            calls: Mutex::new(0),
        }
    }

    /// Fail on every call.
    pub fn failing() -> Self {
        Self {
            output: Vec::new(),
            fail_remaining: Mutex::new(u64::MAX),
            delay: None,
            calls: Mutex::new(0),
        }
    }

    /// Fail the first `n` calls, then succeed with `output`.
    pub fn failing_times(n: u64, output: Vec<u8>) -> Self {
        Self {
            output,
            fail_remaining: Mutex::new(n),
            delay: None,
            calls: Mutex::new(0),
        }
    }

    /// Stall every call by `delay` before answering (exercises timeouts).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of encode calls observed.
    pub fn calls(&self) -> u64 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ImageCodec for StubCodec {
    fn name(&self) -> &str {
        "stub"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn encode_webp(&self, _source: &[u8], _quality: u8) -> Result<Vec<u8>, ImgpressError> {
        *self.calls.lock().unwrap() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let should_fail = {
            let mut remaining = self.fail_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                true
            } else {
                false
            }
        };
        if should_fail {
            return Err(ImgpressError::Codec {
                message: "stub codec failure".to_string(),
            });
        }
        Ok(self.output.clone())
    }
}
