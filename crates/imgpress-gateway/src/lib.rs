// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Imgpress image conversion service.
//!
//! Exposes the upload boundary and owner-scoped image CRUD over a small
//! axum REST API. Authentication is out of scope: callers identify
//! themselves with an explicit `X-Owner-Id` header, which is threaded
//! through every service call rather than held as ambient state.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, build_router, serve};
