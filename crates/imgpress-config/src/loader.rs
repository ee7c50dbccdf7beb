// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./imgpress.toml` > `~/.config/imgpress/imgpress.toml`
//! > `/etc/imgpress/imgpress.toml` with environment variable overrides via
//! `IMGPRESS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ImgpressConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/imgpress/imgpress.toml` (system-wide)
/// 3. `~/.config/imgpress/imgpress.toml` (user XDG config)
/// 4. `./imgpress.toml` (local directory)
/// 5. `IMGPRESS_*` environment variables
pub fn load_config() -> Result<ImgpressConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ImgpressConfig::default()))
        .merge(Toml::file("/etc/imgpress/imgpress.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("imgpress/imgpress.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("imgpress.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ImgpressConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ImgpressConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ImgpressConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ImgpressConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `IMGPRESS_UPLOAD_MAX_SIZE_BYTES` must map
/// to `upload.max_size_bytes`, not `upload.max.size.bytes`.
fn env_provider() -> Env {
    Env::prefixed("IMGPRESS_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: IMGPRESS_STORAGE_DATABASE_PATH -> "storage_database_path"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("service_", "service.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("blob_", "blob.", 1)
            .replacen("upload_", "upload.", 1)
            .replacen("conversion_", "conversion.", 1)
            .replacen("retry_", "retry.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
