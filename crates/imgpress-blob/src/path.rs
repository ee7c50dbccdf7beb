// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blob key validation.
//!
//! All blob keys are relative paths under the store root. A key must not be
//! absolute, empty, or contain `..` components -- backends reject such keys
//! before touching the filesystem.

use std::path::{Component, Path};

use imgpress_core::ImgpressError;

/// Validate a blob key before it reaches a backend.
pub fn validate(key: &str) -> Result<(), ImgpressError> {
    if key.is_empty() {
        return Err(ImgpressError::Blob {
            message: "blob key must not be empty".to_string(),
            source: None,
        });
    }
    let path = Path::new(key);
    if path.is_absolute() {
        return Err(ImgpressError::Blob {
            message: format!("blob key `{key}` must be relative"),
            source: None,
        });
    }
    for component in path.components() {
        match component {
            Component::Normal(_) => {}
            _ => {
                return Err(ImgpressError::Blob {
                    message: format!("blob key `{key}` escapes the store root"),
                    source: None,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_relative_keys() {
        assert!(validate("images/42/image_1700000000_a1b2c3d4.jpg").is_ok());
        assert!(validate("single.webp").is_ok());
    }

    #[test]
    fn rejects_empty_absolute_and_traversal_keys() {
        assert!(validate("").is_err());
        assert!(validate("/etc/passwd").is_err());
        assert!(validate("images/../../secrets").is_err());
        assert!(validate("./images/a.jpg").is_err());
    }
}
