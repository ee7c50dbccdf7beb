// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure conversion policy: output path derivation, quality selection, and
//! the original-deletion decision. No side effects, deterministic.

/// Extensions recognized as replaceable when deriving the WebP output path.
const REPLACEABLE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "jfif"];

/// Derive the WebP output path for an original path.
///
/// A recognized extension (case-insensitive) is replaced with `.webp`;
/// anything else gets `.webp` appended. The result is always distinct from
/// the input.
pub fn derive_webp_path(original: &str) -> String {
    if let Some(idx) = original.rfind('.') {
        let ext = &original[idx + 1..];
        if !ext.contains('/')
            && REPLACEABLE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        {
            return format!("{}.webp", &original[..idx]);
        }
    }
    format!("{original}.webp")
}

/// WebP encode quality for a source MIME type.
pub fn select_quality(mime: &str) -> u8 {
    // JPEG sources tolerate harder compression without visible loss.
    if mime.contains("jpeg") || mime.contains("jpg") {
        return 80;
    }
    // PNG (often carrying alpha) and anything unrecognized get a gentler
    // setting.
    85
}

/// Whether the original blob should be deleted after a successful conversion.
///
/// Keep both files only when the WebP grew by more than 20%; ties and modest
/// growth still delete -- WebP is trusted by default.
pub fn should_delete_original(original_size: u64, webp_size: u64) -> bool {
    if webp_size as f64 > original_size as f64 * 1.2 {
        return false;
    }
    true
}

/// Percentage saved by the conversion, rounded to two decimals.
/// Zero when the original size is unknown-zero.
pub fn compression_ratio(original_size: u64, new_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }
    let ratio = (1.0 - new_size as f64 / original_size as f64) * 100.0;
    (ratio * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_webp_path_replaces_known_extensions() {
        assert_eq!(derive_webp_path("images/1/photo.jpg"), "images/1/photo.webp");
        assert_eq!(derive_webp_path("images/1/photo.JPEG"), "images/1/photo.webp");
        assert_eq!(derive_webp_path("images/1/photo.png"), "images/1/photo.webp");
        assert_eq!(derive_webp_path("images/1/photo.jfif"), "images/1/photo.webp");
    }

    #[test]
    fn derive_webp_path_appends_for_unknown_extensions() {
        assert_eq!(derive_webp_path("images/1/photo.gif"), "images/1/photo.gif.webp");
        assert_eq!(derive_webp_path("images/1/noext"), "images/1/noext.webp");
        // A dot inside a directory name is not an extension.
        assert_eq!(derive_webp_path("dir.jpg/file"), "dir.jpg/file.webp");
    }

    #[test]
    fn derive_webp_path_never_returns_input_unchanged() {
        for path in [
            "a.jpg", "a.jpeg", "a.png", "a.jfif", "a.webp", "a", "a.tar.png",
        ] {
            assert_ne!(derive_webp_path(path), path);
        }
    }

    #[test]
    fn quality_table_is_fixed() {
        assert_eq!(select_quality("image/jpeg"), 80);
        assert_eq!(select_quality("image/jpg"), 80);
        assert_eq!(select_quality("image/png"), 85);
        assert_eq!(select_quality("image/gif"), 85);
        assert_eq!(select_quality(""), 85);
    }

    #[test]
    fn delete_decision_keeps_both_only_past_twenty_percent_growth() {
        assert!(!should_delete_original(100, 121));
        assert!(should_delete_original(100, 120));
        assert!(should_delete_original(100, 100));
        assert!(should_delete_original(100, 95));
        assert!(should_delete_original(100, 10));
    }

    #[test]
    fn compression_ratio_rounds_to_two_decimals() {
        assert_eq!(compression_ratio(1000, 600), 40.0);
        assert_eq!(compression_ratio(3, 1), 66.67);
        assert_eq!(compression_ratio(0, 600), 0.0);
        // Growth yields a negative saving.
        assert_eq!(compression_ratio(100, 121), -21.0);
    }
}
