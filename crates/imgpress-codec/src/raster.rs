// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure-Rust WebP encoding: `image` decode, `webp` lossy encode.

use async_trait::async_trait;

use imgpress_core::{ImageCodec, ImgpressError};

/// Baseline codec with no external dependencies. Always available.
///
/// Decode and encode are CPU-bound, so the work runs on the blocking pool
/// rather than starving the async runtime on large images.
pub struct RasterCodec;

#[async_trait]
impl ImageCodec for RasterCodec {
    fn name(&self) -> &str {
        "raster"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn encode_webp(&self, source: &[u8], quality: u8) -> Result<Vec<u8>, ImgpressError> {
        let source = source.to_vec();
        tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ImgpressError> {
            let decoded =
                image::load_from_memory(&source).map_err(|e| ImgpressError::Codec {
                    message: format!("decode failed: {e}"),
                })?;
            // The webp encoder only accepts RGB8/RGBA8 buffers.
            let rgba = image::DynamicImage::ImageRgba8(decoded.to_rgba8());
            let encoder =
                webp::Encoder::from_image(&rgba).map_err(|e| ImgpressError::Codec {
                    message: format!("webp encoder rejected image: {e}"),
                })?;
            let encoded = encoder.encode(f32::from(quality));
            Ok(encoded.to_vec())
        })
        .await
        .map_err(|e| ImgpressError::Internal(format!("encode task panicked: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;

    fn tiny_png() -> Vec<u8> {
        let img = RgbaImage::from_fn(8, 8, |x, y| {
            image::Rgba([(x * 32) as u8, (y * 32) as u8, 128, 255])
        });
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn encodes_png_to_decodable_webp() {
        let codec = RasterCodec;
        let webp_bytes = codec.encode_webp(&tiny_png(), 85).await.unwrap();
        assert!(!webp_bytes.is_empty());

        let round_tripped = image::load_from_memory(&webp_bytes).unwrap();
        assert_eq!(round_tripped.width(), 8);
        assert_eq!(round_tripped.height(), 8);
    }

    #[tokio::test]
    async fn encodes_jpeg_input() {
        let img = RgbaImage::from_pixel(16, 16, image::Rgba([200, 40, 40, 255]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .to_rgb8()
            .write_to(&mut buf, ImageFormat::Jpeg)
            .unwrap();

        let codec = RasterCodec;
        let webp_bytes = codec.encode_webp(&buf.into_inner(), 80).await.unwrap();
        assert!(!webp_bytes.is_empty());
    }

    #[tokio::test]
    async fn garbage_input_is_a_codec_error() {
        let codec = RasterCodec;
        let err = codec.encode_webp(b"not an image at all", 80).await.unwrap_err();
        assert!(matches!(err, ImgpressError::Codec { .. }));
    }
}
