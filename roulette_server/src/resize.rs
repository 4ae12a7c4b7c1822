use std::io::Cursor;

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};
use tracing::{debug, warn};

#[derive(thiserror::Error, Debug)]
pub enum ResizeError {
    #[error("decode/encode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("resize task aborted")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeSettings {
    /// Longest side after resizing; 0 stores uploads untouched.
    pub max_dimension: u32,
    pub quality: u8,
}

impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            max_dimension: 600,
            quality: 85,
        }
    }
}

/// Fits `width x height` inside a `max` square, keeping aspect ratio.
/// Never upscales.
pub fn target_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    let scale = |side: u32, long: u32| ((side as f64 * max as f64) / long as f64).round().max(1.0) as u32;
    if width > height {
        if width > max {
            return (max, scale(height, width));
        }
    } else if height > max {
        return (scale(width, height), max);
    }
    (width, height)
}

/// Decodes `bytes`, shrinks to `max_dimension`, and re-encodes as JPEG.
pub fn resize(bytes: &[u8], max_dimension: u32, quality: u8) -> Result<Vec<u8>, ResizeError> {
    let img = image::load_from_memory(bytes)?;
    let (w, h) = target_dimensions(img.width(), img.height(), max_dimension);
    let resized = if (w, h) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Triangle)
    };
    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(resized.to_rgb8()).write_with_encoder(encoder)?;
    Ok(out.into_inner())
}

/// Runs [`resize`] off the async workers. Returns the bytes to store and
/// their extension; on failure the original upload is kept.
pub async fn process_upload(settings: ResizeSettings, bytes: Vec<u8>, ext: String) -> (Vec<u8>, String) {
    if settings.max_dimension == 0 {
        return (bytes, ext);
    }
    let original_len = bytes.len();
    let input = bytes.clone();
    let result = tokio::task::spawn_blocking(move || {
        resize(&input, settings.max_dimension, settings.quality)
    })
    .await
    .map_err(ResizeError::from)
    .and_then(|r| r);
    match result {
        Ok(resized) => {
            debug!(original_len, resized_len = resized.len(), "upload resized");
            (resized, "jpg".to_string())
        }
        Err(err) => {
            warn!(error = %err, "resize failed, storing original");
            (bytes, ext)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| image::Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn landscape_and_portrait_fit() {
        assert_eq!(target_dimensions(1200, 800, 600), (600, 400));
        assert_eq!(target_dimensions(800, 1200, 600), (400, 600));
        assert_eq!(target_dimensions(1000, 1000, 600), (600, 600));
        assert_eq!(target_dimensions(300, 200, 600), (300, 200));
    }

    #[test]
    fn resize_shrinks_and_reencodes() {
        let out = resize(&png(1200, 800), 600, 85).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (600, 400));
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(resize(b"not an image", 600, 85).is_err());
    }

    #[tokio::test]
    async fn failed_resize_keeps_original() {
        let (bytes, ext) = process_upload(ResizeSettings::default(), b"nope".to_vec(), "png".into()).await;
        assert_eq!(bytes, b"nope");
        assert_eq!(ext, "png");
    }

    #[tokio::test]
    async fn disabled_resize_is_passthrough() {
        let settings = ResizeSettings {
            max_dimension: 0,
            quality: 85,
        };
        let original = png(20, 10);
        let (bytes, ext) = process_upload(settings, original.clone(), "png".into()).await;
        assert_eq!(bytes, original);
        assert_eq!(ext, "png");
    }
}
