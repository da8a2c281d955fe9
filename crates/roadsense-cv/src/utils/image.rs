//! Image encoding utilities for report snapshots

use crate::Result;
use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How much fidelity a stored snapshot keeps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// JPEG quality, 1-100
    pub jpeg_quality: u8,
    /// Downscale wider frames to this width, keeping the aspect ratio
    pub max_width: Option<u32>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 50,
            max_width: None,
        }
    }
}

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Encode a frame as a `data:image/jpeg;base64,...` URL
    pub fn snapshot_data_url(rgba_image: &image::RgbaImage, config: &SnapshotConfig) -> Result<String> {
        let rgb_image = Self::rgba_to_rgb(&Self::downscale(rgba_image, config.max_width));

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, config.jpeg_quality.clamp(1, 100))
            .encode_image(&rgb_image)
            .context("Failed to encode snapshot as JPEG")?;

        Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&jpeg)))
    }

    /// Shrink to `max_width` if the image is wider
    pub fn downscale(rgba_image: &image::RgbaImage, max_width: Option<u32>) -> image::RgbaImage {
        let (width, height) = rgba_image.dimensions();
        match max_width {
            Some(max) if max > 0 && width > max => {
                let scaled_height = ((u64::from(height) * u64::from(max)) / u64::from(width)).max(1) as u32;
                imageops::resize(rgba_image, max, scaled_height, FilterType::Triangle)
            }
            _ => rgba_image.clone(),
        }
    }

    /// Convert RGBA to RGB using image crate
    pub fn rgba_to_rgb(rgba_image: &image::RgbaImage) -> image::RgbImage {
        let (width, height) = rgba_image.dimensions();
        image::RgbImage::from_fn(width, height, |x, y| {
            let rgba_pixel = rgba_image.get_pixel(x, y);
            image::Rgb([rgba_pixel[0], rgba_pixel[1], rgba_pixel[2]])
        })
    }

    /// Save an image, format chosen from the extension
    pub fn save_image<P: AsRef<Path>>(rgba_image: &image::RgbaImage, path: P) -> Result<()> {
        rgba_image
            .save(path.as_ref())
            .with_context(|| format!("Failed to save image: {:?}", path.as_ref()))
    }
}
