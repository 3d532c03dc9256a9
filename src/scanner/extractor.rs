//! Scalar image metrics behind the [`FeatureExtractor`] contract.
//!
//! The batch scanner never touches pixels itself: it calls a
//! [`FeatureExtractor`] from worker threads and treats every error as a
//! per-file failure. [`ImageMetrics`] is the built-in implementation on top
//! of the `image` crate.
//!
//! - **Blur**: variance of the 4-neighbour Laplacian over the grayscale image
//!   (higher is sharper)
//! - **Brightness**: mean of the HSV value channel, `max(r, g, b)`, in `[0, 255]`
//! - **Dimensions**: read from the image header without decoding pixels

use std::path::Path;

use image::{DynamicImage, GrayImage};

use super::ExtractError;

/// Per-image quality metrics.
///
/// Implementations must be pure and safe to call concurrently.
pub trait FeatureExtractor: Send + Sync {
    /// Sharpness score; higher is sharper.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the image cannot be read or decoded.
    fn blur_score(&self, path: &Path) -> Result<f64, ExtractError>;

    /// Mean brightness in `[0, 255]`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the image cannot be read or decoded.
    fn brightness_score(&self, path: &Path) -> Result<f64, ExtractError>;

    /// Pixel dimensions `(width, height)`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] when the image header cannot be read.
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), ExtractError>;
}

/// Built-in metrics using the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageMetrics;

impl ImageMetrics {
    /// Create the metrics extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn open(path: &Path) -> Result<DynamicImage, ExtractError> {
        image::open(path).map_err(|source| ExtractError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl FeatureExtractor for ImageMetrics {
    fn blur_score(&self, path: &Path) -> Result<f64, ExtractError> {
        let gray = Self::open(path)?.to_luma8();
        Ok(laplacian_variance(&gray))
    }

    fn brightness_score(&self, path: &Path) -> Result<f64, ExtractError> {
        Ok(mean_value_channel(&Self::open(path)?))
    }

    fn dimensions(&self, path: &Path) -> Result<(u32, u32), ExtractError> {
        image::image_dimensions(path).map_err(|source| ExtractError::Decode {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Variance of the Laplacian response over interior pixels.
///
/// Kernel `[0 1 0; 1 -4 1; 0 1 0]`. Images smaller than 3x3 score `0.0`.
#[must_use]
pub fn laplacian_variance(image: &GrayImage) -> f64 {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let px = |x: u32, y: u32| f64::from(image.get_pixel(x, y)[0]);
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut count = 0u64;

    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let response = px(x, y - 1) + px(x - 1, y) + px(x + 1, y) + px(x, y + 1)
                - 4.0 * px(x, y);
            sum += response;
            sum_sq += response * response;
            count += 1;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

/// Mean of the HSV value channel.
#[must_use]
pub fn mean_value_channel(image: &DynamicImage) -> f64 {
    let rgb = image.to_rgb8();
    let total = u64::from(rgb.width()) * u64::from(rgb.height());
    if total == 0 {
        return 0.0;
    }

    let sum: u64 = rgb
        .pixels()
        .map(|p| u64::from(p[0].max(p[1]).max(p[2])))
        .sum();
    sum as f64 / total as f64
}
