//! Shared fixtures for integration tests.

#![allow(dead_code)]

use image::{Luma, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

/// Write a 64x64 black/white checkerboard (very sharp).
pub fn sharp_png(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    ensure_parent(&path);
    image::GrayImage::from_fn(64, 64, |x, y| {
        if (x + y) % 2 == 0 {
            Luma([255])
        } else {
            Luma([0])
        }
    })
    .save(&path)
    .unwrap();
    path
}

/// Write a flat image of one colour (blur score 0).
pub fn flat_png(dir: &Path, name: &str, rgb: [u8; 3], width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    ensure_parent(&path);
    RgbImage::from_pixel(width, height, Rgb(rgb))
        .save(&path)
        .unwrap();
    path
}

/// Write a smooth diagonal gradient, optionally shifted in brightness.
pub fn gradient_png(dir: &Path, name: &str, size: u32, shift: u8) -> PathBuf {
    let path = dir.join(name);
    ensure_parent(&path);
    RgbImage::from_fn(size, size, |x, y| {
        let v = ((x + y) * 255 / (2 * size)) as u8;
        let v = v.saturating_add(shift);
        Rgb([v, v, v])
    })
    .save(&path)
    .unwrap();
    path
}

/// Write a gradient running along the other diagonal.
///
/// Uncorrelated with [`gradient_png`] once the mean is removed.
pub fn anti_gradient_png(dir: &Path, name: &str, size: u32) -> PathBuf {
    let path = dir.join(name);
    ensure_parent(&path);
    RgbImage::from_fn(size, size, |x, y| {
        let v = ((size - 1 - x + y) * 255 / (2 * size)) as u8;
        Rgb([v, v, v])
    })
    .save(&path)
    .unwrap();
    path
}

/// Write bytes that no decoder accepts.
pub fn broken_image(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    ensure_parent(&path);
    fs::write(&path, b"definitely not an image").unwrap();
    path
}

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
}
