//! Image inspection utilities for testing.
//!
//! This module provides helper functions for decoding and inspecting the
//! rasters the renderers produce.

#![allow(dead_code)]

use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, Rgba, RgbaImage};

/// Load an image from a byte array
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes)
}

/// Detect image format from bytes
pub fn detect_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Check if an image has the expected dimensions
pub fn assert_image_dimensions(
    image: &DynamicImage,
    expected_width: u32,
    expected_height: u32,
) -> Result<(), String> {
    let (actual_width, actual_height) = image.dimensions();

    if actual_width != expected_width || actual_height != expected_height {
        return Err(format!(
            "Image dimensions differ: actual = {}x{}, expected = {}x{}",
            actual_width, actual_height, expected_width, expected_height
        ));
    }

    Ok(())
}

/// Check if an image has the expected format
pub fn assert_image_format(bytes: &[u8], expected_format: ImageFormat) -> Result<(), String> {
    let actual_format =
        detect_image_format(bytes).ok_or_else(|| "Could not detect image format".to_string())?;

    if actual_format != expected_format {
        return Err(format!(
            "Image format differs: actual = {:?}, expected = {:?}",
            actual_format, expected_format
        ));
    }

    Ok(())
}

/// Count pixels matching a colour within a per-channel tolerance
pub fn count_pixels(image: &RgbaImage, color: [u8; 4], tolerance: u8) -> usize {
    image
        .pixels()
        .filter(|Rgba(p)| {
            p.iter()
                .zip(color.iter())
                .all(|(a, b)| (*a as i16 - *b as i16).unsigned_abs() <= tolerance as u16)
        })
        .count()
}

/// Count pixels that are neither white nor fully transparent
pub fn count_ink_pixels(image: &RgbaImage) -> usize {
    image
        .pixels()
        .filter(|Rgba([r, g, b, a])| *a > 0 && (*r < 250 || *g < 250 || *b < 250))
        .count()
}

/// Colour of the pixel at figure fractions `(fx, fy)`, origin top left
pub fn pixel_at_fraction(image: &RgbaImage, fx: f64, fy: f64) -> [u8; 4] {
    let x = ((image.width() - 1) as f64 * fx).round() as u32;
    let y = ((image.height() - 1) as f64 * fy).round() as u32;
    image.get_pixel(x, y).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_pixels() {
        let mut img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        img.put_pixel(1, 1, Rgba([0, 0, 0, 255]));
        img.put_pixel(2, 2, Rgba([3, 0, 0, 255]));

        assert_eq!(count_pixels(&img, [0, 0, 0, 255], 0), 1);
        assert_eq!(count_pixels(&img, [0, 0, 0, 255], 3), 2);
        assert_eq!(count_ink_pixels(&img), 2);
    }
}
