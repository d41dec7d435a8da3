//! Still-image helpers: bounding, resampling and PNG encoding.

use std::io::Cursor;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::error::ConversionError;

/// Dimensions that fit `(width, height)` inside a `max x max` box with the larger side
/// exactly `max`. Returns `None` when the image is already within bounds.
pub fn fit_dimensions(width: u32, height: u32, max: u32) -> Option<(u32, u32)> {
    if width <= max && height <= max {
        return None;
    }

    let scaled = |side: u32, longest: u32| -> u32 {
        let value = (side as f64 * max as f64 / longest as f64).round() as u32;
        value.clamp(1, max)
    };

    if width >= height {
        Some((max, scaled(height, width)))
    } else {
        Some((scaled(width, height), max))
    }
}

pub fn encode_png(image: &DynamicImage) -> Result<Bytes, ConversionError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| ConversionError::Encode(e.to_string()))?;
    Ok(Bytes::from(buffer))
}

/// Convert one still image to a size-bounded PNG.
///
/// PNG input within bounds is returned byte-identical. Other input within bounds is
/// re-encoded without resampling. Oversized input is resized with Lanczos3.
pub fn image_to_png(bytes: &[u8], max_dimension: u32) -> Result<Bytes, ConversionError> {
    let image = image::load_from_memory(bytes)?;
    let (width, height) = image.dimensions();

    match fit_dimensions(width, height, max_dimension) {
        None if image::guess_format(bytes).ok() == Some(ImageFormat::Png) => {
            Ok(Bytes::copy_from_slice(bytes))
        }
        None => encode_png(&image),
        Some((target_width, target_height)) => {
            let resized = image.resize_exact(target_width, target_height, FilterType::Lanczos3);
            encode_png(&resized)
        }
    }
}

/// Shrink a rendered page to fit the bound, preserving aspect ratio. Never enlarges.
pub fn bound_page(image: DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if width <= max_dimension && height <= max_dimension {
        image
    } else {
        image.thumbnail(max_dimension, max_dimension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jpeg_bytes, png_bytes};

    fn decode(bytes: &[u8]) -> DynamicImage {
        image::load_from_memory_with_format(bytes, ImageFormat::Png).unwrap()
    }

    #[test]
    fn fit_dimensions_within_bounds() {
        assert_eq!(fit_dimensions(3500, 3500, 3500), None);
        assert_eq!(fit_dimensions(100, 20, 3500), None);
    }

    #[test]
    fn fit_dimensions_hits_bound_on_larger_side() {
        assert_eq!(fit_dimensions(7000, 3500, 3500), Some((3500, 1750)));
        assert_eq!(fit_dimensions(1000, 5000, 3500), Some((700, 3500)));
        assert_eq!(fit_dimensions(10000, 1, 3500), Some((3500, 1)));
    }

    #[test]
    fn png_within_bounds_is_byte_identical() {
        let png = png_bytes(40, 30);
        let output = image_to_png(&png, 100).unwrap();
        assert_eq!(output.as_ref(), png.as_slice());
    }

    #[test]
    fn jpeg_within_bounds_becomes_png_with_same_dimensions() {
        let jpeg = jpeg_bytes(40, 30);
        let output = image_to_png(&jpeg, 100).unwrap();
        assert_eq!(image::guess_format(&output).unwrap(), ImageFormat::Png);
        assert_eq!(decode(&output).dimensions(), (40, 30));
    }

    #[test]
    fn oversized_image_is_scaled_preserving_aspect_ratio() {
        let png = png_bytes(300, 120);
        let output = image_to_png(&png, 100).unwrap();
        assert_eq!(decode(&output).dimensions(), (100, 40));

        let tall = png_bytes(50, 200);
        let output = image_to_png(&tall, 100).unwrap();
        assert_eq!(decode(&output).dimensions(), (25, 100));
    }

    #[test]
    fn bound_page_never_enlarges() {
        let small = DynamicImage::new_rgba8(10, 20);
        assert_eq!(bound_page(small, 100).dimensions(), (10, 20));

        let large = DynamicImage::new_rgba8(400, 200);
        assert_eq!(bound_page(large, 100).dimensions(), (100, 50));
    }

    #[test]
    fn undecodable_bytes_fail() {
        assert!(matches!(
            image_to_png(b"nope", 100),
            Err(ConversionError::Decode(_))
        ));
    }
}
