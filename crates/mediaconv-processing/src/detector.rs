//! Content sniffing for uploaded payloads.

use image::ImageFormat;
use mediaconv_core::FileType;
use tracing::debug;

use crate::document;
use crate::error::DetectionError;

/// Classifies raw bytes as a PDF or one of the supported still-image formats.
///
/// Works on a borrowed slice and never mutates it.
pub struct FormatDetector;

impl FormatDetector {
    /// PDF is tried first, then PNG, JPG and JPEG in that order. JPEG content is
    /// reported as `Jpg` since it is the first image type that accepts it.
    pub fn detect(bytes: &[u8]) -> Result<FileType, DetectionError> {
        if bytes.is_empty() {
            return Err(DetectionError::UnsupportedFormat);
        }

        if document::is_pdf(bytes) {
            return Ok(FileType::Pdf);
        }

        for candidate in FileType::IMAGE_PREFERENCE {
            if verify_image(bytes, candidate) {
                return Ok(candidate);
            }
        }

        debug!(size = bytes.len(), "Payload matched no supported format");
        Err(DetectionError::UnsupportedFormat)
    }

    /// Detect and compare against the caller's declared type.
    ///
    /// Returns the declared type once confirmed so the caller's spelling (JPG vs JPEG)
    /// is what gets stored.
    pub fn confirm(declared: FileType, bytes: &[u8]) -> Result<FileType, DetectionError> {
        let detected = Self::detect(bytes)?;
        if !declared.same_format(&detected) {
            return Err(DetectionError::TypeMismatch { declared, detected });
        }
        Ok(declared)
    }
}

fn image_format(file_type: FileType) -> Option<ImageFormat> {
    match file_type {
        FileType::Png => Some(ImageFormat::Png),
        FileType::Jpg | FileType::Jpeg => Some(ImageFormat::Jpeg),
        FileType::Pdf => None,
    }
}

/// Full decode, not just a magic-number check, so truncated files are rejected here.
fn verify_image(bytes: &[u8], candidate: FileType) -> bool {
    image_format(candidate)
        .map(|format| image::load_from_memory_with_format(bytes, format).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jpeg_bytes, pdf_bytes, png_bytes};

    #[test]
    fn detects_pdf() {
        let pdf = pdf_bytes(2, 612.0, 792.0);
        assert_eq!(FormatDetector::detect(&pdf).unwrap(), FileType::Pdf);
    }

    #[test]
    fn detects_png_and_jpeg() {
        assert_eq!(
            FormatDetector::detect(&png_bytes(10, 10)).unwrap(),
            FileType::Png
        );
        assert_eq!(
            FormatDetector::detect(&jpeg_bytes(10, 10)).unwrap(),
            FileType::Jpg
        );
    }

    #[test]
    fn rejects_unknown_content() {
        assert!(matches!(
            FormatDetector::detect(b"plain text, not media"),
            Err(DetectionError::UnsupportedFormat)
        ));
        assert!(matches!(
            FormatDetector::detect(&[]),
            Err(DetectionError::UnsupportedFormat)
        ));
    }

    #[test]
    fn rejects_truncated_png() {
        let png = png_bytes(64, 64);
        let truncated = &png[..png.len() / 2];
        assert!(FormatDetector::detect(truncated).is_err());
    }

    #[test]
    fn confirm_rejects_declared_png_with_jpeg_content() {
        let err = FormatDetector::confirm(FileType::Png, &jpeg_bytes(8, 8)).unwrap_err();
        assert!(matches!(
            err,
            DetectionError::TypeMismatch {
                declared: FileType::Png,
                detected: FileType::Jpg
            }
        ));
    }

    #[test]
    fn confirm_keeps_declared_jpeg_spelling() {
        let confirmed = FormatDetector::confirm(FileType::Jpeg, &jpeg_bytes(8, 8)).unwrap();
        assert_eq!(confirmed, FileType::Jpeg);
    }

    #[test]
    fn detection_leaves_input_untouched() {
        let png = png_bytes(12, 12);
        let copy = png.clone();
        FormatDetector::detect(&png).unwrap();
        assert_eq!(png, copy);
    }
}
