//! mediaconv processing library
//!
//! Format detection and rasterization of uploaded images and PDFs into PNG variants.

pub mod detector;
pub mod document;
pub mod error;
pub mod raster;
pub mod rasterizer;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types
pub use detector::FormatDetector;
pub use document::{PageRenderer, PdfiumRenderer};
pub use error::{ConversionError, DetectionError};
pub use rasterizer::{Rasterizer, RasterizerConfig};
