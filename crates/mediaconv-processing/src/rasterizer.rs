//! Converts a stored payload into its processed PNG variants.

use std::sync::Arc;

use bytes::Bytes;
use mediaconv_core::constants::{DEFAULT_MAX_DIMENSION, DEFAULT_PDF_DPI};
use mediaconv_core::FileType;
use tracing::{debug, info};

use crate::document::{self, PageRenderer};
use crate::error::ConversionError;
use crate::raster;

#[derive(Debug, Clone, Copy)]
pub struct RasterizerConfig {
    pub max_dimension: u32,
    pub pdf_dpi: u32,
}

impl Default for RasterizerConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            pdf_dpi: DEFAULT_PDF_DPI,
        }
    }
}

/// Stateless apart from its configuration and renderer handle; safe to share
/// across workers.
#[derive(Clone)]
pub struct Rasterizer {
    config: RasterizerConfig,
    renderer: Arc<dyn PageRenderer>,
}

impl Rasterizer {
    pub fn new(config: RasterizerConfig, renderer: Arc<dyn PageRenderer>) -> Self {
        Self { config, renderer }
    }

    /// Run the conversion on the blocking pool.
    pub async fn rasterize(
        &self,
        file_type: FileType,
        payload: Bytes,
    ) -> Result<Vec<Bytes>, ConversionError> {
        let rasterizer = self.clone();
        tokio::task::spawn_blocking(move || rasterizer.rasterize_blocking(file_type, &payload))
            .await
            .map_err(|e| ConversionError::Join(e.to_string()))?
    }

    pub fn rasterize_blocking(
        &self,
        file_type: FileType,
        payload: &[u8],
    ) -> Result<Vec<Bytes>, ConversionError> {
        match file_type {
            FileType::Pdf => self.pdf_to_png_pages(payload),
            FileType::Png | FileType::Jpg | FileType::Jpeg => {
                Ok(vec![self.image_to_png(payload)?])
            }
        }
    }

    /// Single image to a singleton PNG.
    pub fn image_to_png(&self, payload: &[u8]) -> Result<Bytes, ConversionError> {
        raster::image_to_png(payload, self.config.max_dimension)
    }

    /// One PNG per page, in document order starting at page 1.
    pub fn pdf_to_png_pages(&self, payload: &[u8]) -> Result<Vec<Bytes>, ConversionError> {
        let expected = document::page_count(payload)?;
        let pages = self.renderer.render_pages(payload, self.config.pdf_dpi)?;

        if pages.len() != expected {
            return Err(ConversionError::PageCountMismatch {
                expected,
                rendered: pages.len(),
            });
        }

        let variants = pages
            .into_iter()
            .enumerate()
            .map(|(index, page)| {
                let bounded = raster::bound_page(page, self.config.max_dimension);
                debug!(
                    page = index + 1,
                    width = bounded.width(),
                    height = bounded.height(),
                    "Bounded PDF page"
                );
                raster::encode_png(&bounded)
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(pages = variants.len(), "PDF rasterized");
        Ok(variants)
    }
}
