//! Page rendering backends.

use std::path::PathBuf;

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::ConversionError;

/// PDF points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;

/// Renders every page of a PDF to a bitmap, in document order.
///
/// Implementations are called from a blocking thread and must not rely on the async runtime.
pub trait PageRenderer: Send + Sync {
    fn render_pages(&self, pdf: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, ConversionError>;
}

/// Renderer backed by the pdfium shared library.
///
/// The library is bound per call, so a missing library only fails conversions and
/// never the process start.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRenderer {
    library_dir: Option<PathBuf>,
}

impl PdfiumRenderer {
    /// `library_dir` is the directory holding the platform pdfium library; `None` uses
    /// the system search path.
    pub fn new(library_dir: Option<String>) -> Self {
        Self {
            library_dir: library_dir.map(PathBuf::from),
        }
    }

    fn bind(&self) -> Result<Pdfium, ConversionError> {
        let bindings = match &self.library_dir {
            Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                dir.as_path(),
            )),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| ConversionError::RendererUnavailable(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_pages(&self, pdf: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, ConversionError> {
        let pdfium = self.bind()?;

        let document = pdfium.load_pdf_from_byte_slice(pdf, None).map_err(|e| {
            let detail = format!("{:?}", e);
            if detail.contains("Password") || detail.contains("password") {
                ConversionError::PasswordProtected
            } else {
                ConversionError::Unreadable(detail)
            }
        })?;

        let render_config =
            PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / POINTS_PER_INCH);

        let mut images = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let bitmap =
                page.render_with_config(&render_config)
                    .map_err(|e| ConversionError::Render {
                        page: index + 1,
                        detail: format!("{:?}", e),
                    })?;
            let image = bitmap.as_image();
            debug!(
                page = index + 1,
                width = image.width(),
                height = image.height(),
                "Rendered PDF page"
            );
            images.push(image);
        }

        Ok(images)
    }
}
