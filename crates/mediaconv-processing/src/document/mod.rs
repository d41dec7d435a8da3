//! PDF handling: structural inspection with lopdf, page bitmaps through a `PageRenderer`.

pub mod renderer;

pub use renderer::{PageRenderer, PdfiumRenderer};

use lopdf::Document;

use crate::error::ConversionError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Leading junk before the header is tolerated by most readers; bound the scan.
const HEADER_SCAN_LIMIT: usize = 1024;

fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SCAN_LIMIT)];
    window
        .windows(PDF_MAGIC.len())
        .any(|candidate| candidate == PDF_MAGIC)
}

fn declares_encryption(bytes: &[u8]) -> bool {
    bytes.windows(b"/Encrypt".len()).any(|w| w == b"/Encrypt")
}

/// True if the bytes parse as a PDF, or carry a PDF header plus an encryption
/// dictionary the parser could not open.
pub fn is_pdf(bytes: &[u8]) -> bool {
    match Document::load_mem(bytes) {
        Ok(_) => true,
        Err(_) => has_pdf_header(bytes) && declares_encryption(bytes),
    }
}

/// Number of pages in a readable, unencrypted PDF.
pub fn page_count(bytes: &[u8]) -> Result<usize, ConversionError> {
    let document = Document::load_mem(bytes).map_err(|e| {
        if has_pdf_header(bytes) && declares_encryption(bytes) {
            ConversionError::PasswordProtected
        } else {
            ConversionError::Unreadable(e.to_string())
        }
    })?;

    if document.is_encrypted() {
        return Err(ConversionError::PasswordProtected);
    }

    match document.get_pages().len() {
        0 => Err(ConversionError::EmptyDocument),
        pages => Ok(pages),
    }
}
