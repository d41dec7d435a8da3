//! In-memory fixtures and a library-free `PageRenderer` for tests.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use lopdf::{dictionary, Document, Object, ObjectId};

use crate::document::renderer::POINTS_PER_INCH;
use crate::document::PageRenderer;
use crate::error::ConversionError;

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .expect("encode png fixture");
    buffer
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([0, 128, 255, 255]),
    ))
    .to_rgb8();
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .expect("encode jpeg fixture");
    buffer
}

fn build_pdf(pages: usize, width_pt: f32, height_pt: f32) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let page_ids: Vec<Object> = (0..pages)
        .map(|_| {
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
            });
            page_id.into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => pages as i64,
        }
        .into(),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn save(mut doc: Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("save pdf fixture");
    buffer
}

/// A PDF with `pages` blank pages of the given size in points.
pub fn pdf_bytes(pages: usize, width_pt: f32, height_pt: f32) -> Vec<u8> {
    save(build_pdf(pages, width_pt, height_pt))
}

pub fn empty_pdf_bytes() -> Vec<u8> {
    pdf_bytes(0, 612.0, 792.0)
}

/// A one-page PDF whose trailer references a standard security handler.
pub fn encrypted_pdf_bytes() -> Vec<u8> {
    let mut doc = build_pdf(1, 612.0, 792.0);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "O" => Object::string_literal(vec![1u8; 32]),
        "U" => Object::string_literal(vec![2u8; 32]),
        "P" => -44,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    save(doc)
}

/// Renders each page as a flat bitmap sized from its MediaBox at the requested dpi.
pub struct MediaBoxRenderer;

impl MediaBoxRenderer {
    pub fn page_colour(index: usize) -> Rgba<u8> {
        let shade = (index * 40 % 256) as u8;
        Rgba([shade, 255 - shade, 0, 255])
    }
}

impl PageRenderer for MediaBoxRenderer {
    fn render_pages(&self, pdf: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, ConversionError> {
        let doc = Document::load_mem(pdf).map_err(|e| ConversionError::Unreadable(e.to_string()))?;
        let scale = dpi as f32 / POINTS_PER_INCH;

        doc.get_pages()
            .into_values()
            .enumerate()
            .map(|(index, page_id)| {
                let render_err = |detail: String| ConversionError::Render {
                    page: index + 1,
                    detail,
                };
                let media_box = doc
                    .get_dictionary(page_id)
                    .and_then(|page| page.get(b"MediaBox"))
                    .and_then(Object::as_array)
                    .map_err(|e| render_err(e.to_string()))?;
                let coords = media_box
                    .iter()
                    .map(Object::as_float)
                    .collect::<Result<Vec<f32>, _>>()
                    .map_err(|e| render_err(e.to_string()))?;
                if coords.len() != 4 {
                    return Err(render_err("MediaBox must have four entries".to_string()));
                }
                let width = ((coords[2] - coords[0]) * scale).round().max(1.0) as u32;
                let height = ((coords[3] - coords[1]) * scale).round().max(1.0) as u32;
                Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
                    width,
                    height,
                    Self::page_colour(index),
                )))
            })
            .collect()
    }
}
