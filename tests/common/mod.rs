//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::Cursor;

use docrewrite::error::Result;
use docrewrite::extract::{OcrEngine, OcrWord};
use docrewrite::model::BoundingBox;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Build a one-page letter PDF with one Helvetica text object per line.
///
/// Each entry is `(text, baseline)` in PDF user space.
pub fn pdf_with_lines(lines: &[(&str, f32)]) -> Vec<u8> {
    pdf_with_pages(&[lines])
}

/// Build a letter PDF with one page per entry of `pages`.
pub fn pdf_with_pages(pages: &[&[(&str, f32)]]) -> Vec<u8> {
    let streams = pages
        .iter()
        .map(|lines| {
            let mut operations = Vec::new();
            for (text, baseline) in lines.iter() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Real(12.0)],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![Object::Real(72.0), Object::Real(*baseline)],
                ));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
                operations.push(Operation::new("ET", vec![]));
            }
            Content { operations }.encode().expect("encode content")
        })
        .collect();
    pdf_with_streams(streams)
}

/// Build a one-page letter PDF from a raw content stream using font `F1`.
pub fn pdf_with_content(content: &[u8]) -> Vec<u8> {
    pdf_with_streams(vec![content.to_vec()])
}

fn pdf_with_streams(streams: Vec<Vec<u8>>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for stream in streams {
        let content_id = doc.add_object(Stream::new(dictionary! {}, stream));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save PDF");
    bytes
}

/// A plain white PNG.
pub fn blank_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("encode PNG");
    bytes
}

/// OCR engine that returns canned words.
pub struct MockEngine {
    words: Vec<OcrWord>,
    available: bool,
}

impl MockEngine {
    pub fn new(words: Vec<OcrWord>) -> Self {
        Self {
            words,
            available: true,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            words: Vec::new(),
            available: false,
        }
    }
}

impl OcrEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<Vec<OcrWord>> {
        Ok(self.words.clone())
    }
}

/// A recognized word with a 20px line height.
pub fn word(text: &str, x: f32, y: f32, width: f32, confidence: f32) -> OcrWord {
    OcrWord::new(text, BoundingBox::new(x, y, width, 20.0), confidence)
}

/// Two lines of a resume header; the second is poorly recognized.
pub fn resume_words() -> Vec<OcrWord> {
    vec![
        word("Jane", 10.0, 10.0, 40.0, 95.0),
        word("Doe", 56.0, 10.0, 30.0, 93.0),
        word("Engineer", 10.0, 50.0, 80.0, 42.0),
    ]
}
