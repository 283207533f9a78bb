//! Structural PDF extraction.

use std::collections::BTreeMap;
use std::io::Cursor;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};
use rayon::prelude::*;
use unicode_normalization::UnicodeNormalization;

use super::content::{
    inherited, name_of, page_box, resolve, ContentInterpreter, TextSegment, ASCENT_RATIO,
};
use super::labels::pdf_label;
use super::{empty_result_warning, Extraction, Extractor};
use crate::config::ExtractOptions;
use crate::error::{Error, Result};
use crate::model::{
    BoundingBox, DocumentFormat, FontClass, ImageAsset, ImageEncoding, LayoutModel,
    PageGeometry, SourceDocument, StyleHint, TextField,
};
use crate::style::StyleResolver;

const BASELINE_TOLERANCE: f32 = 0.5;
const MIN_GAP: f32 = -0.5;
const MAX_GAP_EM: f32 = 0.3;
const SPACE_GAP_EM: f32 = 0.1;

/// Extracts one field per text run from a PDF's content streams.
#[derive(Debug, Clone, Default)]
pub struct PdfExtractor {
    options: ExtractOptions,
    resolver: StyleResolver,
}

impl PdfExtractor {
    /// Create an extractor with default options and font table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with custom options.
    pub fn with_options(options: ExtractOptions, resolver: StyleResolver) -> Self {
        Self { options, resolver }
    }

    fn load(&self, bytes: &[u8]) -> Result<LopdfDocument> {
        let doc = LopdfDocument::load_mem(bytes)
            .map_err(|e| Error::Decode(format!("failed to load PDF: {}", e)))?;
        if doc.is_encrypted() {
            return Err(Error::Decode(
                "encrypted PDF documents are not supported".to_string(),
            ));
        }
        Ok(doc)
    }
}

/// A merged run with its font details.
#[derive(Debug, Clone)]
struct Run {
    segment: TextSegment,
    family: String,
    class_hint: Option<FontClass>,
}

/// An image drawn on a page.
#[derive(Debug, Clone)]
struct PlacedImage {
    name: String,
    object_id: ObjectId,
    encoding: ImageEncoding,
    pixel_width: u32,
    pixel_height: u32,
    placement: BoundingBox,
    data: Vec<u8>,
}

/// Everything extracted from one page, in page-local coordinates.
#[derive(Debug)]
struct PageExtraction {
    geometry: PageGeometry,
    /// MediaBox lower-left corner
    origin: (f32, f32),
    runs: Vec<Run>,
    images: Vec<PlacedImage>,
}

impl Extractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn supported_formats(&self) -> &[DocumentFormat] {
        &[DocumentFormat::Pdf]
    }

    fn extract(&self, source: &SourceDocument) -> Result<Extraction> {
        let doc = self.load(source.bytes())?;
        let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();

        let extracted: Vec<PageExtraction> = if self.options.parallel && pages.len() > 1 {
            pages
                .par_iter()
                .map(|(number, id)| extract_page(&doc, *number, *id))
                .collect::<Result<_>>()?
        } else {
            pages
                .iter()
                .map(|(number, id)| extract_page(&doc, *number, *id))
                .collect::<Result<_>>()?
        };

        let geometry = if extracted.is_empty() {
            vec![PageGeometry::letter(1)]
        } else {
            extracted.iter().map(|p| p.geometry).collect()
        };
        let mut layout = LayoutModel::new(source, geometry);

        for page in extracted {
            let number = page.geometry.number;
            let (ox, oy) = page.origin;

            for run in page.runs {
                let n = layout.fields.len() + 1;
                let seg = &run.segment;
                let value: String = seg.text.trim().nfc().collect();
                let bbox = BoundingBox::new(
                    seg.x - ox,
                    page.geometry.height - (seg.baseline - oy + ASCENT_RATIO * seg.size),
                    seg.width,
                    seg.size,
                );

                let mut hint = StyleHint::new(run.family, seg.size)
                    .with_color(seg.color)
                    .with_name_flags();
                if let Some(class) = run.class_hint {
                    hint = hint.with_class_hint(class);
                }

                let label = if self.options.semantic_labels {
                    pdf_label(&value, bbox.y, n)
                } else {
                    format!("Field {}", n)
                };

                log::trace!("page {} field {}: {:?} at {:?}", number, n, value, bbox);
                layout.fields.push(
                    TextField::new(source.field_id(n), value, bbox, hint)
                        .on_page(number)
                        .with_label(label),
                );
            }

            for image in page.images {
                let n = layout.images.len() + 1;
                let mut placement = image.placement;
                placement.x -= ox;
                placement.y = page.geometry.height - (placement.y - oy);
                layout.images.push(ImageAsset {
                    id: source.image_id(n),
                    page: number,
                    name: image.name,
                    object_id: Some(image.object_id),
                    encoding: image.encoding,
                    pixel_width: image.pixel_width,
                    pixel_height: image.pixel_height,
                    placement,
                    data: image.data,
                });
            }
        }

        layout.update_margins();
        layout.likely_scanned = !layout.images.is_empty()
            && layout.text_len() < self.options.scanned_text_threshold;

        let mut warnings = self.resolver.substitution_warnings(&layout.fields);
        warnings.extend(empty_result_warning(&layout));

        if layout.likely_scanned {
            log::info!(
                "document looks scanned ({} characters of text, {} images); OCR the page images instead",
                layout.text_len(),
                layout.images.len()
            );
        }
        log::info!(
            "extracted {} fields and {} images from {} pages",
            layout.fields.len(),
            layout.images.len(),
            layout.pages.len()
        );

        Ok(Extraction::new(layout, warnings))
    }
}

/// Walk one page.
fn extract_page(doc: &LopdfDocument, number: u32, page_id: ObjectId) -> Result<PageExtraction> {
    let (origin, geometry) = page_box(doc, number, page_id);

    let resources = inherited(doc, page_id, b"Resources").and_then(|o| o.as_dict().ok());
    let fonts = resources
        .map(|r| font_resources(doc, r))
        .unwrap_or_default();

    let content = doc.get_page_content(page_id)?;
    let interpreter = ContentInterpreter::new(doc, &fonts);
    let page_content = interpreter.run(&content)?;

    let runs = merge_segments(page_content.segments)
        .into_iter()
        .map(|segment| {
            let metrics = interpreter.metrics(&segment.font);
            Run {
                family: metrics.map(|m| m.base_font.clone()).unwrap_or_default(),
                class_hint: metrics.and_then(|m| m.class_hint),
                segment,
            }
        })
        .collect::<Vec<_>>();

    let xobjects = resources
        .map(|r| image_resources(doc, r))
        .unwrap_or_default();
    let mut images = Vec::new();
    for placement in &page_content.placements {
        let Some((object_id, stream)) = xobjects.get(&placement.name) else {
            continue;
        };
        let (encoding, data) = image_data(stream);
        let corners = [
            placement.ctm.apply(0.0, 0.0),
            placement.ctm.apply(1.0, 0.0),
            placement.ctm.apply(0.0, 1.0),
            placement.ctm.apply(1.0, 1.0),
        ];
        let min_x = corners.iter().map(|c| c.0).fold(f32::INFINITY, f32::min);
        let max_x = corners.iter().map(|c| c.0).fold(f32::NEG_INFINITY, f32::max);
        let min_y = corners.iter().map(|c| c.1).fold(f32::INFINITY, f32::min);
        let max_y = corners.iter().map(|c| c.1).fold(f32::NEG_INFINITY, f32::max);

        images.push(PlacedImage {
            name: String::from_utf8_lossy(&placement.name).to_string(),
            object_id: *object_id,
            encoding,
            pixel_width: dict_u32(&stream.dict, b"Width"),
            pixel_height: dict_u32(&stream.dict, b"Height"),
            // y holds the top edge in PDF space until the caller flips it
            placement: BoundingBox::new(min_x, max_y, max_x - min_x, max_y - min_y),
            data,
        });
    }

    log::debug!(
        "page {}: {} runs, {} images",
        number,
        runs.len(),
        images.len()
    );

    Ok(PageExtraction {
        geometry,
        origin,
        runs,
        images,
    })
}

/// Font resources by name.
fn font_resources<'d>(
    doc: &'d LopdfDocument,
    resources: &'d Dictionary,
) -> BTreeMap<Vec<u8>, &'d Dictionary> {
    let Some(fonts) = resolve(doc, resources.get(b"Font").ok()).and_then(|o| o.as_dict().ok())
    else {
        return BTreeMap::new();
    };
    fonts
        .iter()
        .filter_map(|(name, obj)| {
            resolve(doc, Some(obj))
                .and_then(|o| o.as_dict().ok())
                .map(|dict| (name.clone(), dict))
        })
        .collect()
}

/// Image XObjects by name.
fn image_resources<'d>(
    doc: &'d LopdfDocument,
    resources: &'d Dictionary,
) -> BTreeMap<Vec<u8>, (ObjectId, &'d Stream)> {
    let Some(xobjects) =
        resolve(doc, resources.get(b"XObject").ok()).and_then(|o| o.as_dict().ok())
    else {
        return BTreeMap::new();
    };

    let mut images = BTreeMap::new();
    for (name, obj) in xobjects.iter() {
        let Ok(id) = obj.as_reference() else {
            continue;
        };
        let Ok(Object::Stream(stream)) = doc.get_object(id) else {
            continue;
        };
        if name_of(stream.dict.get(b"Subtype").ok()).as_deref() == Some("Image") {
            images.insert(name.clone(), (id, stream));
        }
    }
    images
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> u32 {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_i64().ok())
        .map(|v| v.max(0) as u32)
        .unwrap_or(0)
}

/// Filter names applied to a stream, outermost first.
fn stream_filters(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).to_string()],
        Ok(Object::Array(items)) => items.iter().filter_map(|o| name_of(Some(o))).collect(),
        _ => Vec::new(),
    }
}

/// Image bytes in the most portable encoding available.
fn image_data(stream: &Stream) -> (ImageEncoding, Vec<u8>) {
    let filters = stream_filters(&stream.dict);

    if filters.len() == 1 && filters[0] == "DCTDecode" {
        return (ImageEncoding::Jpeg, stream.content.clone());
    }

    let plain = filters.iter().all(|f| f == "FlateDecode");
    let bits = dict_u32(&stream.dict, b"BitsPerComponent");
    if plain && bits == 8 {
        let width = dict_u32(&stream.dict, b"Width");
        let height = dict_u32(&stream.dict, b"Height");
        let color_space = name_of(stream.dict.get(b"ColorSpace").ok());
        let raw = if filters.is_empty() {
            Some(stream.content.clone())
        } else {
            stream.decompressed_content().ok()
        };

        if let Some(raw) = raw {
            let decoded = match color_space.as_deref() {
                Some("DeviceRGB") => image::RgbImage::from_raw(width, height, raw)
                    .map(image::DynamicImage::ImageRgb8),
                Some("DeviceGray") => image::GrayImage::from_raw(width, height, raw)
                    .map(image::DynamicImage::ImageLuma8),
                _ => None,
            };
            if let Some(png) = decoded.and_then(|img| encode_png(&img)) {
                return (ImageEncoding::Png, png);
            }
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());
    (ImageEncoding::Raw, data)
}

fn encode_png(img: &image::DynamicImage) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .ok()?;
    Some(buf)
}

/// Join consecutive segments that continue the same run.
fn merge_segments(segments: Vec<TextSegment>) -> Vec<TextSegment> {
    let mut runs: Vec<TextSegment> = Vec::new();

    for seg in segments {
        if let Some(current) = runs.last_mut() {
            if continues(current, &seg) {
                let gap = seg.x - (current.x + current.width);
                if gap > SPACE_GAP_EM * current.size
                    && !current.text.ends_with(char::is_whitespace)
                    && !seg.text.starts_with(char::is_whitespace)
                {
                    current.text.push(' ');
                }
                current.text.push_str(&seg.text);
                current.width = (seg.x + seg.width - current.x).max(current.width);
                continue;
            }
        }
        runs.push(seg);
    }

    runs.retain(|r| !r.text.trim().is_empty());
    runs
}

fn continues(current: &TextSegment, next: &TextSegment) -> bool {
    if current.font != next.font
        || (current.size - next.size).abs() > 0.01
        || current.color != next.color
        || (current.baseline - next.baseline).abs() > BASELINE_TOLERANCE
    {
        return false;
    }
    let gap = next.x - (current.x + current.width);
    (MIN_GAP..=MAX_GAP_EM * current.size).contains(&gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;

    fn seg(text: &str, x: f32, width: f32) -> TextSegment {
        TextSegment {
            font: b"F1".to_vec(),
            text: text.to_string(),
            x,
            baseline: 700.0,
            width,
            size: 10.0,
            color: Color::BLACK,
        }
    }

    #[test]
    fn test_merge_adjacent_segments() {
        let runs = merge_segments(vec![seg("Jo", 100.0, 10.0), seg("hn", 110.0, 10.0)]);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "John");
        assert_eq!(runs[0].width, 20.0);
    }

    #[test]
    fn test_merge_inserts_space_for_small_gap() {
        let runs = merge_segments(vec![seg("John", 100.0, 20.0), seg("Doe", 122.0, 15.0)]);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "John Doe");
    }

    #[test]
    fn test_merge_splits_on_large_gap_and_style_change() {
        let mut red = seg("Red", 125.0, 10.0);
        red.color = Color::new(255, 0, 0);
        let runs = merge_segments(vec![
            seg("Name", 100.0, 20.0),
            seg("Value", 200.0, 20.0),
            red,
        ]);
        assert_eq!(runs.len(), 3);
        assert_eq!(runs[2].color, Color::new(255, 0, 0));

        let mut lower = seg("Next", 120.0, 10.0);
        lower.baseline = 686.0;
        let runs = merge_segments(vec![seg("Line", 100.0, 20.0), lower]);
        assert_eq!(runs.len(), 2);
    }

    #[test]
    fn test_merge_drops_whitespace_runs() {
        let runs = merge_segments(vec![seg("  ", 100.0, 5.0)]);
        assert!(runs.is_empty());
    }

    #[test]
    fn test_stream_filters() {
        let mut dict = Dictionary::new();
        assert!(stream_filters(&dict).is_empty());
        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        assert_eq!(stream_filters(&dict), vec!["DCTDecode"]);
        dict.set(
            "Filter",
            Object::Array(vec![
                Object::Name(b"FlateDecode".to_vec()),
                Object::Name(b"DCTDecode".to_vec()),
            ]),
        );
        assert_eq!(stream_filters(&dict).len(), 2);
    }

    #[test]
    fn test_image_data_encodings() {
        let mut dict = Dictionary::new();
        dict.set("Width", 2i64);
        dict.set("Height", 1i64);
        dict.set("BitsPerComponent", 8i64);
        dict.set("ColorSpace", Object::Name(b"DeviceRGB".to_vec()));
        let stream = Stream::new(dict.clone(), vec![255, 0, 0, 0, 0, 255]);
        let (encoding, data) = image_data(&stream);
        assert_eq!(encoding, ImageEncoding::Png);
        assert_eq!(ImageEncoding::sniff(&data), Some(ImageEncoding::Png));

        dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        let stream = Stream::new(dict.clone(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(image_data(&stream).0, ImageEncoding::Jpeg);

        dict.set("Filter", Object::Name(b"JBIG2Decode".to_vec()));
        let stream = Stream::new(dict, vec![1, 2, 3]);
        assert_eq!(image_data(&stream).0, ImageEncoding::Raw);
    }
}
