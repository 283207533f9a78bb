//! PDF overlay writer.
//!
//! Visible text objects are removed from every page, then each field's box
//! is painted white and the edited value is drawn on top with a standard
//! Type1 font. Invisible text (render modes 3 and 7, such as the OCR layer of
//! a searchable scan) and everything else on the page are kept.
//!
//! Standard fonts use WinAnsiEncoding; values with characters outside it
//! are rejected before the document is touched.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, ObjectId, Stream, StringFormat};

use super::{shrink_to_fit, Regenerator};
use crate::error::{Error, Result};
use crate::extract::content::{get_number, inherited, is_invisible, page_box, resolve, ASCENT_RATIO};
use crate::model::{quote_chars, ImageAsset, ImageEncoding, LayoutModel, SourceDocument, TextField};
use crate::style::{encode_win_ansi, unencodable_chars, RenderLimits, StandardFont};

/// Resource name prefix for fonts added by the writer.
const FONT_PREFIX: &str = "DR";

pub(super) fn write(
    source: &SourceDocument,
    layout: &LayoutModel,
    values: &HashMap<&str, &str>,
    images: &BTreeMap<String, Vec<u8>>,
    regenerator: &Regenerator,
) -> Result<Vec<u8>> {
    check_encodable(layout, values)?;

    let mut doc = LopdfDocument::load_mem(source.bytes())
        .map_err(|e| Error::Decode(format!("failed to load PDF: {}", e)))?;

    let mut fonts = FontObjects::default();
    for (number, page_id) in doc.get_pages() {
        let fields: Vec<&TextField> = layout.fields.iter().filter(|f| f.page == number).collect();
        rewrite_page(&mut doc, number, page_id, &fields, values, regenerator, &mut fonts)?;
    }

    for (id, bytes) in images {
        // ids were checked against the layout before dispatch
        if let Some(asset) = layout.image(id) {
            replace_image(&mut doc, asset, bytes)?;
        }
    }

    doc.prune_objects();
    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| Error::Render(format!("failed to write PDF: {}", e)))?;
    Ok(output)
}

/// Fail with every field whose value a standard font cannot encode.
fn check_encodable(layout: &LayoutModel, values: &HashMap<&str, &str>) -> Result<()> {
    let problems: Vec<String> = layout
        .fields
        .iter()
        .filter_map(|field| {
            let value = values.get(field.id.as_str()).copied().unwrap_or_default();
            let missing = unencodable_chars(value.trim());
            (!missing.is_empty()).then(|| format!("{} ({})", field.id, quote_chars(&missing)))
        })
        .collect();

    if problems.is_empty() {
        return Ok(());
    }
    Err(Error::Render(format!(
        "characters outside WinAnsiEncoding cannot be drawn in PDF output: {}",
        problems.join("; ")
    )))
}

/// Type1 font objects created so far, one per standard font.
#[derive(Default)]
struct FontObjects {
    ids: BTreeMap<StandardFont, ObjectId>,
}

impl FontObjects {
    fn get(&mut self, doc: &mut LopdfDocument, font: StandardFont) -> ObjectId {
        *self.ids.entry(font).or_insert_with(|| {
            doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.name(),
                "Encoding" => "WinAnsiEncoding",
            })
        })
    }
}

fn resource_name(font: StandardFont) -> String {
    format!("{}{}", FONT_PREFIX, font as u8)
}

fn rewrite_page(
    doc: &mut LopdfDocument,
    number: u32,
    page_id: ObjectId,
    fields: &[&TextField],
    values: &HashMap<&str, &str>,
    regenerator: &Regenerator,
    fonts: &mut FontObjects,
) -> Result<()> {
    let ((ox, oy), geometry) = page_box(doc, number, page_id);
    let mut resources = page_resources(doc, page_id);
    let mut font_dict = resources
        .get(b"Font")
        .ok()
        .and_then(|o| resolve(doc, Some(o)))
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .unwrap_or_default();

    let content = Content::decode(&doc.get_page_content(page_id)?)?;
    let kept = strip_text_objects(content.operations);
    let kept_count = kept.len();

    let mut operations = Vec::with_capacity(kept.len() + fields.len() * 12 + 2);
    operations.push(Operation::new("q", vec![]));
    operations.extend(kept);
    operations.push(Operation::new("Q", vec![]));

    let options = regenerator.options();
    for field in fields {
        let bbox = field.bounding_box;
        let bottom = oy + geometry.height - bbox.bottom();
        operations.extend([
            Operation::new("q", vec![]),
            Operation::new("rg", vec![Object::Real(1.0), Object::Real(1.0), Object::Real(1.0)]),
            Operation::new(
                "re",
                vec![
                    Object::Real(ox + bbox.x),
                    Object::Real(bottom),
                    Object::Real(bbox.width),
                    Object::Real(bbox.height),
                ],
            ),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);

        let value = values.get(field.id.as_str()).copied().unwrap_or_default();
        if value.trim().is_empty() {
            continue;
        }

        let style = regenerator
            .resolver()
            .resolve_with(&field.style_hint, RenderLimits::new(options.pdf_min_font_size))
            .style;
        // checked up front
        let encoded = encode_win_ansi(value).map_err(|missing| {
            Error::Render(format!("field {}: cannot encode {}", field.id, quote_chars(&missing)))
        })?;
        let measured: String = encoded.iter().map(|&b| b as char).collect();
        let size = shrink_to_fit(
            style.size,
            bbox.width,
            options.shrink_step,
            options.pdf_shrink_floor,
            |s| style.base_font.text_width(&measured, s),
        );

        let font_id = fonts.get(doc, style.base_font);
        let name = resource_name(style.base_font);
        font_dict.set(name.as_bytes(), Object::Reference(font_id));

        let baseline = oy + geometry.height - bbox.y - ASCENT_RATIO * bbox.height;
        let (r, g, b) = style.color.to_unit();
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(name.into_bytes()), Object::Real(size)]),
            Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
            Operation::new("Td", vec![Object::Real(ox + bbox.x), Object::Real(baseline)]),
            Operation::new("Tj", vec![Object::String(encoded, StringFormat::Hexadecimal)]),
            Operation::new("ET", vec![]),
        ]);
        log::debug!("page {}: drew {} at {:.1}pt", number, field.id, size);
    }

    let stream = Content { operations }
        .encode()
        .map_err(|e| Error::Render(format!("failed to encode page {} content: {}", number, e)))?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), stream));

    resources.set("Font", Object::Dictionary(font_dict));
    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| Error::Render(format!("page {} is not a dictionary: {}", number, e)))?;
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Reference(content_id));

    log::debug!(
        "page {}: kept {} operators, overlaid {} fields",
        number,
        kept_count,
        fields.len()
    );
    Ok(())
}

/// The page's effective resources as an owned dictionary.
///
/// Inherited resources are copied down so that added fonts never leak into
/// sibling pages.
fn page_resources(doc: &LopdfDocument, page_id: ObjectId) -> Dictionary {
    inherited(doc, page_id, b"Resources")
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .unwrap_or_default()
}

/// Remove visible text objects from a content stream.
///
/// A text object is kept whole when everything it shows is invisible.
/// Otherwise its positioning and showing operators are dropped and its
/// state operators (font, render mode, colour) stay in place, so later
/// content sees the same graphics state.
fn strip_text_objects(operations: Vec<Operation>) -> Vec<Operation> {
    let mut kept = Vec::with_capacity(operations.len());
    let mut modes: Vec<i64> = Vec::new();
    let mut mode = 0;
    let mut block: Option<(Vec<Operation>, bool)> = None;

    for op in operations {
        match op.operator.as_str() {
            "q" => modes.push(mode),
            "Q" => mode = modes.pop().unwrap_or(0),
            "Tr" => {
                mode = op
                    .operands
                    .first()
                    .and_then(get_number)
                    .map_or(mode, |m| m as i64)
            }
            _ => {}
        }

        match op.operator.as_str() {
            "BT" => block = Some((vec![op], false)),
            "ET" => {
                if let Some((mut ops, visible)) = block.take() {
                    if visible {
                        kept.extend(ops.into_iter().filter(|op| !is_text_operator(op)));
                    } else {
                        ops.push(op);
                        kept.extend(ops);
                    }
                }
            }
            "Tj" | "TJ" | "'" | "\"" => match block.as_mut() {
                Some((ops, visible)) => {
                    *visible |= !is_invisible(mode);
                    ops.push(op);
                }
                None => kept.push(op),
            },
            _ => match block.as_mut() {
                Some((ops, _)) => ops.push(op),
                None => kept.push(op),
            },
        }
    }
    kept
}

/// Operators only valid inside a text object.
fn is_text_operator(op: &Operation) -> bool {
    matches!(
        op.operator.as_str(),
        "BT" | "ET" | "Td" | "TD" | "Tm" | "T*" | "Tj" | "TJ" | "'" | "\""
    )
}

/// Swap an image XObject's stream for new bytes.
fn replace_image(doc: &mut LopdfDocument, asset: &ImageAsset, bytes: &[u8]) -> Result<()> {
    let Some((number, generation)) = asset.object_id else {
        return Err(Error::Render(format!(
            "image asset '{}' has no PDF object to replace",
            asset.id
        )));
    };

    let image = image::load_from_memory(bytes)
        .map_err(|e| Error::Decode(format!("replacement for '{}' is not an image: {}", asset.id, e)))?;
    let (width, height) = (image.width() as i64, image.height() as i64);

    let stream = if ImageEncoding::sniff(bytes) == Some(ImageEncoding::Jpeg) {
        let color_space = match image.color().channel_count() {
            1 | 2 => "DeviceGray",
            _ => "DeviceRGB",
        };
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8i64,
                "Filter" => "DCTDecode",
            },
            bytes.to_vec(),
        )
    } else {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(image.to_rgb8().as_raw())?;
        let data = encoder.finish()?;
        Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
                "Filter" => "FlateDecode",
            },
            data,
        )
    };

    log::debug!(
        "replacing image {} (object {} {}) with {}x{} pixels",
        asset.id,
        number,
        generation,
        width,
        height
    );
    doc.objects
        .insert((number, generation), Object::Stream(stream.with_compression(false)));
    Ok(())
}
