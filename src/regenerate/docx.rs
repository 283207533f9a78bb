//! DOCX writer.
//!
//! Produces a minimal WordprocessingML package: one paragraph per visual
//! line of fields, images as inline drawings, and a page break between
//! source pages. Section size and margins follow the first page.

use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::Regenerator;
use crate::error::{Error, Result};
use crate::model::{
    ImageAsset, ImageEncoding, LayoutModel, Margins, PageGeometry, TextField,
};

/// Images whose top edge is above this point go before the text.
const HEADER_BAND: f32 = 200.0;
/// Fields within this vertical distance share a paragraph.
const LINE_TOLERANCE: f32 = 5.0;
const RUN_SEPARATOR: &str = "  ";
const TWIPS_PER_POINT: f32 = 20.0;
const EMU_PER_POINT: f32 = 12700.0;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const REL_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

type XmlWriter = Writer<Vec<u8>>;

/// An image part in `word/media`.
struct Media<'a> {
    asset: &'a ImageAsset,
    rel_id: String,
    file_name: String,
    data: Vec<u8>,
}

pub(super) fn write(
    layout: &LayoutModel,
    values: &HashMap<&str, &str>,
    replacements: &BTreeMap<String, Vec<u8>>,
    regenerator: &Regenerator,
) -> Result<Vec<u8>> {
    let media = collect_media(layout, replacements)?;
    let document = document_xml(layout, values, &media, regenerator)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(&content_types_xml()?)?;
    zip.start_file("_rels/.rels", options)?;
    zip.write_all(&package_rels_xml()?)?;
    zip.start_file("word/document.xml", options)?;
    zip.write_all(&document)?;
    zip.start_file("word/_rels/document.xml.rels", options)?;
    zip.write_all(&document_rels_xml(&media)?)?;
    for item in &media {
        zip.start_file(format!("word/media/{}", item.file_name), options)?;
        zip.write_all(&item.data)?;
    }

    log::debug!(
        "docx package: {} pages, {} fields, {} images",
        layout.pages.len(),
        layout.fields.len(),
        media.len()
    );
    Ok(zip.finish()?.into_inner())
}

fn collect_media<'a>(
    layout: &'a LayoutModel,
    replacements: &BTreeMap<String, Vec<u8>>,
) -> Result<Vec<Media<'a>>> {
    let mut media = Vec::new();
    for asset in &layout.images {
        let (encoding, data) = match replacements.get(&asset.id) {
            Some(bytes) => normalize_replacement(&asset.id, bytes)?,
            None => (asset.encoding, asset.data.clone()),
        };
        if encoding == ImageEncoding::Raw {
            log::warn!(
                "image {} has no portable encoding and is left out of the DOCX",
                asset.id
            );
            continue;
        }

        let n = media.len() + 1;
        media.push(Media {
            asset,
            rel_id: format!("rId{}", n),
            file_name: format!("image{}.{}", n, encoding.extension()),
            data,
        });
    }
    Ok(media)
}

/// PNG and JPEG pass through; any other decodable image becomes PNG.
fn normalize_replacement(id: &str, bytes: &[u8]) -> Result<(ImageEncoding, Vec<u8>)> {
    if let Some(encoding) = ImageEncoding::sniff(bytes) {
        return Ok((encoding, bytes.to_vec()));
    }
    let image = image::load_from_memory(bytes)
        .map_err(|e| Error::Decode(format!("replacement for '{}' is not an image: {}", id, e)))?;
    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, image::ImageFormat::Png)
        .map_err(|e| Error::Render(format!("failed to re-encode '{}': {}", id, e)))?;
    Ok((ImageEncoding::Png, png.into_inner()))
}

fn document_xml(
    layout: &LayoutModel,
    values: &HashMap<&str, &str>,
    media: &[Media<'_>],
    regenerator: &Regenerator,
) -> Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    start(
        &mut w,
        "w:document",
        &[
            ("xmlns:w", NS_W),
            ("xmlns:r", NS_R),
            ("xmlns:wp", NS_WP),
            ("xmlns:a", NS_A),
            ("xmlns:pic", NS_PIC),
        ],
    )?;
    start(&mut w, "w:body", &[])?;

    let pages: Vec<PageGeometry> = if layout.pages.is_empty() {
        vec![PageGeometry::letter(1)]
    } else {
        layout.pages.clone()
    };

    let mut drawing_id = 0;
    for (index, page) in pages.iter().enumerate() {
        let mut on_page: Vec<&Media<'_>> =
            media.iter().filter(|m| m.asset.page == page.number).collect();
        on_page.sort_by(|a, b| a.asset.placement.y.total_cmp(&b.asset.placement.y));
        let (header, rest): (Vec<&Media<'_>>, Vec<&Media<'_>>) = on_page
            .into_iter()
            .partition(|m| m.asset.placement.y < HEADER_BAND);

        for item in header {
            drawing_id += 1;
            write_drawing(&mut w, item, drawing_id)?;
        }

        for line in group_lines(&layout.fields, page.number) {
            write_line(&mut w, &line, values, regenerator)?;
        }

        for item in rest {
            drawing_id += 1;
            write_drawing(&mut w, item, drawing_id)?;
        }

        if index + 1 < pages.len() {
            start(&mut w, "w:p", &[])?;
            start(&mut w, "w:r", &[])?;
            empty(&mut w, "w:br", &[("w:type", "page")])?;
            end(&mut w, "w:r")?;
            end(&mut w, "w:p")?;
        }
    }

    write_section(&mut w, &pages[0], &layout.margins)?;
    end(&mut w, "w:body")?;
    end(&mut w, "w:document")?;
    Ok(w.into_inner())
}

/// Fields on a page grouped into visual lines, each sorted left to right.
fn group_lines(fields: &[TextField], page: u32) -> Vec<Vec<&TextField>> {
    let mut on_page: Vec<&TextField> = fields.iter().filter(|f| f.page == page).collect();
    on_page.sort_by(|a, b| {
        a.bounding_box
            .y
            .total_cmp(&b.bounding_box.y)
            .then(a.bounding_box.x.total_cmp(&b.bounding_box.x))
    });

    let mut lines: Vec<Vec<&TextField>> = Vec::new();
    for field in on_page {
        match lines.last_mut() {
            Some(line)
                if (line[0].bounding_box.y - field.bounding_box.y).abs() <= LINE_TOLERANCE =>
            {
                line.push(field)
            }
            _ => lines.push(vec![field]),
        }
    }
    for line in &mut lines {
        line.sort_by(|a, b| a.bounding_box.x.total_cmp(&b.bounding_box.x));
    }
    lines
}

fn write_line(
    w: &mut XmlWriter,
    line: &[&TextField],
    values: &HashMap<&str, &str>,
    regenerator: &Regenerator,
) -> Result<()> {
    let runs: Vec<(&TextField, &str)> = line
        .iter()
        .map(|f| (*f, values.get(f.id.as_str()).copied().unwrap_or_default()))
        .filter(|(_, value)| !value.trim().is_empty())
        .collect();
    if runs.is_empty() {
        return Ok(());
    }

    start(w, "w:p", &[])?;
    for (i, (field, value)) in runs.iter().enumerate() {
        if i > 0 {
            start(w, "w:r", &[])?;
            text(w, RUN_SEPARATOR)?;
            end(w, "w:r")?;
        }

        let style = regenerator.resolver().resolve(&field.style_hint).style;
        let half_points = ((style.size * 2.0).round() as u32).max(1).to_string();
        let color = style.color.to_hex_bare();

        start(w, "w:r", &[])?;
        start(w, "w:rPr", &[])?;
        empty(
            w,
            "w:rFonts",
            &[
                ("w:ascii", style.family.as_str()),
                ("w:hAnsi", style.family.as_str()),
                ("w:cs", style.family.as_str()),
            ],
        )?;
        if style.bold {
            empty(w, "w:b", &[])?;
        }
        if style.italic {
            empty(w, "w:i", &[])?;
        }
        empty(w, "w:color", &[("w:val", color.as_str())])?;
        empty(w, "w:sz", &[("w:val", half_points.as_str())])?;
        end(w, "w:rPr")?;
        text(w, value)?;
        end(w, "w:r")?;
    }
    end(w, "w:p")
}

fn write_drawing(w: &mut XmlWriter, media: &Media<'_>, id: usize) -> Result<()> {
    let asset = media.asset;
    let (width_pt, height_pt) = if asset.placement.width > 0.0 && asset.placement.height > 0.0 {
        (asset.placement.width, asset.placement.height)
    } else {
        (asset.pixel_width as f32, asset.pixel_height as f32)
    };
    let cx = emu(width_pt);
    let cy = emu(height_pt);
    let id = id.to_string();
    let name = format!("Picture {}", id);

    start(w, "w:p", &[])?;
    start(w, "w:r", &[])?;
    start(w, "w:drawing", &[])?;
    start(
        w,
        "wp:inline",
        &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
    )?;
    empty(w, "wp:extent", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    empty(w, "wp:docPr", &[("id", id.as_str()), ("name", name.as_str())])?;
    start(w, "a:graphic", &[])?;
    start(w, "a:graphicData", &[("uri", NS_PIC)])?;
    start(w, "pic:pic", &[])?;

    start(w, "pic:nvPicPr", &[])?;
    empty(
        w,
        "pic:cNvPr",
        &[("id", id.as_str()), ("name", media.file_name.as_str())],
    )?;
    empty(w, "pic:cNvPicPr", &[])?;
    end(w, "pic:nvPicPr")?;

    start(w, "pic:blipFill", &[])?;
    empty(w, "a:blip", &[("r:embed", media.rel_id.as_str())])?;
    start(w, "a:stretch", &[])?;
    empty(w, "a:fillRect", &[])?;
    end(w, "a:stretch")?;
    end(w, "pic:blipFill")?;

    start(w, "pic:spPr", &[])?;
    start(w, "a:xfrm", &[])?;
    empty(w, "a:off", &[("x", "0"), ("y", "0")])?;
    empty(w, "a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
    end(w, "a:xfrm")?;
    start(w, "a:prstGeom", &[("prst", "rect")])?;
    empty(w, "a:avLst", &[])?;
    end(w, "a:prstGeom")?;
    end(w, "pic:spPr")?;

    end(w, "pic:pic")?;
    end(w, "a:graphicData")?;
    end(w, "a:graphic")?;
    end(w, "wp:inline")?;
    end(w, "w:drawing")?;
    end(w, "w:r")?;
    end(w, "w:p")
}

fn write_section(w: &mut XmlWriter, page: &PageGeometry, margins: &Margins) -> Result<()> {
    let page_w = twips(page.width);
    let page_h = twips(page.height);
    let top = twips(margins.top);
    let right = twips(margins.right);
    let bottom = twips(margins.bottom);
    let left = twips(margins.left);

    start(w, "w:sectPr", &[])?;
    empty(w, "w:pgSz", &[("w:w", page_w.as_str()), ("w:h", page_h.as_str())])?;
    empty(
        w,
        "w:pgMar",
        &[
            ("w:top", top.as_str()),
            ("w:right", right.as_str()),
            ("w:bottom", bottom.as_str()),
            ("w:left", left.as_str()),
            ("w:header", "0"),
            ("w:footer", "0"),
            ("w:gutter", "0"),
        ],
    )?;
    end(w, "w:sectPr")
}

fn content_types_xml() -> Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    start(
        &mut w,
        "Types",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/content-types",
        )],
    )?;
    for (extension, content_type) in [
        (
            "rels",
            "application/vnd.openxmlformats-package.relationships+xml",
        ),
        ("xml", "application/xml"),
        ("png", ImageEncoding::Png.mime_type()),
        ("jpg", ImageEncoding::Jpeg.mime_type()),
    ] {
        empty(
            &mut w,
            "Default",
            &[("Extension", extension), ("ContentType", content_type)],
        )?;
    }
    empty(
        &mut w,
        "Override",
        &[
            ("PartName", "/word/document.xml"),
            (
                "ContentType",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
            ),
        ],
    )?;
    end(&mut w, "Types")?;
    Ok(w.into_inner())
}

fn package_rels_xml() -> Result<Vec<u8>> {
    relationships(&[("rId1", REL_DOCUMENT, "word/document.xml".to_string())])
}

fn document_rels_xml(media: &[Media<'_>]) -> Result<Vec<u8>> {
    let rels: Vec<(&str, &str, String)> = media
        .iter()
        .map(|m| (m.rel_id.as_str(), REL_IMAGE, format!("media/{}", m.file_name)))
        .collect();
    relationships(&rels)
}

fn relationships(rels: &[(&str, &str, String)]) -> Result<Vec<u8>> {
    let mut w = Writer::new(Vec::new());
    declaration(&mut w)?;
    start(
        &mut w,
        "Relationships",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/package/2006/relationships",
        )],
    )?;
    for (id, kind, target) in rels {
        empty(
            &mut w,
            "Relationship",
            &[("Id", id), ("Type", kind), ("Target", target.as_str())],
        )?;
    }
    end(&mut w, "Relationships")?;
    Ok(w.into_inner())
}

fn twips(points: f32) -> String {
    ((points * TWIPS_PER_POINT).round().max(0.0) as u32).to_string()
}

fn emu(points: f32) -> String {
    ((points * EMU_PER_POINT).round().max(0.0) as u64).to_string()
}

fn declaration(w: &mut XmlWriter) -> Result<()> {
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(())
}

fn start(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut elem = BytesStart::new(name);
    for attr in attrs {
        elem.push_attribute(*attr);
    }
    w.write_event(Event::Start(elem))?;
    Ok(())
}

fn empty(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut elem = BytesStart::new(name);
    for attr in attrs {
        elem.push_attribute(*attr);
    }
    w.write_event(Event::Empty(elem))?;
    Ok(())
}

fn end(w: &mut XmlWriter, name: &str) -> Result<()> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// A `w:t` element that keeps leading and trailing spaces.
fn text(w: &mut XmlWriter, value: &str) -> Result<()> {
    start(w, "w:t", &[("xml:space", "preserve")])?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    end(w, "w:t")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, DocumentFormat, SourceDocument, StyleHint};
    use std::io::Read;

    fn field(source: &SourceDocument, n: usize, value: &str, x: f32, y: f32) -> TextField {
        TextField::new(
            source.field_id(n),
            value,
            BoundingBox::new(x, y, 80.0, 12.0),
            StyleHint::new("Helvetica-Bold", 12.0).with_name_flags(),
        )
    }

    fn sample() -> LayoutModel {
        let source = SourceDocument::new(b"%PDF-1.4 docx".to_vec(), DocumentFormat::Pdf);
        let mut layout = LayoutModel::new(
            &source,
            vec![PageGeometry::letter(1), PageGeometry::letter(2)],
        );
        layout.fields = vec![
            field(&source, 1, "Name:", 72.0, 100.0),
            field(&source, 2, "Jane Doe", 160.0, 102.0),
            field(&source, 3, "Engineer", 72.0, 130.0),
            field(&source, 4, "Page two", 72.0, 100.0).on_page(2),
        ];
        layout.update_margins();
        layout
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut xml = String::new();
        part.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_group_lines() {
        let layout = sample();
        let lines = group_lines(&layout.fields, 1);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].len(), 2);
        assert_eq!(lines[0][0].value, "Name:");
        assert_eq!(lines[1][0].value, "Engineer");
    }

    #[test]
    fn test_package_parts() {
        let layout = sample();
        let edits = layout.edits();
        let bytes = write(
            &layout,
            &edits.values(),
            &BTreeMap::new(),
            &Regenerator::default(),
        )
        .unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
        ] {
            assert!(archive.by_name(name).is_ok(), "{}", name);
        }

        let document = read_part(&bytes, "word/document.xml");
        assert!(document.contains("Name:</w:t>"));
        assert!(document.contains(r#"<w:t xml:space="preserve">  </w:t>"#));
        assert!(document.contains(r#"<w:rFonts w:ascii="Helvetica""#));
        assert!(document.contains("<w:b/>"));
        assert!(document.contains(r#"<w:sz w:val="24"/>"#));
        assert!(document.contains(r#"<w:br w:type="page"/>"#));
        assert!(document.contains(r#"<w:pgSz w:w="12240" w:h="15840"/>"#));
    }

    #[test]
    fn test_empty_values_are_left_out() {
        let layout = sample();
        let id = layout.fields[1].id.clone();
        let edits = layout.edits().with_value(&id, "").unwrap();
        let bytes = write(
            &layout,
            &edits.values(),
            &BTreeMap::new(),
            &Regenerator::default(),
        )
        .unwrap();
        let document = read_part(&bytes, "word/document.xml");
        assert!(!document.contains("Jane Doe"));
        assert!(document.contains("Name:"));
    }

    #[test]
    fn test_twips_and_emu() {
        assert_eq!(twips(612.0), "12240");
        assert_eq!(emu(10.0), "127000");
    }
}
