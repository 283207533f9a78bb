//! Raster writer: erase each field box and draw the edited value in place.

use std::collections::HashMap;
use std::io::Cursor;

use ab_glyph::PxScale;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use super::{shrink_to_fit, Regenerator};
use crate::config::EraseFill;
use crate::error::{Error, Result};
use crate::imaging::{border_color, PixelRect};
use crate::model::{Color, LayoutModel, SourceDocument, TargetFormat};
use crate::style::RenderLimits;

pub(super) fn write(
    source: &SourceDocument,
    layout: &LayoutModel,
    values: &HashMap<&str, &str>,
    target: TargetFormat,
    regenerator: &Regenerator,
) -> Result<Vec<u8>> {
    let original = decode(source)?;
    let has_alpha = original.color().has_alpha();
    let canvas = paint(&original, layout, values, regenerator)?;
    encode(canvas, has_alpha, target, regenerator.options().jpeg_quality)
}

fn decode(source: &SourceDocument) -> Result<DynamicImage> {
    let format = source.format().image_format().ok_or_else(|| {
        Error::UnsupportedFormat(format!("{} is not an image format", source.format()))
    })?;
    image::load_from_memory_with_format(source.bytes(), format)
        .map_err(|e| Error::Decode(format!("failed to decode {} image: {}", source.format(), e)))
}

fn paint(
    original: &DynamicImage,
    layout: &LayoutModel,
    values: &HashMap<&str, &str>,
    regenerator: &Regenerator,
) -> Result<RgbaImage> {
    let options = regenerator.options();
    let reference = original.to_rgb8();
    let mut canvas = original.to_rgba8();
    let (width, height) = canvas.dimensions();

    for field in &layout.fields {
        let Some(rect) = PixelRect::covering(&field.bounding_box, width, height) else {
            log::debug!("field {} lies outside the {}x{} canvas", field.id, width, height);
            continue;
        };

        let background = match options.erase_fill {
            EraseFill::Sampled => border_color(&reference, rect),
            EraseFill::White => Color::WHITE,
        };
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(rect.x0 as i32, rect.y0 as i32).of_size(rect.width(), rect.height()),
            rgba(background),
        );

        let value = values.get(field.id.as_str()).copied().unwrap_or_default();
        if value.trim().is_empty() {
            continue;
        }

        let style = regenerator
            .resolver()
            .resolve_with(
                &field.style_hint,
                RenderLimits::new(options.raster_min_font_size),
            )
            .style;
        let face = regenerator
            .fonts()
            .face(style.class, style.bold, style.italic)
            .ok_or_else(|| {
                Error::Render(format!(
                    "no {} font face is installed to draw field {}",
                    style.class, field.id
                ))
            })?;

        let size = shrink_to_fit(
            style.size,
            field.bounding_box.width,
            options.shrink_step,
            options.raster_shrink_floor,
            |s| text_size(PxScale::from(s), &*face, value).0 as f32,
        );

        draw_text_mut(
            &mut canvas,
            rgba(style.color),
            field.bounding_box.x.round() as i32,
            field.bounding_box.y.round() as i32,
            PxScale::from(size),
            &*face,
            value,
        );
        log::debug!("drew {} at {:.1}px over {}", field.id, size, background);
    }

    Ok(canvas)
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

/// Composite onto white, dropping alpha.
fn flatten(canvas: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        let Rgba([r, g, b, a]) = *canvas.get_pixel(x, y);
        let blend = |c: u8| ((c as u32 * a as u32 + 255 * (255 - a as u32)) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

fn encode(canvas: RgbaImage, has_alpha: bool, target: TargetFormat, quality: u8) -> Result<Vec<u8>> {
    let image = if has_alpha {
        DynamicImage::ImageRgba8(canvas)
    } else {
        DynamicImage::ImageRgb8(flatten(&canvas))
    };

    let mut buffer = Cursor::new(Vec::new());
    match target {
        TargetFormat::Png => write_format(&image, &mut buffer, ImageFormat::Png)?,
        TargetFormat::Bmp => write_format(&image, &mut buffer, ImageFormat::Bmp)?,
        TargetFormat::Tiff => write_format(&image, &mut buffer, ImageFormat::Tiff)?,
        TargetFormat::Jpeg => {
            if has_alpha {
                log::warn!("JPEG has no alpha channel; transparency is flattened onto white");
            }
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| Error::Render(format!("failed to encode jpeg: {}", e)))?;
        }
        TargetFormat::Svg => {
            write_format(&image, &mut buffer, ImageFormat::Png)?;
            let svg = svg_wrapper(image.width(), image.height(), buffer.get_ref());
            return Ok(svg.into_bytes());
        }
        TargetFormat::Pdf | TargetFormat::Docx => {
            return Err(Error::UnsupportedFormat(format!(
                "{} is not a raster target",
                target
            )))
        }
    }
    Ok(buffer.into_inner())
}

fn write_format(image: &DynamicImage, buffer: &mut Cursor<Vec<u8>>, format: ImageFormat) -> Result<()> {
    image
        .write_to(buffer, format)
        .map_err(|e| Error::Render(format!("failed to encode {:?}: {}", format, e)))
}

/// SVG document embedding a PNG as a data URI.
fn svg_wrapper(width: u32, height: u32, png: &[u8]) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            "\n",
            r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
            r#"width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<image width="{w}" height="{h}" href="data:image/png;base64,{data}"/>"#,
            "</svg>\n"
        ),
        w = width,
        h = height,
        data = STANDARD.encode(png)
    )
}
