//! Plain text rendering of a layout for terminals.

use std::fmt::Write;

use crate::model::{LayoutModel, Warning};

/// Render fields page by page, followed by images and warnings.
pub fn to_text(layout: &LayoutModel, warnings: &[Warning]) -> String {
    let mut output = String::new();
    let unit = if layout.format.is_image() { "px" } else { "pt" };

    let _ = writeln!(
        output,
        "{} document, {} fields, {} images",
        layout.format.as_str().to_uppercase(),
        layout.fields.len(),
        layout.images.len()
    );
    if layout.likely_scanned {
        output.push_str("Looks like a scanned PDF: little or no text layer\n");
    }

    for page in &layout.pages {
        let _ = writeln!(
            output,
            "\nPage {} ({:.0}x{:.0}{})",
            page.number, page.width, page.height, unit
        );
        for field in layout.fields.iter().filter(|f| f.page == page.number) {
            let b = &field.bounding_box;
            let _ = write!(
                output,
                "  {:<20} {:<24} @ {:.1},{:.1} {:.1}x{:.1}  {} {:.1}",
                field.id,
                field.label,
                b.x,
                b.y,
                b.width,
                b.height,
                field.style_hint.family,
                field.style_hint.size
            );
            if let Some(confidence) = field.confidence {
                let _ = write!(output, "  conf {:.0}", confidence);
            }
            let _ = writeln!(output, "\n      {}", field.value);
        }
        for image in layout.images.iter().filter(|i| i.page == page.number) {
            let _ = writeln!(
                output,
                "  {:<20} image {}x{} {}",
                image.id,
                image.pixel_width,
                image.pixel_height,
                image.mime_type()
            );
        }
    }

    if !warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in warnings {
            let _ = writeln!(output, "  - {}", warning);
        }
    }

    output.trim_end().to_string()
}
