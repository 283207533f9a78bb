//! Layout model shared by every extraction strategy.

use std::collections::{BTreeMap, HashMap, HashSet};

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use super::asset::ImageAsset;
use super::field::TextField;
use super::format::{DocumentFormat, TargetFormat};
use crate::error::{Error, Result};

/// Default margin in document units when no content bounds are known.
pub const DEFAULT_MARGIN: f32 = 50.0;

const CONTENT_KEY_LEN: usize = 12;

/// Raw uploaded bytes plus their declared format.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    bytes: Vec<u8>,
    format: DocumentFormat,
    key: String,
}

impl SourceDocument {
    /// Wrap bytes with a declared format.
    pub fn new(bytes: Vec<u8>, format: DocumentFormat) -> Self {
        let digest = format!("{:x}", Md5::digest(&bytes));
        let key = digest[..CONTENT_KEY_LEN].to_string();
        Self { bytes, format, key }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Short content hash that scopes field and asset ids to this document.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Field id for the n-th (1-based) field.
    pub fn field_id(&self, n: usize) -> String {
        format!("{}-f{}", self.key, n)
    }

    /// Asset id for the n-th (1-based) image.
    pub fn image_id(&self, n: usize) -> String {
        format!("{}-img{}", self.key, n)
    }
}

/// Size of one page (or of the image canvas).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// 1-based page number
    pub number: u32,
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
        }
    }

    /// US Letter in points.
    pub fn letter(number: u32) -> Self {
        Self::new(number, 612.0, 792.0)
    }
}

/// Content margins, derived from field extents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: DEFAULT_MARGIN,
            right: DEFAULT_MARGIN,
            bottom: DEFAULT_MARGIN,
            left: DEFAULT_MARGIN,
        }
    }
}

impl Margins {
    /// Derive margins from the fields on the given page.
    pub fn from_fields(fields: &[TextField], page: &PageGeometry) -> Self {
        let mut on_page = fields.iter().filter(|f| f.page == page.number);
        let Some(first) = on_page.next() else {
            return Self::default();
        };

        let mut bounds = first.bounding_box;
        for field in on_page {
            bounds = bounds.union(&field.bounding_box);
        }

        Self {
            top: bounds.y.max(0.0),
            right: (page.width - bounds.right()).max(0.0),
            bottom: (page.height - bounds.bottom()).max(0.0),
            left: bounds.x.max(0.0),
        }
    }
}

/// Ordered fields, images and geometry for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutModel {
    /// Format of the originating document
    pub format: DocumentFormat,
    /// Content key of the originating document
    pub source_key: String,
    /// Fields in reading order
    pub fields: Vec<TextField>,
    /// Embedded images (PDF only)
    pub images: Vec<ImageAsset>,
    /// Page sizes, or the single image canvas
    pub pages: Vec<PageGeometry>,
    pub margins: Margins,
    /// A PDF that looks like a scan (images but almost no text)
    #[serde(default)]
    pub likely_scanned: bool,
}

impl LayoutModel {
    /// Create an empty layout for a source.
    pub fn new(source: &SourceDocument, pages: Vec<PageGeometry>) -> Self {
        Self {
            format: source.format(),
            source_key: source.key().to_string(),
            fields: Vec::new(),
            images: Vec::new(),
            pages,
            margins: Margins::default(),
            likely_scanned: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, id: &str) -> Option<&TextField> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn image(&self, id: &str) -> Option<&ImageAsset> {
        self.images.iter().find(|i| i.id == id)
    }

    pub fn page(&self, number: u32) -> Option<&PageGeometry> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Recompute margins from the first page's fields.
    pub fn update_margins(&mut self) {
        self.margins = match self.pages.first() {
            Some(page) => Margins::from_fields(&self.fields, page),
            None => Margins::default(),
        };
    }

    /// Total characters of field text.
    pub fn text_len(&self) -> usize {
        self.fields.iter().map(|f| f.value.chars().count()).sum()
    }

    /// Start an edit set holding the current values.
    pub fn edits(&self) -> EditSet {
        EditSet::from_fields(self.fields.clone())
    }

    /// Verify that `edits` addresses exactly this layout's fields and images.
    pub fn check_edits(&self, edits: &EditSet) -> Result<()> {
        if edits.fields.len() != self.fields.len() {
            return Err(Error::InvalidFieldSet(format!(
                "expected {} fields, got {}",
                self.fields.len(),
                edits.fields.len()
            )));
        }

        let expected: HashSet<&str> = self.fields.iter().map(|f| f.id.as_str()).collect();
        let mut seen = HashSet::with_capacity(edits.fields.len());
        for field in &edits.fields {
            if !expected.contains(field.id.as_str()) {
                return Err(Error::InvalidFieldSet(format!(
                    "unknown field id '{}'",
                    field.id
                )));
            }
            if !seen.insert(field.id.as_str()) {
                return Err(Error::InvalidFieldSet(format!(
                    "duplicate field id '{}'",
                    field.id
                )));
            }
        }

        for id in edits.images.keys() {
            if self.image(id).is_none() {
                return Err(Error::InvalidFieldSet(format!(
                    "unknown image asset '{}'",
                    id
                )));
            }
        }

        Ok(())
    }
}

/// Edited field values plus replacement image bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditSet {
    pub fields: Vec<TextField>,
    /// Replacement bytes keyed by image asset id
    #[serde(default, skip)]
    pub images: BTreeMap<String, Vec<u8>>,
}

impl EditSet {
    pub fn from_fields(fields: Vec<TextField>) -> Self {
        Self {
            fields,
            images: BTreeMap::new(),
        }
    }

    /// Change one field's value.
    pub fn set_value(&mut self, id: &str, value: impl Into<String>) -> Result<()> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| Error::InvalidFieldSet(format!("unknown field id '{}'", id)))?;
        field.value = value.into();
        Ok(())
    }

    /// Builder form of [`set_value`](Self::set_value).
    pub fn with_value(mut self, id: &str, value: impl Into<String>) -> Result<Self> {
        self.set_value(id, value)?;
        Ok(self)
    }

    /// Supply new bytes for an image asset.
    pub fn replace_image(&mut self, id: impl Into<String>, bytes: Vec<u8>) {
        self.images.insert(id.into(), bytes);
    }

    /// Edited values keyed by field id.
    pub fn values(&self) -> HashMap<&str, &str> {
        self.fields
            .iter()
            .map(|f| (f.id.as_str(), f.value.as_str()))
            .collect()
    }
}

/// Regenerated document bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDocument {
    pub format: TargetFormat,
    pub bytes: Vec<u8>,
}

impl OutputDocument {
    pub fn new(format: TargetFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.format.extension()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoundingBox, StyleHint};

    fn sample_layout() -> LayoutModel {
        let source = SourceDocument::new(b"%PDF-1.5 sample".to_vec(), DocumentFormat::Pdf);
        let mut layout = LayoutModel::new(&source, vec![PageGeometry::letter(1)]);
        for (n, (text, y)) in [("John Doe", 60.0), ("Engineer", 80.0)].iter().enumerate() {
            layout.fields.push(TextField::new(
                source.field_id(n + 1),
                *text,
                BoundingBox::new(72.0, *y, 60.0, 12.0),
                StyleHint::new("Helvetica", 12.0),
            ));
        }
        layout.update_margins();
        layout
    }

    #[test]
    fn test_content_key_is_stable() {
        let a = SourceDocument::new(b"same bytes".to_vec(), DocumentFormat::Png);
        let b = SourceDocument::new(b"same bytes".to_vec(), DocumentFormat::Png);
        let c = SourceDocument::new(b"other bytes".to_vec(), DocumentFormat::Png);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert_eq!(a.key().len(), CONTENT_KEY_LEN);
        assert_eq!(a.field_id(3), format!("{}-f3", a.key()));
    }

    #[test]
    fn test_margins_from_fields() {
        let layout = sample_layout();
        assert_eq!(layout.margins.left, 72.0);
        assert_eq!(layout.margins.top, 60.0);
        assert_eq!(layout.margins.right, 612.0 - 132.0);
        assert_eq!(layout.margins.bottom, 792.0 - 92.0);
    }

    #[test]
    fn test_margins_default_without_fields() {
        let margins = Margins::from_fields(&[], &PageGeometry::letter(1));
        assert_eq!(margins, Margins::default());
    }

    #[test]
    fn test_check_edits_accepts_unchanged() {
        let layout = sample_layout();
        assert!(layout.check_edits(&layout.edits()).is_ok());
    }

    #[test]
    fn test_check_edits_rejects_missing_and_unknown() {
        let layout = sample_layout();

        let mut missing = layout.edits();
        missing.fields.pop();
        assert!(matches!(
            layout.check_edits(&missing),
            Err(Error::InvalidFieldSet(_))
        ));

        let mut renamed = layout.edits();
        renamed.fields[0].id = "other".to_string();
        assert!(matches!(
            layout.check_edits(&renamed),
            Err(Error::InvalidFieldSet(_))
        ));

        let mut duplicated = layout.edits();
        duplicated.fields[1].id = duplicated.fields[0].id.clone();
        assert!(layout.check_edits(&duplicated).is_err());

        let mut image = layout.edits();
        image.replace_image("nope", vec![1, 2, 3]);
        assert!(layout.check_edits(&image).is_err());
    }

    #[test]
    fn test_set_value() {
        let layout = sample_layout();
        let id = layout.fields[1].id.clone();
        let edits = layout.edits().with_value(&id, "Senior Engineer").unwrap();
        assert_eq!(edits.values()[id.as_str()], "Senior Engineer");
        assert!(layout.edits().with_value("missing", "x").is_err());
    }
}
