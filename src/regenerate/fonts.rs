//! Font faces for raster text.

use std::collections::HashMap;
use std::sync::Arc;

use ab_glyph::FontVec;
use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use parking_lot::Mutex;

use crate::config::RegenerateOptions;
use crate::model::FontClass;

type FaceKey = (FontClass, bool, bool);

/// Installed font faces, queried by class and weight/slant.
pub struct FontLibrary {
    db: Database,
    cache: Mutex<HashMap<FaceKey, Option<Arc<FontVec>>>>,
}

impl FontLibrary {
    /// Load the configured font sources.
    pub fn new(options: &RegenerateOptions) -> Self {
        let mut db = Database::new();
        if options.system_fonts {
            db.load_system_fonts();
        }
        for dir in &options.font_dirs {
            db.load_fonts_dir(dir);
        }
        log::debug!("font library loaded {} faces", db.len());
        Self::with_database(db)
    }

    /// A library with no faces.
    pub fn empty() -> Self {
        Self::with_database(Database::new())
    }

    /// Wrap a prepared database.
    pub fn with_database(db: Database) -> Self {
        Self {
            db,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of loaded faces.
    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Best face for a class, falling back to any loaded face.
    pub fn face(&self, class: FontClass, bold: bool, italic: bool) -> Option<Arc<FontVec>> {
        let key = (class, bold, italic);
        if let Some(cached) = self.cache.lock().get(&key) {
            return cached.clone();
        }

        let face = self.load(class, bold, italic);
        self.cache.lock().insert(key, face.clone());
        face
    }

    fn load(&self, class: FontClass, bold: bool, italic: bool) -> Option<Arc<FontVec>> {
        let families = preferred_families(class);
        let query = Query {
            families: &families,
            weight: if bold { Weight::BOLD } else { Weight::NORMAL },
            stretch: Stretch::Normal,
            style: if italic { Style::Italic } else { Style::Normal },
        };

        let id = self
            .db
            .query(&query)
            .or_else(|| self.db.faces().next().map(|face| face.id))?;

        let font = self
            .db
            .with_face_data(id, |data, index| {
                FontVec::try_from_vec_and_index(data.to_vec(), index).ok()
            })
            .flatten();

        match &font {
            Some(_) => log::debug!("using font face {:?} for {} text", id, class),
            None => log::warn!("font face {:?} could not be parsed", id),
        }
        font.map(Arc::new)
    }
}

/// Family preference for a class, most metric-compatible first.
fn preferred_families(class: FontClass) -> Vec<Family<'static>> {
    match class {
        FontClass::Sans => vec![
            Family::Name("Helvetica"),
            Family::Name("Arial"),
            Family::Name("Liberation Sans"),
            Family::Name("Arimo"),
            Family::Name("Nimbus Sans"),
            Family::Name("DejaVu Sans"),
            Family::SansSerif,
        ],
        FontClass::Serif => vec![
            Family::Name("Times New Roman"),
            Family::Name("Times"),
            Family::Name("Liberation Serif"),
            Family::Name("Tinos"),
            Family::Name("Nimbus Roman"),
            Family::Name("DejaVu Serif"),
            Family::Serif,
        ],
        FontClass::Mono => vec![
            Family::Name("Courier New"),
            Family::Name("Courier"),
            Family::Name("Liberation Mono"),
            Family::Name("Cousine"),
            Family::Name("Nimbus Mono PS"),
            Family::Name("DejaVu Sans Mono"),
            Family::Monospace,
        ],
    }
}
