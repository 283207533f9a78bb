//! The editing workflow: upload, preview, regenerate, clear.
//!
//! [`Editor`] ties an [`ExtractorRegistry`], a [`Regenerator`] and a
//! [`SessionStore`] together. The free functions at the bottom run the same
//! pipeline without sessions.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::config::EditorConfig;
use crate::detect::verify_declared;
use crate::error::Result;
use crate::extract::{Extraction, ExtractorRegistry};
use crate::model::{
    DocumentFormat, EditSet, LayoutModel, OutputDocument, SourceDocument, StyleHint,
    TargetFormat, Warning,
};
use crate::preview::preview;
use crate::regenerate::Regenerator;
use crate::session::SessionStore;
use crate::style::{Resolution, StyleResolver};

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Upload {
    pub session_id: Uuid,
    pub layout: LayoutModel,
    pub warnings: Vec<Warning>,
}

/// Backend availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    /// Every registered extractor can run
    pub extractor_available: bool,
    pub pdf_available: bool,
    pub ocr_available: bool,
}

/// Session-based document editor.
///
/// # Example
///
/// ```no_run
/// use docrewrite::model::{DocumentFormat, TargetFormat};
/// use docrewrite::{Editor, EditorConfig};
///
/// fn main() -> docrewrite::Result<()> {
///     let editor = Editor::new(EditorConfig::default());
///     let upload = editor.upload(std::fs::read("resume.pdf")?, DocumentFormat::Pdf)?;
///
///     let first = upload.layout.fields[0].id.clone();
///     let edits = upload.layout.edits().with_value(&first, "Jane Doe")?;
///     for warning in editor.preview(upload.session_id, &edits)? {
///         println!("{}", warning);
///     }
///
///     let output = editor.regenerate(upload.session_id, &edits, TargetFormat::Pdf)?;
///     std::fs::write("resume-edited.pdf", &output.bytes)?;
///     editor.clear_session(upload.session_id)
/// }
/// ```
pub struct Editor {
    registry: ExtractorRegistry,
    regenerator: Regenerator,
    sessions: Arc<SessionStore>,
    low_confidence_threshold: f32,
}

impl Editor {
    /// Create an editor with the default backends and its own session store.
    pub fn new(config: EditorConfig) -> Self {
        let sessions = Arc::new(SessionStore::new(&config.session));
        Self::with_store(config, sessions)
    }

    /// Create an editor over a shared session store.
    pub fn with_store(config: EditorConfig, sessions: Arc<SessionStore>) -> Self {
        let registry = ExtractorRegistry::with_defaults(&config);
        let regenerator = Regenerator::new(
            StyleResolver::new(config.font_table.clone()),
            config.regenerate.clone(),
        );
        Self {
            registry,
            regenerator,
            sessions,
            low_confidence_threshold: config.ocr.low_confidence_threshold,
        }
    }

    /// Replace the extractor registry.
    pub fn with_registry(mut self, registry: ExtractorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the regenerator.
    pub fn with_regenerator(mut self, regenerator: Regenerator) -> Self {
        self.regenerator = regenerator;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Verify, extract and open a session for a document.
    pub fn upload(&self, bytes: Vec<u8>, format: DocumentFormat) -> Result<Upload> {
        verify_declared(&bytes, format)?;
        let source = SourceDocument::new(bytes, format);
        let Extraction { layout, warnings } = self.registry.extract(&source)?;

        let session_id = self
            .sessions
            .create(source, layout.clone(), warnings.clone());
        log::info!(
            "session {}: {} fields, {} images, {} warnings",
            session_id,
            layout.fields.len(),
            layout.images.len(),
            warnings.len()
        );

        Ok(Upload {
            session_id,
            layout,
            warnings,
        })
    }

    /// Warnings for an edit set against a session's layout.
    pub fn preview(&self, session_id: Uuid, edits: &EditSet) -> Result<Vec<Warning>> {
        self.sessions.with_session(session_id, |session| {
            preview(
                &session.layout,
                edits,
                &session.warnings,
                self.regenerator.resolver(),
                self.low_confidence_threshold,
            )
        })
    }

    /// Render a session's document with edited values.
    pub fn regenerate(
        &self,
        session_id: Uuid,
        edits: &EditSet,
        target: TargetFormat,
    ) -> Result<OutputDocument> {
        self.sessions.with_session(session_id, |session| {
            self.regenerator
                .regenerate(&session.source, &session.layout, edits, target)
        })
    }

    /// Render several targets from one session; fails on the first error.
    pub fn regenerate_many(
        &self,
        session_id: Uuid,
        edits: &EditSet,
        targets: &[TargetFormat],
    ) -> Result<Vec<OutputDocument>> {
        self.sessions.with_session(session_id, |session| {
            targets
                .iter()
                .map(|target| {
                    self.regenerator
                        .regenerate(&session.source, &session.layout, edits, *target)
                })
                .collect()
        })
    }

    /// Close a session and drop its data.
    pub fn clear_session(&self, session_id: Uuid) -> Result<()> {
        self.sessions.remove(session_id)
    }

    /// Report which backends can run. Never fails.
    pub fn health(&self) -> Health {
        let pdf_available = self.registry.is_available(DocumentFormat::Pdf);
        let ocr_available = DocumentFormat::ALL
            .iter()
            .filter(|f| f.is_image())
            .all(|f| self.registry.is_available(*f));
        Health {
            extractor_available: pdf_available && ocr_available,
            pdf_available,
            ocr_available,
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

/// Verify and extract a document with the default backends.
pub fn extract_document(bytes: Vec<u8>, format: DocumentFormat) -> Result<Extraction> {
    verify_declared(&bytes, format)?;
    ExtractorRegistry::default().extract(&SourceDocument::new(bytes, format))
}

/// Regenerate a document with the default style table and options.
pub fn regenerate_document(
    source: &SourceDocument,
    layout: &LayoutModel,
    edits: &EditSet,
    target: TargetFormat,
) -> Result<OutputDocument> {
    Regenerator::default().regenerate(source, layout, edits, target)
}

/// Preview warnings with the default style table and threshold.
pub fn preview_warnings(
    layout: &LayoutModel,
    edits: &EditSet,
    extraction_warnings: &[Warning],
) -> Result<Vec<Warning>> {
    let config = EditorConfig::default();
    preview(
        layout,
        edits,
        extraction_warnings,
        &StyleResolver::new(config.font_table),
        config.ocr.low_confidence_threshold,
    )
}

/// Resolve a style hint with the default font table.
pub fn resolve_style(hint: &StyleHint) -> Resolution {
    StyleResolver::default().resolve(hint)
}
