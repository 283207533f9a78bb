//! Session lifecycle through the editor.

mod common;

use std::sync::Arc;

use common::{blank_png, pdf_with_lines, resume_words, MockEngine};
use docrewrite::extract::{OcrExtractor, PdfExtractor};
use docrewrite::model::{DocumentFormat, TargetFormat, WarningCategory};
use docrewrite::{
    Editor, EditorConfig, Error, ExtractorRegistry, FontLibrary, OcrOptions, Regenerator,
    SessionOptions, SessionStore,
};
use uuid::Uuid;

fn registry(engine: MockEngine) -> ExtractorRegistry {
    let mut registry = ExtractorRegistry::new();
    registry.register(Arc::new(PdfExtractor::new()));
    registry.register(Arc::new(OcrExtractor::new(
        Arc::new(engine),
        OcrOptions::default(),
    )));
    registry
}

fn editor(engine: MockEngine) -> Editor {
    Editor::new(EditorConfig::default())
        .with_registry(registry(engine))
        .with_regenerator(Regenerator::default().with_fonts(Arc::new(FontLibrary::empty())))
}

fn resume_pdf() -> Vec<u8> {
    pdf_with_lines(&[("John Doe", 720.0), ("Engineer", 700.0), ("john@x.com", 680.0)])
}

#[test]
fn test_upload_preview_regenerate_clear() {
    let editor = editor(MockEngine::new(Vec::new()));
    let upload = editor.upload(resume_pdf(), DocumentFormat::Pdf).unwrap();
    assert_eq!(upload.layout.fields.len(), 3);
    assert_eq!(editor.sessions().len(), 1);

    let second = upload.layout.fields[1].id.clone();
    let edits = upload
        .layout
        .edits()
        .with_value(&second, "Senior Engineer")
        .unwrap();

    let warnings = editor.preview(upload.session_id, &edits).unwrap();
    assert!(warnings.iter().all(|w| w.category != WarningCategory::EmptyResult));

    let outputs = editor
        .regenerate_many(
            upload.session_id,
            &edits,
            &[TargetFormat::Pdf, TargetFormat::Docx],
        )
        .unwrap();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].format, TargetFormat::Pdf);
    assert_eq!(outputs[1].format, TargetFormat::Docx);

    editor.clear_session(upload.session_id).unwrap();
    assert!(editor.sessions().is_empty());
    assert!(matches!(
        editor.regenerate(upload.session_id, &edits, TargetFormat::Pdf),
        Err(Error::SessionNotFound(_))
    ));
    assert!(matches!(
        editor.clear_session(upload.session_id),
        Err(Error::SessionNotFound(_))
    ));
}

#[test]
fn test_session_survives_call_errors() {
    let editor = editor(MockEngine::new(Vec::new()));
    let upload = editor.upload(resume_pdf(), DocumentFormat::Pdf).unwrap();

    let mut partial = upload.layout.edits();
    partial.fields.remove(0);
    let err = editor
        .regenerate(upload.session_id, &partial, TargetFormat::Pdf)
        .unwrap_err();
    assert!(matches!(err, Error::InvalidFieldSet(_)));
    assert!(err.is_call_local());

    let err = editor
        .regenerate(upload.session_id, &upload.layout.edits(), TargetFormat::Tiff)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));

    let output = editor
        .regenerate(upload.session_id, &upload.layout.edits(), TargetFormat::Pdf)
        .unwrap();
    assert!(output.bytes.starts_with(b"%PDF-"));
}

#[test]
fn test_image_session() {
    let editor = editor(MockEngine::new(resume_words()));
    let upload = editor.upload(blank_png(200, 100), DocumentFormat::Png).unwrap();
    assert_eq!(upload.layout.fields.len(), 2);
    assert!(upload
        .warnings
        .iter()
        .any(|w| w.category == WarningCategory::LowConfidence));

    let weak = upload.layout.fields[1].id.clone();
    let edits = upload.layout.edits().with_value(&weak, "Engineer").unwrap();
    let warnings = editor.preview(upload.session_id, &edits).unwrap();
    assert!(warnings
        .iter()
        .any(|w| w.category == WarningCategory::LowConfidence && w.is_for(&weak)));

    let mut cleared = upload.layout.edits();
    for field in &mut cleared.fields {
        field.value.clear();
    }
    let output = editor
        .regenerate(upload.session_id, &cleared, TargetFormat::Png)
        .unwrap();
    assert_eq!(output.mime_type(), "image/png");
}

#[test]
fn test_empty_image_upload() {
    let editor = editor(MockEngine::new(Vec::new()));
    let upload = editor.upload(blank_png(50, 50), DocumentFormat::Png).unwrap();

    assert!(upload.layout.fields.is_empty());
    assert_eq!(upload.warnings.len(), 1);
    assert_eq!(upload.warnings[0].category, WarningCategory::EmptyResult);
    assert_eq!(editor.sessions().len(), 1);
}

#[test]
fn test_failed_upload_opens_no_session() {
    let editor = editor(MockEngine::unavailable());

    let result = editor.upload(blank_png(50, 50), DocumentFormat::Png);
    assert!(matches!(result, Err(Error::BackendUnavailable(_))));

    let result = editor.upload(resume_pdf(), DocumentFormat::Jpeg);
    assert!(result.is_err());

    assert!(editor.sessions().is_empty());
}

#[test]
fn test_unknown_session() {
    let editor = editor(MockEngine::new(Vec::new()));
    let result = editor.preview(Uuid::new_v4(), &Default::default());
    assert!(matches!(result, Err(Error::SessionNotFound(_))));
}

#[test]
fn test_health() {
    let health = editor(MockEngine::new(Vec::new())).health();
    assert!(health.pdf_available);
    assert!(health.ocr_available);
    assert!(health.extractor_available);

    let health = editor(MockEngine::unavailable()).health();
    assert!(health.pdf_available);
    assert!(!health.ocr_available);
    assert!(!health.extractor_available);

    let json = serde_json::to_string(&health).unwrap();
    assert!(json.contains("\"ocrAvailable\":false"));

    let bare = Editor::new(EditorConfig::default()).with_registry(ExtractorRegistry::new());
    assert!(!bare.health().pdf_available);
}

#[test]
fn test_editors_share_a_store() {
    let store = Arc::new(SessionStore::new(&SessionOptions::default()));
    let first = Editor::with_store(EditorConfig::default(), Arc::clone(&store))
        .with_registry(registry(MockEngine::new(Vec::new())));
    let second = Editor::with_store(EditorConfig::default(), Arc::clone(&store))
        .with_registry(registry(MockEngine::new(Vec::new())));

    let upload = first.upload(resume_pdf(), DocumentFormat::Pdf).unwrap();
    let warnings = second
        .preview(upload.session_id, &upload.layout.edits())
        .unwrap();
    assert!(warnings.is_empty());

    second.clear_session(upload.session_id).unwrap();
    assert!(store.is_empty());
}

#[test]
fn test_expired_sessions_are_gone() {
    let options = SessionOptions::new().with_ttl(chrono::Duration::zero());
    let store = Arc::new(SessionStore::new(&options));
    let editor = Editor::with_store(EditorConfig::default(), Arc::clone(&store))
        .with_registry(registry(MockEngine::new(Vec::new())));

    let upload = editor.upload(resume_pdf(), DocumentFormat::Pdf).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));

    let result = editor.regenerate(upload.session_id, &upload.layout.edits(), TargetFormat::Pdf);
    assert!(matches!(result, Err(Error::SessionNotFound(_))));
}
