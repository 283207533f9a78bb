//! Form label inference for extracted fields.
//!
//! Labels are hints for a form UI. They are not unique and carry no meaning
//! for regeneration.

use std::sync::OnceLock;

use regex::Regex;

/// Fields whose top edge is above this line are treated as header text.
const HEADER_BAND: f32 = 150.0;

/// Texts longer than this read as free-form descriptions in OCR output.
const DESCRIPTION_LEN: usize = 50;

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?\d[\d\s\-()]+$").expect("valid phone pattern"))
}

fn date_pattern() -> &'static Regex {
    static DATE: OnceLock<Regex> = OnceLock::new();
    DATE.get_or_init(|| Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{2,4}").expect("valid date pattern"))
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn is_email(lower: &str) -> bool {
    lower.contains('@') && lower.contains('.')
}

/// Label for a structurally extracted PDF run.
///
/// `index` is the 1-based field position; `top` is the field's top edge.
pub fn pdf_label(text: &str, top: f32, index: usize) -> String {
    let lower = text.to_lowercase();

    let label = if contains_any(&lower, &["name", "title"]) {
        "Name/Title"
    } else if is_email(&lower) {
        "Email"
    } else if contains_any(&lower, &["phone", "mobile", "tel"]) {
        "Phone"
    } else if contains_any(&lower, &["address", "location", "city"]) {
        "Address"
    } else if contains_any(&lower, &["experience", "work", "employment"]) {
        "Work Experience Section"
    } else if contains_any(&lower, &["education", "degree", "university", "college"]) {
        "Education Section"
    } else if contains_any(&lower, &["skill", "technical", "competenc"]) {
        "Skills Section"
    } else if contains_any(&lower, &["summary", "objective", "profile"]) {
        "Summary/Objective"
    } else if top < HEADER_BAND {
        return format!("Header Text {}", index);
    } else {
        return format!("Content {}", index);
    };

    label.to_string()
}

/// Label for an OCR-recognized line.
pub fn ocr_label(text: &str, top: f32, index: usize) -> String {
    let lower = text.to_lowercase();
    let trimmed = text.trim();

    let label = if is_email(&lower) {
        "Email"
    } else if phone_pattern().is_match(trimmed) {
        "Phone"
    } else if contains_any(&lower, &["name", "title"]) {
        "Name/Title"
    } else if contains_any(&lower, &["address", "street", "city", "location"]) {
        "Address"
    } else if contains_any(&lower, &["company", "organization", "corp", "inc"]) {
        "Company"
    } else if lower.contains("date") || date_pattern().is_match(&lower) {
        "Date"
    } else if trimmed.chars().count() > DESCRIPTION_LEN {
        return format!("Description {}", index);
    } else if top < HEADER_BAND {
        return format!("Header Text {}", index);
    } else {
        return format!("Text Field {}", index);
    };

    label.to_string()
}
