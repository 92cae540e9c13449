//! Format Classifier: picks the extraction strategy for an uploaded file.
//!
//! Extension match for `.pdf`, `.doc` and `.docx` wins over the declared MIME type.
//! Otherwise the MIME prefix decides (`image/`, `text/`). Anything else is rejected;
//! there is no fallback to plain text.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Document,
    Image,
    PlainText,
}

pub fn classify(name: &str, mime_type: &str) -> Option<DocumentFormat> {
    let name = name.trim().to_ascii_lowercase();
    if name.ends_with(".pdf") {
        return Some(DocumentFormat::Pdf);
    }
    if name.ends_with(".docx") || name.ends_with(".doc") {
        return Some(DocumentFormat::Document);
    }

    let mime_type = mime_type.trim().to_ascii_lowercase();
    if mime_type.starts_with("image/") {
        Some(DocumentFormat::Image)
    } else if mime_type.starts_with("text/") {
        Some(DocumentFormat::PlainText)
    } else {
        None
    }
}
