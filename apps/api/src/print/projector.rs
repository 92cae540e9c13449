//! Print Projector: pure mapping from a valid record to fixed-layout A4 markup.
//!
//! # Layout
//! - Page: 210mm × 297mm, no outer margin, colours reproduced exactly.
//! - Section order is fixed (see [`SECTION_ORDER`]); each section carries a
//!   `data-section` attribute so the order is machine-checkable.
//! - Lists render as ordered bullet lists in record order.
//!
//! Projection never renders a partially valid record: any violation yields
//! [`ProjectionError`] and no markup at all.

use std::fmt::Write as _;

use serde::Serialize;
use thiserror::Error;

use crate::record::schema::{ListField, ScalarField, StructuredRecord};
use crate::record::validation::{validate_record, ValidationReport};

pub const PAGE_WIDTH_MM: u32 = 210;
pub const PAGE_HEIGHT_MM: u32 = 297;

pub const SECTION_ORDER: [&str; 8] = [
    "identity",
    "nationality",
    "education",
    "key-competencies",
    "personal-scorecard",
    "professional-experiences",
    "project-experiences",
    "footer",
];

const HEADING_FONT: &str = "'Space Grotesk', sans-serif";
const BODY_FONT: &str = "'Inter', sans-serif";
const BRAND_DARK: &str = "#0A4A8F";
const BRAND_LIGHT: &str = "#B2D9EE";
const SECTION_BAND: &str = "#004A8F";

#[derive(Debug, Error)]
#[error("Resume cannot be printed until every field is filled in: {violations}")]
pub struct ProjectionError {
    pub violations: ValidationReport,
}

/// Read-only printable markup. Regenerated from the record on every render request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintableDocument {
    markup: String,
}

impl PrintableDocument {
    pub fn markup(&self) -> &str {
        &self.markup
    }
}

#[derive(Debug, Clone, Default)]
pub struct PrintProjector {
    footer: String,
}

impl PrintProjector {
    pub fn new(footer: impl Into<String>) -> Self {
        Self {
            footer: footer.into(),
        }
    }

    pub fn project(&self, record: &StructuredRecord) -> Result<PrintableDocument, ProjectionError> {
        let violations = validate_record(record);
        if !violations.is_valid() {
            return Err(ProjectionError { violations });
        }

        let mut out = String::with_capacity(4096);
        let _ = write!(
            out,
            r#"<div class="resume-page" style="font-family: {BODY_FONT}; color: #333; background-color: white; width: {PAGE_WIDTH_MM}mm; min-height: {PAGE_HEIGHT_MM}mm; padding: 0; position: relative;">"#
        );

        push_identity(&mut out, record);

        out.push_str(r#"<div style="padding: 24px 48px;">"#);
        for (section, field) in [
            ("nationality", ScalarField::Nationality),
            ("education", ScalarField::Education),
            ("key-competencies", ScalarField::KeyCompetencies),
        ] {
            push_info_block(&mut out, section, field.label(), record.scalar(field));
        }

        let experience_lines = [
            (
                ScalarField::TotalExperience.label(),
                record.scalar(ScalarField::TotalExperience),
            ),
            (
                ScalarField::RelevantExperience.label(),
                record.scalar(ScalarField::RelevantExperience),
            ),
        ];
        push_list_section(
            &mut out,
            "personal-scorecard",
            ListField::PersonalScorecard,
            record,
            &experience_lines,
        );
        push_list_section(
            &mut out,
            "professional-experiences",
            ListField::ProfessionalExperiences,
            record,
            &[],
        );
        push_list_section(
            &mut out,
            "project-experiences",
            ListField::ProjectExperiences,
            record,
            &[],
        );
        out.push_str("</div>");

        let _ = write!(
            out,
            r#"<div data-section="footer" style="position: absolute; bottom: 24px; left: 0; right: 0; text-align: center;"><p style="margin: 0; color: #aaa;">{}</p></div>"#,
            escape_html(&self.footer)
        );
        out.push_str("</div>");

        Ok(PrintableDocument { markup: out })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Section builders
// ────────────────────────────────────────────────────────────────────────────

fn push_identity(out: &mut String, record: &StructuredRecord) {
    let _ = write!(
        out,
        r#"<div data-section="identity" style="background-color: {BRAND_LIGHT}; color: {BRAND_DARK}; padding: 24px 48px;"><h1 style="font-family: {HEADING_FONT}; font-size: 2.5rem; font-weight: bold; margin: 0;">{}</h1><p style="font-family: {HEADING_FONT}; font-size: 1.5rem; margin: 4px 0 0 0;">{}</p></div>"#,
        escape_html(&record.name),
        escape_html(&record.designation)
    );
}

fn push_info_block(out: &mut String, section: &str, label: &str, value: &str) {
    let _ = write!(
        out,
        r#"<div data-section="{section}" style="border-bottom: 2px solid {BRAND_LIGHT}; padding-bottom: 16px; margin-bottom: 24px;"><h3 style="font-family: {HEADING_FONT}; font-weight: bold; color: {BRAND_DARK}; margin: 0;">{label}:</h3><p style="margin: 4px 0 0 0;">{}</p></div>"#,
        escape_html(value)
    );
}

fn push_list_section(
    out: &mut String,
    section: &str,
    list: ListField,
    record: &StructuredRecord,
    preamble: &[(&str, &str)],
) {
    let _ = write!(
        out,
        r#"<div data-section="{section}" style="display: flex; margin-bottom: 16px; break-inside: avoid;"><div style="flex-shrink: 0; width: 180px; background-color: {SECTION_BAND}; color: white; padding: 12px; display: flex; align-items: center; justify-content: center; font-family: {HEADING_FONT};"><h2 style="font-weight: bold; font-size: 1rem;">{}</h2></div><div style="flex-grow: 1; padding: 12px; border: 1px solid #ddd; border-left: none;">"#,
        list.label()
    );

    if !preamble.is_empty() {
        out.push_str(r#"<div style="padding-bottom: 12px; font-size: 10pt;">"#);
        for (label, value) in preamble {
            let _ = write!(
                out,
                r#"<p style="margin: 0 0 4px 0;"><strong>{label}:</strong> {}</p>"#,
                escape_html(value)
            );
        }
        out.push_str("</div>");
    }

    out.push_str(r#"<ul style="margin: 0; padding-left: 20px; list-style-type: disc;">"#);
    for item in record.list(list) {
        let _ = write!(
            out,
            r#"<li style="font-size: 10pt; line-height: 1.5; margin-bottom: 4px;">{}</li>"#,
            escape_html(item)
        );
    }
    out.push_str("</ul></div></div>");
}

/// Escapes text for inclusion in HTML element content and attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
