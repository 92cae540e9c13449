//! Rendering surface: wraps a projected document in a standalone HTML page.
//!
//! Each request gets its own page (a fresh rendering context). Print mode adds a script
//! that waits a fixed settling delay, invokes the browser print action, and closes the
//! window; nothing reports back to the server.

use std::time::Duration;

use crate::print::projector::PrintableDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Preview,
    Print,
}

impl RenderMode {
    fn title(self) -> &'static str {
        match self {
            RenderMode::Preview => "Resume Preview",
            RenderMode::Print => "Print Resume",
        }
    }
}

pub const PRINT_STYLESHEET: &str = "@media print { @page { size: A4 portrait; margin: 0; } \
body { -webkit-print-color-adjust: exact; print-color-adjust: exact; } }";

const FONT_LINKS: &str = concat!(
    r#"<link rel="preconnect" href="https://fonts.googleapis.com">"#,
    r#"<link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>"#,
    r#"<link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;500;700&display=swap" rel="stylesheet">"#,
    r#"<link href="https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;700&display=swap" rel="stylesheet">"#,
);

/// Builds the complete page for one rendering context.
pub fn compose_page(document: &PrintableDocument, mode: RenderMode, settle: Duration) -> String {
    let mut page = String::with_capacity(document.markup().len() + 1024);
    page.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    page.push_str(&format!("<title>{}</title>", mode.title()));
    page.push_str(FONT_LINKS);
    page.push_str(&format!("<style>{PRINT_STYLESHEET}</style>"));
    page.push_str("</head><body style=\"margin: 0;\">");
    page.push_str(document.markup());

    if mode == RenderMode::Print {
        page.push_str(&format!(
            "<script>window.addEventListener('load', function () {{ setTimeout(function () {{ window.print(); window.close(); }}, {}); }});</script>",
            settle.as_millis()
        ));
    }

    page.push_str("</body></html>");
    page
}
