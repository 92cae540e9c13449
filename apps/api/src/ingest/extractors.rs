//! Text extractors, one variant per [`DocumentFormat`].
//!
//! Every variant shares the same contract: `extract(file) -> ExtractionResult`. Extractors
//! report what they found verbatim; deciding that whitespace-only text is a failure is
//! the orchestrator's job. CPU-heavy parsing runs on `spawn_blocking`, OCR runs as a
//! child process.

use std::io::Write as _;

use bytes::Bytes;
use docx_rs::{
    DocumentChild, Docx, InsertChild, Paragraph, ParagraphChild, Run, RunChild, Table,
    TableCellContent, TableChild, TableRowChild,
};
use tokio::process::Command;
use tracing::debug;

use crate::ingest::format::DocumentFormat;

/// One uploaded file, owned by the orchestrator for the duration of a single run.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Bytes,
    pub name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Text(String),
    Failure(String),
}

/// Settings for the Tesseract CLI.
#[derive(Debug, Clone)]
pub struct OcrSettings {
    pub binary: String,
    pub language: String,
}

#[derive(Debug, Clone)]
pub enum Extractor {
    Pdf,
    Document,
    Ocr(OcrSettings),
    PlainText,
}

impl Extractor {
    pub fn for_format(format: DocumentFormat, ocr: &OcrSettings) -> Self {
        match format {
            DocumentFormat::Pdf => Extractor::Pdf,
            DocumentFormat::Document => Extractor::Document,
            DocumentFormat::Image => Extractor::Ocr(ocr.clone()),
            DocumentFormat::PlainText => Extractor::PlainText,
        }
    }

    /// True for extractors whose caller must announce a long wait before calling.
    pub fn is_slow(&self) -> bool {
        matches!(self, Extractor::Ocr(_))
    }

    pub async fn extract(&self, file: &UploadedFile) -> ExtractionResult {
        match self {
            Extractor::Pdf => extract_pdf(file.bytes.clone()).await,
            Extractor::Document => extract_docx(file.bytes.clone()).await,
            Extractor::Ocr(settings) => extract_ocr(settings, file).await,
            Extractor::PlainText => decode_text(&file.bytes),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PDF
// ────────────────────────────────────────────────────────────────────────────

async fn extract_pdf(bytes: Bytes) -> ExtractionResult {
    let pages =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
            .await;

    match pages {
        Ok(Ok(pages)) => {
            debug!(pages = pages.len(), "extracted PDF text layer");
            ExtractionResult::Text(join_pdf_pages(&pages))
        }
        Ok(Err(e)) => ExtractionResult::Failure(format!("Could not read PDF: {e}")),
        Err(e) => ExtractionResult::Failure(format!("PDF extraction aborted: {e}")),
    }
}

/// Joins the text fragments (non-blank lines) of a page with single spaces, and pages
/// with newlines. A document without a text layer yields blank output, not an error.
pub(crate) fn join_pdf_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| {
            page.lines()
                .map(str::trim)
                .filter(|fragment| !fragment.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ────────────────────────────────────────────────────────────────────────────
// Word documents
// ────────────────────────────────────────────────────────────────────────────

async fn extract_docx(bytes: Bytes) -> ExtractionResult {
    let parsed = tokio::task::spawn_blocking(move || {
        docx_rs::read_docx(&bytes)
            .map(|docx| docx_plain_text(&docx))
            .map_err(|e| e.to_string())
    })
    .await;

    match parsed {
        Ok(Ok(text)) => ExtractionResult::Text(text),
        Ok(Err(e)) => ExtractionResult::Failure(format!("Could not convert document: {e}")),
        Err(e) => ExtractionResult::Failure(format!("Document conversion aborted: {e}")),
    }
}

/// Paragraph text in document order, one line per paragraph. Tables are read row by row
/// and cell by cell; hyperlink and tracked-insertion runs count as body text, tracked
/// deletions do not.
fn docx_plain_text(docx: &Docx) -> String {
    let mut text = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => push_paragraph(&mut text, paragraph),
            DocumentChild::Table(table) => push_table(&mut text, table),
            _ => {}
        }
    }
    text
}

fn push_table(out: &mut String, table: &Table) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row;
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell;
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(paragraph) => push_paragraph(out, paragraph),
                    TableCellContent::Table(nested) => push_table(out, nested),
                    _ => {}
                }
            }
        }
    }
}

fn push_paragraph(out: &mut String, paragraph: &Paragraph) {
    push_inline(out, &paragraph.children);
    out.push('\n');
}

fn push_inline(out: &mut String, children: &[ParagraphChild]) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run(out, run),
            ParagraphChild::Hyperlink(link) => push_inline(out, &link.children),
            ParagraphChild::Insert(insert) => {
                for inserted in &insert.children {
                    if let InsertChild::Run(run) = inserted {
                        push_run(out, run);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(out: &mut String, run: &Run) {
    for piece in &run.children {
        match piece {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// OCR
// ────────────────────────────────────────────────────────────────────────────

async fn extract_ocr(settings: &OcrSettings, file: &UploadedFile) -> ExtractionResult {
    // Tesseract reads from a path; the spool file is removed when `image` drops.
    let image = match spool(file) {
        Ok(image) => image,
        Err(e) => return ExtractionResult::Failure(format!("Could not stage image for OCR: {e}")),
    };

    let output = Command::new(&settings.binary)
        .arg(image.path())
        .arg("stdout")
        .arg("-l")
        .arg(&settings.language)
        .kill_on_drop(true)
        .output()
        .await;

    match output {
        Err(e) => ExtractionResult::Failure(format!(
            "Could not start OCR engine '{}': {e}",
            settings.binary
        )),
        Ok(out) if !out.status.success() => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            ExtractionResult::Failure(format!("OCR failed: {}", stderr.trim()))
        }
        Ok(out) => {
            debug!(bytes = out.stdout.len(), "OCR finished");
            ExtractionResult::Text(String::from_utf8_lossy(&out.stdout).into_owned())
        }
    }
}

fn spool(file: &UploadedFile) -> std::io::Result<tempfile::NamedTempFile> {
    let suffix = file
        .name
        .rsplit_once('.')
        .map(|(_, ext)| format!(".{ext}"))
        .unwrap_or_default();
    let mut spooled = tempfile::Builder::new()
        .prefix("vitae-ocr-")
        .suffix(&suffix)
        .tempfile()?;
    spooled.write_all(&file.bytes)?;
    spooled.flush()?;
    Ok(spooled)
}

// ────────────────────────────────────────────────────────────────────────────
// Plain text
// ────────────────────────────────────────────────────────────────────────────

fn decode_text(bytes: &[u8]) -> ExtractionResult {
    match std::str::from_utf8(bytes) {
        Ok(text) => ExtractionResult::Text(text.to_string()),
        Err(e) => ExtractionResult::Failure(format!("File is not valid UTF-8 text: {e}")),
    }
}
