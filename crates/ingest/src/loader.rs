//! Document loaders.
//!
//! PDFs are read page by page with `lopdf`. Plain text and Markdown files
//! are read as UTF-8 and paginated on form feeds (`\x0C`).

use ragline_core::document::{Document, Page};
use ragline_core::error::IngestError;
use std::path::Path;
use tracing::{debug, warn};

const FORM_FEED: char = '\x0C';

/// Load a document from disk, choosing the reader by file extension.
pub fn load_document(path: &Path) -> Result<Document, IngestError> {
    let source = path.display().to_string();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let document = match extension.as_str() {
        "pdf" => {
            let bytes = read(path)?;
            load_pdf(&source, &bytes)?
        }
        "txt" | "md" => {
            let bytes = read(path)?;
            let text = String::from_utf8(bytes).map_err(|e| IngestError::Parse {
                path: source.clone(),
                reason: e.to_string(),
            })?;
            load_text(&source, &text)
        }
        _ => return Err(IngestError::UnsupportedFormat(source)),
    };

    if document.is_empty() {
        return Err(IngestError::Empty(source));
    }

    debug!(source = %document.source, pages = document.pages.len(), "Document loaded");
    Ok(document)
}

fn read(path: &Path) -> Result<Vec<u8>, IngestError> {
    std::fs::read(path).map_err(|e| IngestError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Parse PDF bytes into one [`Page`] per PDF page.
///
/// A page whose text can't be extracted is skipped with a warning; only a
/// document-level parse failure is an error.
pub fn load_pdf(source: &str, bytes: &[u8]) -> Result<Document, IngestError> {
    let pdf = lopdf::Document::load_mem(bytes).map_err(|e| IngestError::Parse {
        path: source.to_string(),
        reason: e.to_string(),
    })?;

    let mut pages = Vec::new();
    for number in pdf.get_pages().into_keys() {
        match pdf.extract_text(&[number]) {
            Ok(text) if !text.trim().is_empty() => pages.push(Page { number, text }),
            Ok(_) => debug!(source, page = number, "Skipping blank page"),
            Err(e) => warn!(source, page = number, error = %e, "Failed to extract page text"),
        }
    }

    Ok(Document {
        source: source.to_string(),
        pages,
    })
}

/// Split text into pages on form feeds. Page numbers count blank pages too.
pub fn load_text(source: &str, text: &str) -> Document {
    let pages = text
        .split(FORM_FEED)
        .zip(1u32..)
        .filter(|(page, _)| !page.trim().is_empty())
        .map(|(page, number)| Page {
            number,
            text: page.to_string(),
        })
        .collect();

    Document {
        source: source.to_string(),
        pages,
    }
}
