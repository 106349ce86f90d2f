//! Document ingestion for Ragline.
//!
//! [`load_document`] reads a PDF or paginated text file into a
//! [`Document`]; [`TextSplitter`] cuts it into bounded [`Segment`]s.
//! Nothing here touches storage.

pub mod loader;
pub mod splitter;

pub use loader::{load_document, load_pdf, load_text};
pub use splitter::{SplitterConfig, TextSplitter};

use ragline_core::document::{Document, Segment};
use ragline_core::error::IngestError;
use std::path::Path;
use tracing::info;

/// Split a loaded document into segments.
pub fn ingest(document: &Document, config: &SplitterConfig) -> Result<Vec<Segment>, IngestError> {
    TextSplitter::new(config.clone()).split(document)
}

/// Load and split the document at `path`.
pub fn ingest_path(path: &Path, config: &SplitterConfig) -> Result<Vec<Segment>, IngestError> {
    let document = load_document(path)?;
    let segments = ingest(&document, config)?;
    info!(
        source = %document.source,
        pages = document.pages.len(),
        chars = document.char_len(),
        segments = segments.len(),
        "Document ingested"
    );
    Ok(segments)
}
