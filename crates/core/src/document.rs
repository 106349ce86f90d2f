//! Document and segment types.
//!
//! A [`Document`] is what the loader produced: an ordered list of pages.
//! A [`Segment`] is one bounded chunk of that text, the unit the embedding
//! index stores and retrieval returns.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A loaded source document, split into pages in reading order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Where the document came from (usually its path).
    pub source: String,

    /// Pages in reading order. Whitespace-only pages are not kept.
    pub pages: Vec<Page>,
}

impl Document {
    /// Total characters across all pages.
    pub fn char_len(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.text.trim().is_empty())
    }
}

/// One page of a document. Page numbers start at 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub text: String,
}

/// A bounded chunk of document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Content hash of (source, position, text); stable across runs.
    pub id: String,

    /// Source document reference.
    pub source: String,

    /// The chunk text.
    pub text: String,

    /// Order of this segment within its document, starting at 0.
    pub position: usize,

    /// Page the segment was cut from.
    pub page: u32,
}

impl Segment {
    pub fn new(source: impl Into<String>, text: impl Into<String>, position: usize, page: u32) -> Self {
        let source = source.into();
        let text = text.into();
        let id = segment_id(&source, position, &text);
        Self { id, source, text, position, page }
    }
}

fn segment_id(source: &str, position: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update([0u8]);
    hasher.update(position.to_le_bytes());
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// A retrieved segment and its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredSegment {
    pub segment: Segment,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_id_is_deterministic() {
        let a = Segment::new("book.pdf", "Vitamin D is made in skin.", 3, 2);
        let b = Segment::new("book.pdf", "Vitamin D is made in skin.", 3, 2);
        assert_eq!(a.id, b.id);
        assert_eq!(a.id.len(), 64);
    }

    #[test]
    fn segment_id_depends_on_position_and_source() {
        let a = Segment::new("book.pdf", "same text", 0, 1);
        let b = Segment::new("book.pdf", "same text", 1, 1);
        let c = Segment::new("other.pdf", "same text", 0, 1);
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn document_emptiness() {
        let doc = Document {
            source: "x".into(),
            pages: vec![Page { number: 1, text: "  \n".into() }],
        };
        assert!(doc.is_empty());

        let doc = Document {
            source: "x".into(),
            pages: vec![Page { number: 1, text: "héllo".into() }],
        };
        assert!(!doc.is_empty());
        assert_eq!(doc.char_len(), 5);
    }
}
