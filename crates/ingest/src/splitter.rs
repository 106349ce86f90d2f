//! Bounded-size text splitting.
//!
//! Each page is split on its own, so a segment never spans two pages.
//! Cuts prefer the last sentence terminator past `min_chunk_chars`, then the
//! last whitespace, then a hard cut at the size limit.

use ragline_config::DocumentConfig;
use ragline_core::document::{Document, Segment};
use ragline_core::error::IngestError;
use tracing::{debug, warn};

/// Characters per token for the size heuristic.
pub const CHARS_PER_TOKEN: usize = 4;

const SENTENCE_TERMINATORS: [char; 4] = ['.', '!', '?', '\n'];

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    /// Maximum segment size in tokens.
    pub chunk_size_tokens: usize,
    /// Sentence cuts are only taken past this many characters.
    pub min_chunk_chars: usize,
    /// Pieces shorter than this (trimmed) are folded into the previous
    /// segment when they fit, otherwise dropped.
    pub min_segment_chars: usize,
    /// Hard cap on segments per document.
    pub max_segments: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self::from(&DocumentConfig::default())
    }
}

impl From<&DocumentConfig> for SplitterConfig {
    fn from(config: &DocumentConfig) -> Self {
        Self {
            chunk_size_tokens: config.chunk_size_tokens,
            min_chunk_chars: config.min_chunk_chars,
            min_segment_chars: config.min_segment_chars,
            max_segments: config.max_segments,
        }
    }
}

impl SplitterConfig {
    /// Maximum segment size in characters.
    pub fn max_chars(&self) -> usize {
        (self.chunk_size_tokens * CHARS_PER_TOKEN).max(1)
    }
}

pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split a whole document into segments, in reading order.
    ///
    /// Fails with [`IngestError::Empty`] when nothing survives splitting.
    pub fn split(&self, document: &Document) -> Result<Vec<Segment>, IngestError> {
        let mut segments = Vec::new();

        'pages: for page in &document.pages {
            for text in self.split_text(&page.text) {
                if segments.len() == self.config.max_segments {
                    warn!(
                        source = %document.source,
                        max_segments = self.config.max_segments,
                        "Segment limit reached, ignoring the rest of the document"
                    );
                    break 'pages;
                }
                let position = segments.len();
                segments.push(Segment::new(&document.source, text, position, page.number));
            }
        }

        if segments.is_empty() {
            return Err(IngestError::Empty(document.source.clone()));
        }

        debug!(source = %document.source, segments = segments.len(), "Document split");
        Ok(segments)
    }

    /// Split one run of text into trimmed pieces of at most `max_chars`
    /// characters.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let max = self.config.max_chars();
        let mut pieces: Vec<String> = Vec::new();
        let mut rest = text.trim();

        while !rest.is_empty() {
            let cut = self.cut_point(rest, max);
            let (head, tail) = rest.split_at(cut);
            self.push_piece(&mut pieces, head.trim(), max);
            rest = tail.trim_start();
        }

        pieces
    }

    /// Byte offset to cut `text` at. Always > 0 and on a char boundary.
    fn cut_point(&self, text: &str, max: usize) -> usize {
        let Some(limit) = byte_offset(text, max) else {
            return text.len();
        };
        let window = &text[..limit];

        let min = byte_offset(window, self.config.min_chunk_chars).unwrap_or(window.len());
        if let Some(pos) = window[min..].rfind(SENTENCE_TERMINATORS) {
            // Keep the terminator with the sentence it ends.
            return min + pos + 1;
        }

        match window.rfind(char::is_whitespace) {
            Some(pos) if pos > 0 => pos,
            _ => limit,
        }
    }

    fn push_piece(&self, pieces: &mut Vec<String>, piece: &str, max: usize) {
        if piece.is_empty() {
            return;
        }
        if piece.chars().count() >= self.config.min_segment_chars {
            pieces.push(piece.to_string());
            return;
        }
        match pieces.last_mut() {
            Some(last) if last.chars().count() + 1 + piece.chars().count() <= max => {
                last.push(' ');
                last.push_str(piece);
            }
            _ => debug!(piece, "Dropping short fragment"),
        }
    }
}

/// Byte offset of the `n`th char, or `None` if `text` has `n` chars or fewer.
fn byte_offset(text: &str, n: usize) -> Option<usize> {
    text.char_indices().nth(n).map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ragline_core::document::Page;

    fn splitter(chunk_size_tokens: usize, min_chunk_chars: usize) -> TextSplitter {
        TextSplitter::new(SplitterConfig {
            chunk_size_tokens,
            min_chunk_chars,
            min_segment_chars: 1,
            max_segments: 10_000,
        })
    }

    fn doc(pages: &[&str]) -> Document {
        Document {
            source: "book.pdf".into(),
            pages: pages
                .iter()
                .zip(1u32..)
                .map(|(text, number)| Page { number, text: text.to_string() })
                .collect(),
        }
    }

    fn strip_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn short_text_is_one_segment() {
        let pieces = splitter(800, 350).split_text("  Vitamin D is made in the skin.  ");
        assert_eq!(pieces, vec!["Vitamin D is made in the skin."]);
    }

    #[test]
    fn prefers_sentence_boundary_past_minimum() {
        // max 40 chars, sentences only count after 10
        let s = splitter(10, 10);
        let pieces = s.split_text("Short one. This sentence ends here. And then more text follows.");
        assert_eq!(pieces[0], "Short one. This sentence ends here.");
        assert!(pieces.iter().all(|p| p.chars().count() <= 40));
    }

    #[test]
    fn falls_back_to_whitespace() {
        let s = splitter(2, 0);
        let pieces = s.split_text("alpha beta gamma delta");
        assert_eq!(pieces, vec!["alpha", "beta", "gamma", "delta"]);
    }

    #[test]
    fn hard_splits_unbroken_text_on_char_boundaries() {
        let s = splitter(1, 0);
        let pieces = s.split_text("ééééééééé");
        assert_eq!(pieces, vec!["éééé", "éééé", "é"]);
    }

    #[test]
    fn segments_never_span_pages() {
        let segments = splitter(800, 350)
            .split(&doc(&["Page one text.", "Page two text."]))
            .unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].page, 1);
        assert_eq!(segments[1].page, 2);
        assert_eq!(segments[1].position, 1);
    }

    #[test]
    fn short_fragments_fold_into_previous_segment() {
        // max 20 chars; the cut lands before a long whitespace run
        let s = TextSplitter::new(SplitterConfig {
            chunk_size_tokens: 5,
            min_chunk_chars: 0,
            min_segment_chars: 5,
            max_segments: 100,
        });
        let pieces = s.split_text("Hello.              Hi");
        assert_eq!(pieces, vec!["Hello. Hi"]);
    }

    #[test]
    fn page_number_only_pages_are_dropped() {
        let s = TextSplitter::new(SplitterConfig::default());
        let segments = s.split(&doc(&["12", "Vitamin D matters."])).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].page, 2);
    }

    #[test]
    fn max_segments_caps_output() {
        let s = TextSplitter::new(SplitterConfig {
            chunk_size_tokens: 2,
            min_chunk_chars: 0,
            min_segment_chars: 1,
            max_segments: 3,
        });
        let segments = s.split(&doc(&["one two three four five six"])).unwrap();
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn empty_document_is_an_error() {
        let err = splitter(800, 350).split(&doc(&["   "])).unwrap_err();
        assert!(matches!(err, IngestError::Empty(_)));
    }

    #[test]
    fn default_config_matches_document_defaults() {
        let config = SplitterConfig::default();
        assert_eq!(config.max_chars(), 3200);
        assert_eq!(config.min_chunk_chars, 350);
        assert_eq!(config.min_segment_chars, 5);
        assert_eq!(config.max_segments, 10_000);
    }

    proptest! {
        #[test]
        fn pieces_respect_size_and_keep_all_text(
            text in "[a-zA-Zé.!? \n]{0,600}",
            tokens in 1usize..40,
            min in 0usize..100,
        ) {
            let s = splitter(tokens, min);
            let max = s.config().max_chars();
            let pieces = s.split_text(&text);

            for piece in &pieces {
                prop_assert!(piece.chars().count() <= max);
                prop_assert!(!piece.is_empty());
            }

            let joined: String = pieces.iter().map(|p| strip_ws(p)).collect();
            prop_assert_eq!(&joined, &strip_ws(&text));

            let content = strip_ws(&text).chars().count();
            prop_assert!(pieces.len() >= content.div_ceil(max));
        }
    }
}
