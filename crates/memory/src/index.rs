//! In-process embedding index over document segments.
//!
//! Holds `{segment, vector}` records for the lifetime of the process and
//! answers nearest-neighbour queries by cosine similarity. Shared read-mostly
//! through an `Arc`; the records sit behind a `tokio::sync::RwLock`.

use crate::vector::rank_by_similarity;
use ragline_core::document::{ScoredSegment, Segment};
use ragline_core::embedding::Embedder;
use ragline_core::error::EmbeddingError;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// What an [`EmbeddingIndex::add`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Segments embedded and stored.
    pub added: usize,
    /// Segments whose id was already present.
    pub skipped: usize,
}

struct Record {
    segment: Segment,
    vector: Vec<f32>,
}

#[derive(Default)]
struct Inner {
    records: Vec<Record>,
    ids: HashSet<String>,
    dimensions: Option<usize>,
}

pub struct EmbeddingIndex {
    embedder: Arc<dyn Embedder>,
    inner: RwLock<Inner>,
    min_score: f32,
}

impl EmbeddingIndex {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            inner: RwLock::new(Inner::default()),
            min_score: f32::NEG_INFINITY,
        }
    }

    /// Drop results scoring below `min_score`. 0.0 (the configured default)
    /// keeps everything.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = if min_score > 0.0 { min_score } else { f32::NEG_INFINITY };
        self
    }

    /// Embed and store segments. Segments already present (by id) are
    /// skipped and not re-embedded.
    pub async fn add(&self, segments: Vec<Segment>) -> Result<IndexReport, EmbeddingError> {
        let offered = segments.len();
        let fresh: Vec<Segment> = {
            let inner = self.inner.read().await;
            let mut seen = HashSet::new();
            segments
                .into_iter()
                .filter(|s| !inner.ids.contains(&s.id) && seen.insert(s.id.clone()))
                .collect()
        };
        let mut report = IndexReport::default();

        if fresh.is_empty() {
            report.skipped = offered;
            return Ok(report);
        }

        let texts: Vec<String> = fresh.iter().map(|s| s.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                got: vectors.len(),
            });
        }

        let mut inner = self.inner.write().await;
        let mut dimensions = inner.dimensions;
        for vector in &vectors {
            let expected = *dimensions.get_or_insert(vector.len());
            if vector.len() != expected {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    got: vector.len(),
                });
            }
        }
        inner.dimensions = dimensions;

        for (segment, vector) in fresh.into_iter().zip(vectors) {
            // Another add may have raced us between the read and write locks.
            if inner.ids.insert(segment.id.clone()) {
                inner.records.push(Record { segment, vector });
                report.added += 1;
            }
        }
        report.skipped = offered - report.added;

        info!(
            embedder = %self.embedder.name(),
            added = report.added,
            total = inner.records.len(),
            "Segments indexed"
        );
        Ok(report)
    }

    /// Return the `k` segments most similar to `text`, best first.
    ///
    /// An empty index returns nothing without calling the embedder.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<ScoredSegment>, EmbeddingError> {
        if k == 0 || self.is_empty().await {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed_one(text).await?;

        let inner = self.inner.read().await;
        if let Some(expected) = inner.dimensions
            && expected != query.len()
        {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                got: query.len(),
            });
        }

        let ranked = rank_by_similarity(
            inner.records.iter().map(|r| r.vector.as_slice()),
            &query,
            k,
            self.min_score,
        );

        let results: Vec<ScoredSegment> = ranked
            .into_iter()
            .map(|(i, score)| ScoredSegment {
                segment: inner.records[i].segment.clone(),
                score,
            })
            .collect();

        debug!(k, hits = results.len(), "Index queried");
        Ok(results)
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }

    /// Vector size, once the first segment has been stored.
    pub async fn dimensions(&self) -> Option<usize> {
        self.inner.read().await.dimensions
    }
}
