use finsight_core::Chunk;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("cannot build an index from zero entries")]
    Empty,
    #[error("embedding dimension mismatch: entry {ordinal} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        ordinal: usize,
        found: usize,
        expected: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk_id: String,
    pub ordinal: usize,
    pub text: String,
    pub score: f32,
}

/// In-memory similarity index over one document's chunks. Immutable after
/// construction; a new upload replaces the whole index.
#[derive(Debug)]
pub struct EmbeddingIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl EmbeddingIndex {
    /// All-or-nothing construction: zero entries or a dimension mismatch
    /// rejects the whole batch, never a partial index.
    pub fn new(entries: Vec<IndexEntry>) -> Result<Self, IndexError> {
        let dimensions = entries.first().map(|e| e.vector.len()).ok_or(IndexError::Empty)?;
        for entry in &entries {
            if entry.vector.len() != dimensions {
                return Err(IndexError::DimensionMismatch {
                    ordinal: entry.chunk.ordinal,
                    found: entry.vector.len(),
                    expected: dimensions,
                });
            }
        }
        Ok(Self {
            entries,
            dimensions,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Exact nearest-neighbor scan by cosine similarity, nearest first,
    /// truncated to `k`.
    pub fn query(&self, vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        let mut hits: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk_id: entry.chunk.chunk_id.clone(),
                ordinal: entry.chunk.ordinal,
                text: entry.chunk.text.clone(),
                score: cosine_similarity(vector, &entry.vector),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        hits
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut a_norm = 0.0f32;
    let mut b_norm = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        a_norm += x * x;
        b_norm += y * y;
    }
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    dot / (a_norm.sqrt() * b_norm.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ordinal: usize, text: &str, vector: Vec<f32>) -> IndexEntry {
        IndexEntry {
            chunk: Chunk {
                chunk_id: format!("chunk_{ordinal}"),
                ordinal,
                text: text.to_string(),
            },
            vector,
        }
    }

    #[test]
    fn query_returns_nearest_first() {
        let index = EmbeddingIndex::new(vec![
            entry(0, "alpha", vec![1.0, 0.0]),
            entry(1, "beta", vec![0.0, 1.0]),
            entry(2, "gamma", vec![0.7, 0.7]),
        ])
        .unwrap();
        let hits = index.query(&[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "alpha");
        assert_eq!(hits[1].text, "gamma");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn k_larger_than_index_returns_everything() {
        let index = EmbeddingIndex::new(vec![entry(0, "only", vec![1.0])]).unwrap();
        assert_eq!(index.query(&[1.0], 4).len(), 1);
    }

    #[test]
    fn empty_batch_is_rejected() {
        assert!(matches!(EmbeddingIndex::new(Vec::new()), Err(IndexError::Empty)));
    }

    #[test]
    fn dimension_mismatch_rejects_the_whole_batch() {
        let err = EmbeddingIndex::new(vec![
            entry(0, "a", vec![1.0, 0.0]),
            entry(1, "b", vec![1.0]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            IndexError::DimensionMismatch {
                ordinal: 1,
                found: 1,
                expected: 2
            }
        ));
    }

    #[test]
    fn zero_vector_scores_zero() {
        let index = EmbeddingIndex::new(vec![entry(0, "a", vec![0.0, 0.0])]).unwrap();
        let hits = index.query(&[1.0, 0.0], 1);
        assert_eq!(hits[0].score, 0.0);
    }
}
