use thiserror::Error;
use tracing::debug;

use finsight_core::Chunk;
use finsight_index::{EmbeddingIndex, IndexEntry, IndexError};

use crate::embedding::EmbeddingClient;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("failed to build index: {0}")]
    Backend(String),
    #[error("failed to build index: {0}")]
    Index(#[from] IndexError),
}

/// Embeds every chunk in one batch and constructs the index. Any backend
/// failure aborts the whole build; the index is never partially built.
pub fn build_index(
    chunks: Vec<Chunk>,
    embeddings: &EmbeddingClient,
) -> Result<EmbeddingIndex, BuildError> {
    let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
    let vectors = embeddings
        .embed_batch(&texts)
        .map_err(|err| BuildError::Backend(err.to_string()))?;
    if vectors.len() != chunks.len() {
        return Err(BuildError::Backend(format!(
            "backend returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        )));
    }
    let entries: Vec<IndexEntry> = chunks
        .into_iter()
        .zip(vectors)
        .map(|(chunk, vector)| IndexEntry { chunk, vector })
        .collect();
    let index = EmbeddingIndex::new(entries)?;
    debug!(chunks = index.len(), dimensions = index.dimensions(), "built embedding index");
    Ok(index)
}
