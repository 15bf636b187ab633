use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::IngestError;

const CHUNK_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: 800,
            overlap_chars: 150,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub ordinal: usize,
    pub text: String,
}

pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Greedy fixed-window split over char boundaries. Consecutive chunks
    /// share `overlap_chars` characters; together they cover the input with
    /// no gaps.
    pub fn split(&self, text: &str) -> Result<Vec<Chunk>, IngestError> {
        if text.trim().is_empty() {
            return Err(IngestError::NoChunks);
        }
        let chars: Vec<char> = text.chars().collect();
        let max = self.config.max_chars.max(1);
        let overlap = self.config.overlap_chars.min(max.saturating_sub(1));
        let step = max - overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut ordinal = 0usize;
        while start < chars.len() {
            let end = (start + max).min(chars.len());
            chunks.push(Chunk {
                chunk_id: stable_chunk_id(ordinal, start, end, CHUNK_VERSION),
                ordinal,
                text: chars[start..end].iter().collect(),
            });
            if end == chars.len() {
                break;
            }
            start += step;
            ordinal += 1;
        }
        Ok(chunks)
    }
}

fn stable_chunk_id(ordinal: usize, char_start: usize, char_end: usize, version: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(version.to_be_bytes());
    hasher.update(ordinal.to_be_bytes());
    hasher.update(char_start.to_be_bytes());
    hasher.update(char_end.to_be_bytes());
    hex::encode(hasher.finalize())
}
