mod chunk;
mod clean;
mod embedding;
mod error;
mod format;
mod loader;

pub use chunk::{Chunk, ChunkConfig, Chunker};
pub use clean::clean_text;
pub use embedding::{HashEmbedder, HashEmbedderConfig};
pub use error::{IngestError, Result};
pub use format::FileFormat;
pub use loader::{load, MAX_XLSX_ROWS};
