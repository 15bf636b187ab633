use thiserror::Error;

/// Terminal ingestion conditions. Each variant renders as the message shown
/// to the user when the pipeline stops at that point.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read document: {0}")]
    Read(String),
    #[error("document is empty or unreadable")]
    EmptyDocument,
    #[error("document too large: {rows} rows exceeds the limit of {limit}")]
    TooLarge { rows: usize, limit: usize },
    #[error("no chunks could be created from the document")]
    NoChunks,
    #[error("failed to fetch document: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, IngestError>;
