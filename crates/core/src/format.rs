use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    Docx,
    Xlsx,
    Txt,
}

impl FileFormat {
    /// Resolves the declared format from a file name. Unknown extensions are
    /// a terminal ingestion failure, not a fallback to plain text.
    pub fn from_name(name: &str) -> Result<Self, IngestError> {
        let ext = name
            .rsplit('.')
            .next()
            .filter(|ext| !ext.eq_ignore_ascii_case(name))
            .map(|ext| ext.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(FileFormat::Pdf),
            "docx" => Ok(FileFormat::Docx),
            "xlsx" => Ok(FileFormat::Xlsx),
            "txt" => Ok(FileFormat::Txt),
            _ => Err(IngestError::UnsupportedFormat(name.to_string())),
        }
    }

    /// Maps an HTTP content type onto a format, for documents fetched from a
    /// URL where no file name is available.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let lower = content_type.to_lowercase();
        if lower.contains("application/pdf") {
            Some(FileFormat::Pdf)
        } else if lower.contains("wordprocessingml") {
            Some(FileFormat::Docx)
        } else if lower.contains("spreadsheetml") {
            Some(FileFormat::Xlsx)
        } else if lower.starts_with("text/") {
            Some(FileFormat::Txt)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Docx => "docx",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Txt => "txt",
        }
    }
}
