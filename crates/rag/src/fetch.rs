use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use finsight_core::{FileFormat, IngestError};

/// Some hosts refuse requests without a browser-looking agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Downloads a document from a user-supplied URL. The format comes from the
/// response content type, falling back to the URL suffix; a non-success
/// status is a fetch failure, and an unrecognized format is rejected the
/// same way an unsupported upload would be.
pub fn fetch_document(url: &str) -> Result<(Vec<u8>, FileFormat), IngestError> {
    let client = Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .build()
        .map_err(|err| IngestError::Fetch(err.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|err| IngestError::Fetch(err.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(IngestError::Fetch(format!("{url} returned status {status}")));
    }
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());
    let format = resolve_format(url, content_type.as_deref())?;
    let bytes = response
        .bytes()
        .map_err(|err| IngestError::Fetch(err.to_string()))?;
    Ok((bytes.to_vec(), format))
}

fn resolve_format(url: &str, content_type: Option<&str>) -> Result<FileFormat, IngestError> {
    if let Some(format) = content_type.and_then(FileFormat::from_content_type) {
        return Ok(format);
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    FileFormat::from_name(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_wins_over_url_suffix() {
        let format = resolve_format("https://example.com/download", Some("application/pdf")).unwrap();
        assert_eq!(format, FileFormat::Pdf);
    }

    #[test]
    fn url_suffix_is_the_fallback() {
        let format =
            resolve_format("https://example.com/q4.xlsx?dl=1", Some("application/octet-stream"))
                .unwrap();
        assert_eq!(format, FileFormat::Xlsx);
    }

    #[test]
    fn unknown_format_both_ways_is_unsupported() {
        assert!(matches!(
            resolve_format("https://example.com/data", Some("application/zip")),
            Err(IngestError::UnsupportedFormat(_))
        ));
    }
}
