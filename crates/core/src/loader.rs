use std::io::{Cursor, Read};

use quick_xml::events::Event;

use crate::clean::clean_text;
use crate::error::{IngestError, Result};
use crate::format::FileFormat;

/// Row guard for spreadsheet ingestion, counted across all worksheets.
pub const MAX_XLSX_ROWS: usize = 1000;

/// Cap on a single decompressed ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Converts an uploaded document into normalized plain text. Parser failures
/// never escape as panics; they surface as `IngestError::Read` carrying the
/// underlying message. An empty result after cleaning is `EmptyDocument`.
pub fn load(bytes: &[u8], format: FileFormat) -> Result<String> {
    if bytes.is_empty() {
        return Err(IngestError::EmptyDocument);
    }
    let raw = match format {
        FileFormat::Pdf => read_pdf(bytes)?,
        FileFormat::Docx => read_docx(bytes)?,
        FileFormat::Xlsx => read_xlsx(bytes)?,
        FileFormat::Txt => read_txt(bytes)?,
    };
    let text = clean_text(&raw);
    if text.is_empty() {
        return Err(IngestError::EmptyDocument);
    }
    Ok(text)
}

/// Page-by-page extraction; pages with no text are skipped.
fn read_pdf(bytes: &[u8]) -> Result<String> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|err| IngestError::Read(err.to_string()))?;
    Ok(pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn read_txt(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|err| IngestError::Read(err.to_string()))
}

fn open_archive(bytes: &[u8]) -> Result<zip::ZipArchive<Cursor<&[u8]>>> {
    zip::ZipArchive::new(Cursor::new(bytes)).map_err(|err| IngestError::Read(err.to_string()))
}

fn read_zip_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>> {
    let entry = archive
        .by_name(name)
        .map_err(|err| IngestError::Read(err.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|err| IngestError::Read(err.to_string()))?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(IngestError::Read(format!(
            "ZIP entry {name} exceeds size limit"
        )));
    }
    Ok(out)
}

/// Paragraph text from `word/document.xml`: `w:t` runs concatenated, each
/// closed `w:p` becoming a newline.
fn read_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = open_archive(bytes)?;
    let xml = read_zip_entry(&mut archive, "word/document.xml")?;
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut out = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(Event::Text(te)) = reader.read_event_into(&mut buf) {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"p" {
                    out.push('\n');
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(IngestError::Read(err.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// Worksheet rows become lines; cells within a row are stringified and
/// space-joined. More than `MAX_XLSX_ROWS` rows across all sheets rejects
/// the whole document.
fn read_xlsx(bytes: &[u8]) -> Result<String> {
    let mut archive = open_archive(bytes)?;
    let shared = read_shared_strings(&mut archive)?;
    let mut sheet_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("xl/worksheets/sheet") && name.ends_with(".xml"))
        .map(|name| name.to_string())
        .collect();
    sheet_names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    let mut lines = Vec::new();
    let mut row_count = 0usize;
    for name in sheet_names {
        let xml = read_zip_entry(&mut archive, &name)?;
        read_sheet_rows(&xml, &shared, &mut lines, &mut row_count)?;
    }
    Ok(lines.join("\n"))
}

/// Shared strings indexed by `si` position; rich-text runs within one `si`
/// are concatenated so indices stay aligned.
fn read_shared_strings(archive: &mut zip::ZipArchive<Cursor<&[u8]>>) -> Result<Vec<String>> {
    if archive.by_name("xl/sharedStrings.xml").is_err() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry(archive, "xl/sharedStrings.xml")?;
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = true;
                    current.clear();
                } else if in_si && e.local_name().as_ref() == b"t" {
                    if let Ok(Event::Text(te)) = reader.read_event_into(&mut buf) {
                        current.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"si" {
                    in_si = false;
                    strings.push(current.clone());
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(IngestError::Read(err.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn read_sheet_rows(
    xml: &[u8],
    shared: &[String],
    lines: &mut Vec<String>,
    row_count: &mut usize,
) -> Result<()> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut row_cells: Vec<String> = Vec::new();
    let mut cell_is_shared = false;
    let mut in_value = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    row_cells.clear();
                    *row_count += 1;
                    if *row_count > MAX_XLSX_ROWS {
                        return Err(IngestError::TooLarge {
                            rows: *row_count,
                            limit: MAX_XLSX_ROWS,
                        });
                    }
                }
                b"c" => {
                    cell_is_shared = e.attributes().any(|attr| {
                        attr.as_ref()
                            .map(|attr| attr.key.as_ref() == b"t" && attr.value.as_ref() == b"s")
                            .unwrap_or(false)
                    });
                }
                b"v" => in_value = true,
                _ => {}
            },
            Ok(Event::Text(te)) if in_value => {
                let value = te.unescape().unwrap_or_default();
                let value = value.trim();
                if !value.is_empty() {
                    if cell_is_shared {
                        if let Ok(idx) = value.parse::<usize>() {
                            if let Some(text) = shared.get(idx) {
                                row_cells.push(text.clone());
                            }
                        }
                    } else {
                        row_cells.push(value.to_string());
                    }
                }
                in_value = false;
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => in_value = false,
                b"c" => cell_is_shared = false,
                b"row" => {
                    if !row_cells.is_empty() {
                        lines.push(row_cells.join(" "));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(IngestError::Read(err.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(())
}
