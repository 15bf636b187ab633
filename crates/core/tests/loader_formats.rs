//! End-to-end loader checks over in-memory office fixtures built with the
//! same ZIP container the real files use.

use std::io::Write;

use finsight_core::{load, FileFormat, IngestError, MAX_XLSX_ROWS};

fn zip_with_entries(entries: &[(&str, String)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        for (name, xml) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body = paragraphs
        .iter()
        .map(|text| format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>"))
        .collect::<String>();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{body}</w:body></w:document>"
    );
    zip_with_entries(&[("word/document.xml", xml)])
}

fn xlsx_with_rows(rows: &[Vec<(&str, bool)>]) -> Vec<u8> {
    let mut shared: Vec<String> = Vec::new();
    let mut sheet_rows = String::new();
    for row in rows {
        sheet_rows.push_str("<row>");
        for (value, is_shared) in row {
            if *is_shared {
                shared.push(value.to_string());
                sheet_rows.push_str(&format!(
                    "<c t=\"s\"><v>{}</v></c>",
                    shared.len() - 1
                ));
            } else {
                sheet_rows.push_str(&format!("<c><v>{value}</v></c>"));
            }
        }
        sheet_rows.push_str("</row>");
    }
    let shared_xml = format!(
        "<?xml version=\"1.0\"?><sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">{}</sst>",
        shared
            .iter()
            .map(|text| format!("<si><t>{text}</t></si>"))
            .collect::<String>()
    );
    let sheet_xml = format!(
        "<?xml version=\"1.0\"?><worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\"><sheetData>{sheet_rows}</sheetData></worksheet>"
    );
    zip_with_entries(&[
        ("xl/sharedStrings.xml", shared_xml),
        ("xl/worksheets/sheet1.xml", sheet_xml),
    ])
}

/// Minimal single-page PDF carrying one text run, with the xref offsets
/// computed so the parser accepts it.
fn minimal_pdf_with_phrase(phrase: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 100 700 Td ({phrase}) Tj ET\n");
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::new();
    let objects = [
        "1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n".to_string(),
        "2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n".to_string(),
        "3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n".to_string(),
        format!(
            "4 0 obj << /Length {} >> stream\n{stream}endstream endobj\n",
            stream.len()
        ),
        "5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n".to_string(),
    ];
    for object in &objects {
        offsets.push(out.len());
        out.extend_from_slice(object.as_bytes());
    }
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{xref_start}\n").as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

#[test]
fn pdf_text_is_extracted() {
    let bytes = minimal_pdf_with_phrase("Revenue was 150 Cr");
    let text = load(&bytes, FileFormat::Pdf).unwrap();
    assert!(text.contains("Revenue"), "extracted text: {text:?}");
    assert!(text.contains("150"), "extracted text: {text:?}");
}

#[test]
fn docx_paragraphs_become_newline_separated_text() {
    let bytes = docx_with_paragraphs(&["Annual Report 2023", "Revenue rose to 150 Cr."]);
    let text = load(&bytes, FileFormat::Docx).unwrap();
    assert_eq!(text, "Annual Report 2023\nRevenue rose to 150 Cr.");
}

#[test]
fn xlsx_rows_become_space_joined_lines() {
    let bytes = xlsx_with_rows(&[
        vec![("Metric", true), ("Value", true)],
        vec![("Revenue", true), ("150", false)],
        vec![("Net Profit", true), ("20", false)],
    ]);
    let text = load(&bytes, FileFormat::Xlsx).unwrap();
    assert_eq!(text, "Metric Value\nRevenue 150\nNet Profit 20");
}

#[test]
fn xlsx_without_shared_strings_still_reads_numeric_cells() {
    let sheet_xml = "<?xml version=\"1.0\"?><worksheet><sheetData><row><c><v>42</v></c><c><v>7</v></c></row></sheetData></worksheet>".to_string();
    let bytes = zip_with_entries(&[("xl/worksheets/sheet1.xml", sheet_xml)]);
    let text = load(&bytes, FileFormat::Xlsx).unwrap();
    assert_eq!(text, "42 7");
}

#[test]
fn oversized_xlsx_is_rejected() {
    let rows: Vec<Vec<(&str, bool)>> = (0..=MAX_XLSX_ROWS).map(|_| vec![("1", false)]).collect();
    let bytes = xlsx_with_rows(&rows);
    match load(&bytes, FileFormat::Xlsx) {
        Err(IngestError::TooLarge { limit, .. }) => assert_eq!(limit, MAX_XLSX_ROWS),
        other => panic!("expected TooLarge, got {other:?}"),
    }
}

#[test]
fn docx_with_only_empty_paragraphs_is_empty_document() {
    let bytes = docx_with_paragraphs(&["", "", ""]);
    assert!(matches!(
        load(&bytes, FileFormat::Docx),
        Err(IngestError::EmptyDocument)
    ));
}
