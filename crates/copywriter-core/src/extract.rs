//! Plain-text extraction for uploaded writing samples.
//!
//! Extraction never fails hard: anything that cannot be read comes back as
//! [`ExtractionResult::Unsupported`] or [`ExtractionResult::Unreadable`] and the
//! caller carries on without that sample.

use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

/// Advertised upload limits. Exceeding them is logged, not rejected.
pub const MAX_EXAMPLE_FILES: usize = 15;
pub const MAX_EXAMPLE_BYTES: u64 = 5 * 1024 * 1024;

pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "docx", "pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Docx,
    Pdf,
}

impl DocumentKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "txt" => Some(DocumentKind::Text),
            "docx" => Some(DocumentKind::Docx),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    Extracted(String),
    Unsupported { extension: String },
    Unreadable(String),
}

/// Why a sample produced no text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("file has no extension (supported: {})", SUPPORTED_EXTENSIONS.join(", "))]
    NoExtension,

    #[error(
        ".{extension} files are not supported (supported: {})",
        SUPPORTED_EXTENSIONS.join(", ")
    )]
    Unsupported { extension: String },

    #[error("{0}")]
    Unreadable(String),
}

impl ExtractionResult {
    pub fn into_text(self) -> Option<String> {
        self.into_result().ok()
    }

    pub fn into_result(self) -> Result<String, ExtractionError> {
        match self {
            ExtractionResult::Extracted(text) => Ok(text),
            ExtractionResult::Unsupported { extension } if extension.is_empty() => {
                Err(ExtractionError::NoExtension)
            }
            ExtractionResult::Unsupported { extension } => {
                Err(ExtractionError::Unsupported { extension })
            }
            ExtractionResult::Unreadable(reason) => Err(ExtractionError::Unreadable(reason)),
        }
    }
}

/// A writing sample held for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleDocument {
    pub filename: String,
    pub text: String,
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Extract text from an uploaded file, choosing the parser by extension.
pub fn extract(filename: &str, bytes: &[u8]) -> ExtractionResult {
    let extension = extension_of(filename);
    let Some(kind) = DocumentKind::from_extension(&extension) else {
        tracing::debug!(filename, "Skipping unsupported example file");
        return ExtractionResult::Unsupported { extension };
    };

    let extracted = match kind {
        DocumentKind::Text => String::from_utf8(bytes.to_vec())
            .map_err(|e| format!("not valid UTF-8 text: {}", e)),
        DocumentKind::Docx => extract_docx(bytes),
        DocumentKind::Pdf => extract_pdf(bytes),
    };

    match extracted {
        Ok(text) => ExtractionResult::Extracted(text),
        Err(reason) => {
            tracing::warn!(filename, %reason, "Could not extract example text");
            ExtractionResult::Unreadable(reason)
        }
    }
}

/// Read a file from disk and extract it.
pub fn read_example(path: &Path) -> ExtractionResult {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    match std::fs::read(path) {
        Ok(bytes) => {
            if bytes.len() as u64 > MAX_EXAMPLE_BYTES {
                tracing::warn!(
                    filename = %filename,
                    bytes = bytes.len(),
                    limit = MAX_EXAMPLE_BYTES,
                    "Example file is larger than the advertised limit"
                );
            }
            extract(&filename, &bytes)
        }
        Err(e) => ExtractionResult::Unreadable(format!("could not read {:?}: {}", path, e)),
    }
}

fn extract_docx(bytes: &[u8]) -> Result<String, String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a .docx archive: {}", e))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("missing document body: {}", e))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("could not read document body: {}", e))?;

    let paragraphs =
        docx_paragraphs(&xml).map_err(|e| format!("malformed document body: {}", e))?;
    Ok(paragraphs.join("\n"))
}

/// Body paragraphs of a WordprocessingML document, in order.
///
/// Tables and text boxes are skipped; paragraphs nested inside them never
/// touch the enclosing body paragraph.
fn docx_paragraphs(xml: &str) -> Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut skip_depth = 0usize;
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" | b"w:txbxContent" => skip_depth += 1,
                _ if skip_depth > 0 => {}
                b"w:p" => current = Some(String::new()),
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) if skip_depth == 0 => {
                let separator = match e.name().as_ref() {
                    b"w:p" => {
                        paragraphs.push(String::new());
                        None
                    }
                    b"w:tab" if in_run => Some('\t'),
                    b"w:br" | b"w:cr" if in_run => Some('\n'),
                    _ => None,
                };
                if let (Some(c), Some(paragraph)) = (separator, current.as_mut()) {
                    paragraph.push(c);
                }
            }
            Event::Text(e) if in_text && skip_depth == 0 => {
                if let Some(paragraph) = current.as_mut() {
                    paragraph.push_str(&e.unescape()?);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" | b"w:txbxContent" => skip_depth = skip_depth.saturating_sub(1),
                _ if skip_depth > 0 => {}
                b"w:p" => {
                    if let Some(paragraph) = current.take() {
                        paragraphs.push(paragraph);
                    }
                }
                b"w:r" => in_run = false,
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, String> {
    let document =
        lopdf::Document::load_mem(bytes).map_err(|e| format!("not a readable PDF: {}", e))?;

    let pages: Vec<String> = document
        .get_pages()
        .keys()
        .map(|&page| match document.extract_text(&[page]) {
            Ok(text) => text.trim_end().to_string(),
            Err(e) => {
                // Image-only or oddly encoded pages contribute nothing.
                tracing::debug!(page, error = %e, "No text extracted from PDF page");
                String::new()
            }
        })
        .collect();

    Ok(pages.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_txt_round_trips_exact_content() {
        let content = "Line one\r\nCafé ☕ line two\n\n  indented\n";
        let result = extract("notes.txt", content.as_bytes());
        assert_eq!(result, ExtractionResult::Extracted(content.to_string()));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let result = extract("NOTES.TXT", b"hello");
        assert_eq!(result.into_text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_invalid_utf8_txt_is_unreadable() {
        let result = extract("bad.txt", &[0xff, 0xfe, 0x00]);
        assert!(matches!(result, ExtractionResult::Unreadable(_)));
        assert_eq!(result.into_text(), None);
    }

    #[test]
    fn test_unsupported_extension_yields_no_content() {
        let result = extract("letter.rtf", b"{\\rtf1 hi}");
        assert_eq!(
            result,
            ExtractionResult::Unsupported {
                extension: "rtf".to_string()
            }
        );
        assert_eq!(
            result.clone().into_result(),
            Err(ExtractionError::Unsupported {
                extension: "rtf".to_string()
            })
        );
        assert!(result.into_result().unwrap_err().to_string().contains(".rtf"));

        let result = extract("README", b"text");
        assert_eq!(
            result,
            ExtractionResult::Unsupported {
                extension: String::new()
            }
        );
        assert_eq!(result.into_result(), Err(ExtractionError::NoExtension));
    }

    #[test]
    fn test_docx_paragraphs_in_order() {
        let bytes = docx_with_body(concat!(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>"#,
            r#"<w:r><w:t>Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Fish &amp; chips</w:t><w:tab/><w:t>done</w:t></w:r></w:p>"#,
            r#"<w:p/>"#,
            r#"<w:p><w:r><w:t>line</w:t><w:br/><w:t>break</w:t></w:r></w:p>"#,
        ));

        let text = extract("sample.docx", &bytes).into_text().unwrap();
        assert_eq!(text, "Hello world\nFish & chips\tdone\n\nline\nbreak");
    }

    #[test]
    fn test_docx_skips_tables() {
        let bytes = docx_with_body(concat!(
            r#"<w:p><w:r><w:t>Before</w:t></w:r></w:p>"#,
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
            r#"<w:p><w:r><w:t>After</w:t></w:r></w:p>"#,
        ));

        let text = extract("table.docx", &bytes).into_text().unwrap();
        assert_eq!(text, "Before\nAfter");
    }

    #[test]
    fn test_docx_text_box_keeps_surrounding_paragraph() {
        let bytes = docx_with_body(concat!(
            r#"<w:p><w:r><w:t xml:space="preserve">Before </w:t></w:r>"#,
            r#"<w:r><w:drawing><w:txbxContent>"#,
            r#"<w:p><w:r><w:t>Box</w:t></w:r></w:p>"#,
            r#"</w:txbxContent></w:drawing></w:r>"#,
            r#"<w:r><w:t>After</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Next</w:t></w:r></w:p>"#,
        ));

        let text = extract("boxed.docx", &bytes).into_text().unwrap();
        assert_eq!(text, "Before After\nNext");
    }

    #[test]
    fn test_docx_that_is_not_a_zip_is_unreadable() {
        let result = extract("fake.docx", b"plain text pretending");
        assert!(matches!(result, ExtractionResult::Unreadable(_)));
    }

    #[test]
    fn test_docx_without_body_is_unreadable() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("docProps/core.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<x/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let result = extract("empty.docx", &bytes);
        let error = result.into_result().unwrap_err();
        assert!(error.to_string().contains("missing document body"));
    }

    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let stream = Stream::new(dictionary! {}, content.encode().unwrap());
            let content_id = doc.add_object(stream);
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_pdf_pages_joined_in_order() {
        let bytes = pdf_with_pages(&["First page", "Second page"]);
        assert_eq!(
            extract("brochure.pdf", &bytes),
            ExtractionResult::Extracted("First page\nSecond page".to_string())
        );
    }

    #[test]
    fn test_garbage_pdf_fails_soft() {
        let result = extract("scan.pdf", b"this was never a pdf document");
        assert!(matches!(result, ExtractionResult::Unreadable(_)));
    }

    #[test]
    fn test_read_example_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("voice.txt");
        std::fs::write(&path, "My usual voice.").unwrap();

        assert_eq!(
            read_example(&path),
            ExtractionResult::Extracted("My usual voice.".to_string())
        );
    }

    #[test]
    fn test_read_missing_file_is_unreadable() {
        let dir = tempdir().unwrap();
        let result = read_example(&dir.path().join("missing.txt"));
        assert!(matches!(result, ExtractionResult::Unreadable(_)));
    }
}
