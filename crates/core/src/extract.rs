//! Text extraction for uploaded context documents.
//!
//! Supported formats are plain text (`.txt`, UTF-8) and PDF (`.pdf`). PDF
//! pages are extracted independently; a page whose text cannot be recovered
//! contributes nothing rather than failing the whole document.

use std::path::Path;

use crate::error::ExtractError;
use crate::text::truncate_chars;

/// Maximum characters kept by [`summarize_file_text`].
pub const FILE_SUMMARY_CHARS: usize = 1500;

/// An uploaded document: its original file name and raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Document kinds recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Pdf,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read an upload from disk, keeping only the file name component.
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self { name, bytes })
    }

    /// Classify the upload by its extension (case-insensitive).
    pub fn kind(&self) -> Option<DocumentKind> {
        let ext = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(DocumentKind::Text),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }
}

/// Extract the raw text of an uploaded document.
pub fn extract_text_from_file(file: &UploadedFile) -> Result<String, ExtractError> {
    match file.kind() {
        Some(DocumentKind::Text) => {
            String::from_utf8(file.bytes.clone()).map_err(|source| ExtractError::InvalidUtf8 {
                name: file.name.clone(),
                source,
            })
        }
        Some(DocumentKind::Pdf) => extract_pdf_text(&file.name, &file.bytes),
        None => Err(ExtractError::UnsupportedFormat {
            name: file.name.clone(),
        }),
    }
}

/// Concatenate the text of every page, in page order.
fn extract_pdf_text(name: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf {
        name: name.to_string(),
        message: e.to_string(),
    })?;

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => {
                tracing::warn!(file = name, page = page_number, error = %e, "skipping unreadable PDF page");
            }
        }
    }
    Ok(text)
}

/// Cheap "summary" of a document: its first 1500 characters.
pub fn summarize_file_text(text: &str) -> String {
    truncate_chars(text, FILE_SUMMARY_CHARS).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a PDF with one page per entry. `Some(line)` shows `line` in
    /// Helvetica; `None` points the page's contents at a missing object.
    fn pdf_with_pages(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in pages {
            let contents = match page {
                Some(line) => {
                    let content = Content {
                        operations: vec![
                            Operation::new("BT", vec![]),
                            Operation::new("Tf", vec!["F1".into(), 24.into()]),
                            Operation::new("Td", vec![100.into(), 600.into()]),
                            Operation::new("Tj", vec![Object::string_literal(*line)]),
                            Operation::new("ET", vec![]),
                        ],
                    };
                    let stream = Stream::new(dictionary! {}, content.encode().unwrap());
                    Object::Reference(doc.add_object(stream))
                }
                None => Object::Reference((999, 0)),
            };
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => contents,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn single_page_pdf(line: &str) -> Vec<u8> {
        pdf_with_pages(&[Some(line)])
    }

    #[test]
    fn txt_upload_decodes_utf8() {
        let file = UploadedFile::new("notes.txt", "hello world");
        let text = extract_text_from_file(&file).unwrap();
        assert_eq!(text, "hello world");
        assert_eq!(summarize_file_text(&text), "hello world");
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let file = UploadedFile::new("NOTES.TXT", "shout");
        assert_eq!(file.kind(), Some(DocumentKind::Text));
        assert_eq!(extract_text_from_file(&file).unwrap(), "shout");
    }

    #[test]
    fn txt_upload_rejects_invalid_utf8() {
        let file = UploadedFile::new("bad.txt", vec![0xff, 0xfe, 0x00]);
        let err = extract_text_from_file(&file).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidUtf8 { .. }));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        for name in ["report.docx", "archive.tar.gz", "no_extension"] {
            let file = UploadedFile::new(name, "content");
            let err = extract_text_from_file(&file).unwrap_err();
            assert!(
                matches!(err, ExtractError::UnsupportedFormat { .. }),
                "{name} should be unsupported"
            );
        }
    }

    #[test]
    fn pdf_upload_extracts_page_text() {
        let file = UploadedFile::new("paper.pdf", single_page_pdf("Hello PDF"));
        let text = extract_text_from_file(&file).unwrap();
        assert!(text.contains("Hello PDF"), "got: {text:?}");
    }

    #[test]
    fn unreadable_pdf_page_is_skipped() {
        let file = UploadedFile::new("mixed.pdf", pdf_with_pages(&[None, Some("Good page")]));
        let text = extract_text_from_file(&file).unwrap();
        assert!(text.contains("Good page"), "got: {text:?}");
    }

    #[test]
    fn garbage_pdf_is_an_error() {
        let file = UploadedFile::new("broken.pdf", b"not a pdf at all".to_vec());
        let err = extract_text_from_file(&file).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf { .. }));
    }

    #[test]
    fn summary_keeps_first_1500_chars() {
        let long = "x".repeat(4000);
        assert_eq!(summarize_file_text(&long).chars().count(), FILE_SUMMARY_CHARS);
        assert_eq!(summarize_file_text("short"), "short");
    }

    #[test]
    fn from_path_reads_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.txt");
        std::fs::write(&path, "on disk").unwrap();

        let file = UploadedFile::from_path(&path).unwrap();
        assert_eq!(file.name, "context.txt");
        assert_eq!(extract_text_from_file(&file).unwrap(), "on disk");
    }

    #[test]
    fn from_path_missing_file() {
        let err = UploadedFile::from_path(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }
}
