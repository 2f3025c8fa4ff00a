//! Plain-text extraction from source documents.
//!
//! Supports PDF, DOCX and TXT. The format is picked from the file extension.

pub mod docx;

use slidecraft_core::{Error, Result};
use std::any::Any;
use std::fs;
use std::panic;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

pub use docx::DocxReader;

/// Source document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Docx,
    Txt,
}

impl SourceFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::Txt),
            _ => None,
        }
    }

    /// Detect format from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Extract the raw text of a source document.
///
/// Fails with [`Error::UnsupportedFormat`] for unknown extensions and
/// [`Error::ExtractionError`] when the document cannot be read.
pub fn extract_text(path: &Path) -> Result<String> {
    let format = SourceFormat::from_path(path).ok_or_else(|| {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{}", e.to_lowercase()))
            .unwrap_or_default();
        Error::UnsupportedFormat(format!("Unsupported file type: {}", ext))
    })?;

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    log::debug!("Extracting text from {} as {:?}", path.display(), format);

    let text = match format {
        SourceFormat::Pdf => extract_pdf(path).map_err(|e| {
            Error::ExtractionError(format!("Error processing file {}: {}", name, e))
        })?,
        SourceFormat::Docx => {
            let file = fs::File::open(path).map_err(|e| {
                Error::ExtractionError(format!("Error processing file {}: {}", name, e))
            })?;
            DocxReader::new().read_text(file).map_err(|e| {
                Error::ExtractionError(format!("Error processing file {}: {}", name, e))
            })?
        }
        SourceFormat::Txt => fs::read_to_string(path).map_err(|e| {
            Error::ExtractionError(format!("Error processing file {}: {}", name, e))
        })?,
    };

    Ok(text.nfc().collect())
}

/// pdf-extract panics on some malformed content streams and font
/// dictionaries; those panics are reported as ordinary failures.
fn extract_pdf(path: &Path) -> std::result::Result<String, String> {
    match panic::catch_unwind(|| pdf_extract::extract_text(path)) {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(payload) => Err(format!("PDF reader crashed: {}", panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Extract text, degrading any failure to empty text.
///
/// The failure is logged so the caller's job can continue without a source.
pub fn extract_text_or_empty(path: &Path) -> String {
    match extract_text(path) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("Continuing with empty source text: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_extension("PDF"), Some(SourceFormat::Pdf));
        assert_eq!(SourceFormat::from_extension("docx"), Some(SourceFormat::Docx));
        assert_eq!(SourceFormat::from_extension("txt"), Some(SourceFormat::Txt));
        assert_eq!(SourceFormat::from_extension("doc"), None);
    }

    #[test]
    fn test_extract_txt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "The quick brown fox\njumps.").unwrap();

        let text = extract_text(&path).unwrap();
        assert!(text.to_lowercase().contains("quick brown fox"));
    }

    #[test]
    fn test_txt_is_nfc_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accent.txt");
        fs::write(&path, "Cafe\u{301}").unwrap();

        assert_eq!(extract_text(&path).unwrap(), "Caf\u{e9}");
    }

    #[test]
    fn test_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.key");
        fs::write(&path, "x").unwrap();

        match extract_text(&path) {
            Err(Error::UnsupportedFormat(msg)) => assert!(msg.contains(".key")),
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }

    /// A PDF with a valid cross-reference table whose only font has no
    /// `/Subtype`.
    fn pdf_with_untyped_font() -> Vec<u8> {
        let content = "BT /F1 12 Tf 72 712 Td (Hello) Tj ET";
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
                .to_string(),
            "<< /Type /Font /BaseFont /Helvetica >>".to_string(),
            format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
        ];

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }
        let xref = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }
        pdf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
                objects.len() + 1,
                xref
            )
            .as_bytes(),
        );
        pdf
    }

    #[test]
    fn test_malformed_pdf_font_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("untyped-font.pdf");
        fs::write(&path, pdf_with_untyped_font()).unwrap();

        assert!(matches!(extract_text(&path), Err(Error::ExtractionError(_))));
        assert_eq!(extract_text_or_empty(&path), "");
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("bad font");
        assert_eq!(panic_message(&*boxed), "bad font");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*boxed), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(&*boxed), "unknown panic");
    }

    #[test]
    fn test_missing_file_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.txt");

        assert!(matches!(extract_text(&path), Err(Error::ExtractionError(_))));
        assert_eq!(extract_text_or_empty(&path), "");
    }
}
