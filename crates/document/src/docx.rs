//! DOCX text reader.
//!
//! A .docx file is a ZIP archive; the body text lives in `word/document.xml`.

use quick_xml::events::Event;
use quick_xml::Reader;
use slidecraft_core::{Error, Result};
use std::io::{Read, Seek};
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";

/// Reader that flattens a DOCX body into newline-separated paragraphs.
#[derive(Debug, Default)]
pub struct DocxReader;

impl DocxReader {
    /// Create a new DOCX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read all paragraph text, one line per paragraph.
    pub fn read_text<R: Read + Seek>(&self, reader: R) -> Result<String> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut file = archive.by_name(DOCUMENT_PART).map_err(|e| {
            Error::ZipError(format!("File not found in archive '{}': {}", DOCUMENT_PART, e))
        })?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", DOCUMENT_PART, e)))?;

        paragraphs_to_text(&content)
    }
}

/// Walk WordprocessingML and collect run text per paragraph.
fn paragraphs_to_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_text = false;
    // Tab and break elements only mean text inside a run; `w:tab` under
    // `w:pPr/w:tabs` is a tab-stop definition.
    let mut in_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = true,
                b"r" => in_run = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"tab" if in_run => text.push('\t'),
                b"br" | b"cr" if in_run => text.push('\n'),
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_text => {
                let chunk = e
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("Bad text in document: {}", e)))?;
                text.push_str(&chunk);
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_text = false,
                b"r" => in_run = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing document body: {}", e)));
            }
            _ => {}
        }
    }

    Ok(text)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
