//! Document Text Extractor — flattens an uploaded PDF or DOCX into plain text.
//!
//! PDF: pages are decoded by `pdf-extract` from a scoped temporary file.
//! Every non-blank line of a page is treated as one text run; runs are
//! percent-decoded where possible and joined with a space, pages with `\n`.
//!
//! DOCX: `word/document.xml` is read straight out of the ZIP container and
//! its `<w:t>` nodes are collected in document order, one paragraph per
//! `<w:p>`, paragraphs separated by a blank line.

use std::borrow::Cow;
use std::fmt;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use crate::analysis::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Derives the format from an uploaded file's extension.
    pub fn from_file_name(file_name: &str) -> Result<Self, PipelineError> {
        match file_name.rsplit_once('.') {
            Some((_, ext)) => ext.parse(),
            None => Err(PipelineError::UnsupportedFormat {
                format: file_name.to_string(),
            }),
        }
    }
}

impl FromStr for DocumentFormat {
    type Err = PipelineError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let tag = tag.trim().trim_start_matches('.');
        if tag.eq_ignore_ascii_case("pdf") {
            Ok(DocumentFormat::Pdf)
        } else if tag.eq_ignore_ascii_case("docx") {
            Ok(DocumentFormat::Docx)
        } else {
            Err(PipelineError::UnsupportedFormat {
                format: tag.to_string(),
            })
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Pdf => f.write_str("pdf"),
            DocumentFormat::Docx => f.write_str("docx"),
        }
    }
}

/// An uploaded document awaiting extraction.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Bytes,
    pub format: DocumentFormat,
}

impl RawDocument {
    pub fn new(bytes: impl Into<Bytes>, format: DocumentFormat) -> Self {
        Self {
            bytes: bytes.into(),
            format,
        }
    }

    pub fn from_upload(file_name: &str, bytes: impl Into<Bytes>) -> Result<Self, PipelineError> {
        Ok(Self::new(bytes, DocumentFormat::from_file_name(file_name)?))
    }
}

/// Extracts plain text on the blocking pool.
pub async fn extract(document: RawDocument) -> Result<String, PipelineError> {
    let format = document.format;
    let size = document.bytes.len();

    let text = tokio::task::spawn_blocking(move || extract_blocking(&document))
        .await
        .map_err(|e| PipelineError::extraction(format!("{format} extraction task failed: {e}")))??;

    debug!(
        "Extracted {} chars from {size}-byte {format} document",
        text.chars().count()
    );
    Ok(text)
}

pub fn extract_blocking(document: &RawDocument) -> Result<String, PipelineError> {
    match document.format {
        DocumentFormat::Pdf => extract_pdf(&document.bytes, &std::env::temp_dir()),
        DocumentFormat::Docx => extract_docx(&document.bytes),
    }
}

/// The temporary file is removed when `file` drops, on every exit path.
fn extract_pdf(bytes: &[u8], temp_dir: &Path) -> Result<String, PipelineError> {
    let mut file = tempfile::Builder::new()
        .prefix("resume-")
        .suffix(".pdf")
        .tempfile_in(temp_dir)
        .map_err(|e| PipelineError::extraction(format!("Failed to create temporary file: {e}")))?;

    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| PipelineError::extraction(format!("Failed to write temporary file: {e}")))?;

    let pages = pdf_extract::extract_text_by_pages(file.path())
        .map_err(|e| PipelineError::extraction(format!("Failed to parse PDF: {e}")))?;

    Ok(join_pages(&pages))
}

fn join_pages(pages: &[String]) -> String {
    let pages: Vec<String> = pages
        .iter()
        .map(|page| {
            page.lines()
                .map(str::trim)
                .filter(|run| !run.is_empty())
                .map(decode_run)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();

    if pages.iter().all(|p| p.is_empty()) {
        return String::new();
    }
    pages.join("\n")
}

/// Percent-decodes a text run, keeping it verbatim if any escape is malformed
/// or the decoded bytes are not UTF-8.
fn decode_run(run: &str) -> Cow<'_, str> {
    if has_malformed_escape(run) {
        return Cow::Borrowed(run);
    }
    urlencoding::decode(run).unwrap_or(Cow::Borrowed(run))
}

fn has_malformed_escape(run: &str) -> bool {
    let bytes = run.as_bytes();
    bytes
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'%')
        .any(|(i, _)| {
            !matches!(
                bytes.get(i + 1..i + 3),
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit()
            )
        })
}

fn extract_docx(bytes: &[u8]) -> Result<String, PipelineError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| PipelineError::extraction(format!("Failed to open DOCX archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| PipelineError::extraction(format!("DOCX has no word/document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| PipelineError::extraction(format!("Failed to read document.xml: {e}")))?;

    document_xml_to_text(&xml)
}

fn document_xml_to_text(xml: &str) -> Result<String, PipelineError> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"r" => in_run = true,
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"r" => in_run = false,
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" if in_run => current.push('\t'),
                b"br" | b"cr" if in_run => current.push('\n'),
                b"p" => paragraphs.push(String::new()),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().map_err(|err| {
                    PipelineError::extraction(format!("Malformed text node in document.xml: {err}"))
                })?;
                current.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PipelineError::extraction(format!(
                    "Malformed document.xml at position {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    if !current.is_empty() {
        paragraphs.push(current);
    }
    Ok(paragraphs.join("\n\n"))
}
