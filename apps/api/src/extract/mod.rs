//! Plain-text extraction from uploaded resumes.
//!
//! Dispatch is on the declared content type only. Extraction never fails from the
//! caller's point of view: any error is logged and reported as an empty string,
//! which the upload handler treats as "could not read this file".

mod docx;
mod pdf;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("DOCX pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Substring match, so both `application/pdf` and vendor variants are accepted.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("pdf") {
            Some(DocumentKind::Pdf)
        } else if content_type.contains("word") || content_type.contains("docx") {
            Some(DocumentKind::Docx)
        } else {
            None
        }
    }
}

/// Extracts text on a blocking thread. Returns "" for unknown types and on any failure.
pub async fn extract_text(path: &Path, content_type: &str) -> String {
    let Some(kind) = DocumentKind::from_content_type(content_type) else {
        warn!("Unsupported content type for extraction: '{content_type}'");
        return String::new();
    };

    let owned: PathBuf = path.to_path_buf();
    match tokio::task::spawn_blocking(move || extract_kind(&owned, kind)).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            warn!("Text extraction failed for {}: {e}", path.display());
            String::new()
        }
        // pdf-extract panics on some malformed files; the join error carries it.
        Err(e) => {
            warn!("Text extraction task aborted for {}: {e}", path.display());
            String::new()
        }
    }
}

fn extract_kind(path: &Path, kind: DocumentKind) -> Result<String, ExtractError> {
    match kind {
        DocumentKind::Pdf => pdf::extract(path),
        DocumentKind::Docx => docx::extract(path),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const DOCX_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

    fn write_docx(path: &Path, document_xml: &str) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_content_type_dispatch() {
        assert_eq!(DocumentKind::from_content_type("application/pdf"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_content_type(DOCX_TYPE), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_content_type("application/msword"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_content_type("text/plain"), None);
    }

    #[tokio::test]
    async fn test_docx_paragraphs_are_joined_by_newlines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.docx");
        write_docx(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:t>Ada Lovelace</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">Analyst &amp; </w:t></w:r><w:r><w:tab/><w:t>Engineer</w:t></w:r></w:p>
</w:body></w:document>"#,
        );

        let text = extract_text(&path, DOCX_TYPE).await;
        assert_eq!(text, "Ada Lovelace\nAnalyst & Engineer");
    }

    #[tokio::test]
    async fn test_unsupported_type_yields_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "plain text resume").unwrap();

        assert_eq!(extract_text(&path, "text/plain").await, "");
    }

    #[tokio::test]
    async fn test_corrupt_files_yield_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.bin");
        std::fs::write(&path, b"definitely not a document").unwrap();

        assert_eq!(extract_text(&path, DOCX_TYPE).await, "");
        assert_eq!(extract_text(&path, "application/pdf").await, "");
    }

    #[tokio::test]
    async fn test_missing_file_yields_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.pdf");
        assert_eq!(extract_text(&path, "application/pdf").await, "");
    }
}
