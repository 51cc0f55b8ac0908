//! PDF text extraction through `pdf-extract`.

use std::path::Path;

use super::extract::{ExtractedText, TextExtractor};
use crate::{Error, Result, TRACING_TARGET_INGEST};

/// Extracts the text layer of PDF files page by page.
///
/// Parsing is CPU-bound and runs on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Extracts per-page text from PDF bytes.
    pub fn extract_bytes(bytes: &[u8]) -> Result<ExtractedText> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| Error::extraction(format!("invalid pdf: {e}")))?;

        Ok(ExtractedText::from_pages(pages))
    }
}

#[async_trait::async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedText> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::extraction(format!("failed to read {}: {e}", path.display())))?;

        tracing::debug!(
            target: TRACING_TARGET_INGEST,
            path = %path.display(),
            bytes = bytes.len(),
            "Extracting pdf text"
        );

        tokio::task::spawn_blocking(move || Self::extract_bytes(&bytes))
            .await
            .map_err(|e| Error::extraction(format!("extraction task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_pdf_bytes_fail() {
        let error = PdfTextExtractor::extract_bytes(b"plain text, not a pdf").unwrap_err();
        assert!(matches!(error, Error::Extraction(_)));
    }

    #[tokio::test]
    async fn missing_file_fails() {
        let error = PdfTextExtractor
            .extract(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(error.to_string().starts_with("extraction failed"));
    }
}
