//! Text extraction collaborators.

use std::path::Path;
use std::sync::Arc;

use crate::{Error, Result};

/// Type alias for a shared text extractor.
pub type BoxedTextExtractor = Arc<dyn TextExtractor>;

/// Form feed, used by text dumps of paginated documents as a page break.
const PAGE_BREAK: char = '\x0c';

/// Text extracted from a source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    /// Full text, pages concatenated in order.
    pub text: String,
    /// Per-page text, when the source is paginated.
    pub pages: Vec<String>,
    /// Number of pages reported by the source.
    pub page_count: usize,
}

impl ExtractedText {
    /// Builds extracted text from per-page text.
    pub fn from_pages(pages: Vec<String>) -> Self {
        Self {
            text: pages.join("\n"),
            page_count: pages.len(),
            pages,
        }
    }

    /// Returns true if no non-whitespace text was extracted.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Provider trait for turning a stored file into plain text.
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extracts the text of the file at `path`.
    async fn extract(&self, path: &Path) -> Result<ExtractedText>;
}

/// Reads UTF-8 text files, treating form feeds as page breaks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

#[async_trait::async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<ExtractedText> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::extraction(format!("failed to read {}: {e}", path.display())))?;

        let pages = text.split(PAGE_BREAK).map(str::to_owned).collect();
        Ok(ExtractedText::from_pages(pages))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn plain_text_splits_pages_on_form_feed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "first page\x0csecond page").unwrap();

        let extracted = PlainTextExtractor.extract(file.path()).await.unwrap();

        assert_eq!(extracted.page_count, 2);
        assert_eq!(extracted.pages, vec!["first page", "second page"]);
        assert_eq!(extracted.text, "first page\nsecond page");
    }

    #[tokio::test]
    async fn missing_file_is_an_extraction_error() {
        let error = PlainTextExtractor
            .extract(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();

        assert!(matches!(error, Error::Extraction(_)));
    }
}
