//! OCR collaborator and batched page repair.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::{RagConfig, Result, TRACING_TARGET_INGEST};

/// Type alias for a shared OCR provider.
pub type BoxedOcrProvider = Arc<dyn OcrProvider>;

/// Matches one `PAGE_N: text` line of a repair reply.
static PAGE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PAGE_(\d+):\s*(.*)$").expect("page line pattern is valid")
});

/// Text of a single page, identified by its 0-based index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub index: usize,
    pub text: String,
}

impl PageText {
    /// Creates a page.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Provider trait for re-reading documents whose text layer is unusable.
#[async_trait::async_trait]
pub trait OcrProvider: Send + Sync {
    /// Returns the provider name used in errors and logs.
    fn name(&self) -> &str;

    /// Reads the full text of the file at `path`.
    async fn ocr_document(&self, path: &Path) -> Result<String>;

    /// Repairs the text of the given pages.
    ///
    /// Pages missing from the result are left unrepaired.
    async fn repair_pages(&self, pages: &[PageText]) -> Result<Vec<PageText>>;
}

/// Instruction sent with a whole-document OCR request.
pub const DOCUMENT_OCR_PROMPT: &str = "Please extract the full text content from this document. \
If the content is in Arabic, preserve the exact Arabic text. \
Do not summarize; provide all text found on the pages.";

/// Builds the repair prompt for a batch of pages.
///
/// Pages are numbered 1-based as `PAGE_N:` and the reply is expected in the
/// same form.
pub fn repair_prompt(pages: &[PageText]) -> String {
    let body = pages
        .iter()
        .map(|page| format!("PAGE_{}: {}", page.index + 1, page.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "The following are extracted text fragments from a PDF. Some may be garbled Arabic.\n\
         Clean up and return correct Arabic for each page.\n\
         Format: PAGE_N: <clean text>\n\n{body}"
    )
}

/// Parses `PAGE_N: text` lines from a repair reply.
///
/// Lines in any other form are ignored. Page numbers are 1-based in the reply
/// and 0-based in the result.
pub fn parse_page_reply(reply: &str) -> Vec<PageText> {
    reply
        .lines()
        .filter_map(|line| {
            let captures = PAGE_LINE.captures(line)?;
            let number: usize = captures[1].parse().ok()?;
            let index = number.checked_sub(1)?;
            Some(PageText::new(index, captures[2].trim()))
        })
        .collect()
}

/// Sends garbled pages to an [`OcrProvider`] in fixed-size batches.
#[derive(Clone)]
pub struct OcrRepairer {
    provider: BoxedOcrProvider,
    batch_size: usize,
    batch_delay: Duration,
}

impl OcrRepairer {
    /// Creates a repairer with the batch settings from `config`.
    pub fn new(provider: BoxedOcrProvider, config: &RagConfig) -> Self {
        Self {
            provider,
            batch_size: config.ocr_batch_size.max(1),
            batch_delay: config.ocr_batch_delay,
        }
    }

    /// Returns the underlying provider.
    pub fn provider(&self) -> &BoxedOcrProvider {
        &self.provider
    }

    /// Repairs `pages`, returning replacement text keyed by page index.
    ///
    /// Only pages that were requested in a batch are accepted from that
    /// batch's reply. A failed batch is logged and skipped.
    #[tracing::instrument(skip_all, fields(pages = pages.len()))]
    pub async fn repair(&self, pages: &[PageText]) -> BTreeMap<usize, String> {
        let mut repaired = BTreeMap::new();

        for (batch_number, batch) in pages.chunks(self.batch_size).enumerate() {
            if batch_number > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            match self.provider.repair_pages(batch).await {
                Ok(replies) => {
                    for reply in replies {
                        if batch.iter().any(|page| page.index == reply.index) {
                            repaired.insert(reply.index, reply.text);
                        }
                    }
                }
                Err(error) => {
                    let first = batch.first().map(|page| page.index + 1);
                    let last = batch.last().map(|page| page.index + 1);
                    tracing::warn!(
                        target: TRACING_TARGET_INGEST,
                        provider = self.provider.name(),
                        first_page = first,
                        last_page = last,
                        retryable = error.is_retryable(),
                        error = %error,
                        "Page repair batch failed, skipping"
                    );
                }
            }
        }

        repaired
    }
}

impl std::fmt::Debug for OcrRepairer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OcrRepairer")
            .field("provider", &self.provider.name())
            .field("batch_size", &self.batch_size)
            .field("batch_delay", &self.batch_delay)
            .finish()
    }
}
