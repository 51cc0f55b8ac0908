//! Mock collaborators for testing.
//!
//! These mocks record the calls they receive and return canned results, so
//! ingestion and question answering can be exercised without a PDF parser or
//! network access.
//!
//! # Feature Flag
//!
//! This module is only available in tests or when the `test-utils` feature is
//! enabled:
//!
//! ```toml
//! [dev-dependencies]
//! lectern-rag = { version = "...", features = ["test-utils"] }
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::provider::{
    ChatProvider, ChatRequest, ExtractedText, OcrProvider, PageText, TextExtractor,
};
use crate::{Error, Result};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock chat model that returns a fixed answer and records every request.
#[derive(Debug, Default)]
pub struct MockChatProvider {
    answer: String,
    failure: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatProvider {
    /// Creates a provider that always answers with `answer`.
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            ..Self::default()
        }
    }

    /// Creates a provider whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns all requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    /// Returns the most recent request.
    pub fn last_request(&self) -> Option<ChatRequest> {
        lock(&self.requests).last().cloned()
    }
}

#[async_trait::async_trait]
impl ChatProvider for MockChatProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        lock(&self.requests).push(request.clone());

        match &self.failure {
            Some(message) => Err(Error::provider("mock", message)),
            None => Ok(self.answer.clone()),
        }
    }
}

/// Mock extractor that returns fixed pages for any path.
#[derive(Debug, Default)]
pub struct MockExtractor {
    pages: Vec<String>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockExtractor {
    /// Creates an extractor that returns `pages`.
    pub fn from_pages<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Creates an extractor whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns the number of extraction calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl TextExtractor for MockExtractor {
    async fn extract(&self, _path: &Path) -> Result<ExtractedText> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.failure {
            Some(message) => Err(Error::extraction(message)),
            None => Ok(ExtractedText::from_pages(self.pages.clone())),
        }
    }
}

/// Mock OCR provider.
///
/// Page repair answers `repaired N` for every requested page (1-based N).
/// Whole-document OCR returns the configured text or fails when none is set.
#[derive(Debug, Default)]
pub struct MockOcr {
    document_text: Option<String>,
    extra_page: Option<usize>,
    failing_batch: Option<usize>,
    repair_calls: Mutex<Vec<Vec<usize>>>,
    document_calls: AtomicUsize,
}

impl MockOcr {
    /// Creates a mock without whole-document text.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text returned by whole-document OCR.
    pub fn with_document_text(mut self, text: impl Into<String>) -> Self {
        self.document_text = Some(text.into());
        self
    }

    /// Adds an unrequested page to every repair reply.
    pub fn with_extra_page(mut self, index: usize) -> Self {
        self.extra_page = Some(index);
        self
    }

    /// Makes the repair batch with the given 0-based ordinal fail.
    pub fn failing_batch(mut self, batch: usize) -> Self {
        self.failing_batch = Some(batch);
        self
    }

    /// Returns the page indexes of every repair call, in order.
    pub fn repair_calls(&self) -> Vec<Vec<usize>> {
        lock(&self.repair_calls).clone()
    }

    /// Returns the number of whole-document OCR calls.
    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl OcrProvider for MockOcr {
    fn name(&self) -> &str {
        "mock"
    }

    async fn ocr_document(&self, _path: &Path) -> Result<String> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);

        self.document_text
            .clone()
            .ok_or_else(|| Error::ocr("mock has no document text"))
    }

    async fn repair_pages(&self, pages: &[PageText]) -> Result<Vec<PageText>> {
        let batch = {
            let mut calls = lock(&self.repair_calls);
            calls.push(pages.iter().map(|page| page.index).collect());
            calls.len() - 1
        };

        if self.failing_batch == Some(batch) {
            return Err(Error::ocr(format!("mock batch {batch} failed")));
        }

        let mut replies: Vec<PageText> = pages
            .iter()
            .map(|page| PageText::new(page.index, format!("repaired {}", page.index + 1)))
            .collect();

        if let Some(index) = self.extra_page {
            replies.push(PageText::new(index, "unrequested"));
        }

        Ok(replies)
    }
}
