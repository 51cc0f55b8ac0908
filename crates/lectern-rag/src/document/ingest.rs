//! Document ingestion: extract, gate on quality, chunk, store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError};

use lectern_core::{QualityReport, TextChunker, Verdict, assemble_pages};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::model::{Document, DocumentStatus};
use super::store::{BoxedDocumentStore, DocumentStore, ProcessedContent};
use crate::provider::{
    BoxedOcrProvider, BoxedTextExtractor, ExtractedText, OcrProvider, OcrRepairer, PageText,
    TextExtractor,
};
use crate::{RagConfig, Result, TRACING_TARGET_INGEST};

/// Summary of one processing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub document_id: Uuid,
    /// Pages reported by the extractor.
    pub page_count: usize,
    /// Chunks stored for the document.
    pub chunk_count: usize,
    /// Pages flagged by the quality gate.
    pub garbled_pages: usize,
    /// Flagged pages whose text was replaced by OCR.
    pub repaired_pages: usize,
    /// True if the whole document was re-read with OCR.
    pub used_document_ocr: bool,
}

/// Per-document processing locks with the number of passes holding or
/// waiting on each.
type LockTable = Arc<std::sync::Mutex<HashMap<Uuid, LockEntry>>>;

#[derive(Default)]
struct LockEntry {
    lock: Arc<Mutex<()>>,
    users: usize,
}

/// A pass's claim on a document lock.
///
/// Dropping it releases the lock and removes the table entry once no other
/// pass uses it, including when the pass is cancelled while waiting.
struct DocumentLock {
    id: Uuid,
    table: LockTable,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        self.guard.take();

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = table.get_mut(&self.id) {
            entry.users = entry.users.saturating_sub(1);
            if entry.users == 0 {
                table.remove(&self.id);
            }
        }
    }
}

/// Text selected for chunking, with what the quality gate did to it.
struct GatedText {
    text: String,
    garbled_pages: usize,
    repaired_pages: usize,
    used_document_ocr: bool,
}

impl GatedText {
    fn unchanged(text: String) -> Self {
        Self {
            text,
            garbled_pages: 0,
            repaired_pages: 0,
            used_document_ocr: false,
        }
    }
}

/// Turns stored files into chunked, queryable documents.
///
/// At most one processing pass runs per document at a time; concurrent
/// passes for the same document wait for each other. The quality gate and
/// OCR only run when an OCR provider is attached.
#[derive(Clone)]
pub struct Ingestor {
    store: BoxedDocumentStore,
    extractor: BoxedTextExtractor,
    repairer: Option<OcrRepairer>,
    chunker: TextChunker,
    config: RagConfig,
    locks: LockTable,
}

impl Ingestor {
    /// Creates an ingestor without OCR.
    pub fn new(store: BoxedDocumentStore, extractor: BoxedTextExtractor, config: &RagConfig) -> Self {
        Self {
            store,
            extractor,
            repairer: None,
            chunker: TextChunker::new(config.chunker),
            config: config.clone(),
            locks: Arc::default(),
        }
    }

    /// Attaches an OCR provider, enabling the quality gate.
    pub fn with_ocr(mut self, provider: BoxedOcrProvider) -> Self {
        self.repairer = Some(OcrRepairer::new(provider, &self.config));
        self
    }

    /// Returns the document store.
    pub fn store(&self) -> &BoxedDocumentStore {
        &self.store
    }

    /// Registers the file at `path` as a new document and processes it.
    ///
    /// The document is stored before processing starts, so a failed pass
    /// leaves it behind with status `Failed`.
    pub async fn upload(&self, title: impl Into<String>, path: impl AsRef<Path>) -> Result<Document> {
        let path = path.as_ref();
        let mut document = Document::new(title, path);
        if let Ok(metadata) = tokio::fs::metadata(path).await {
            document = document.with_file_size(metadata.len());
        }

        let id = document.id;
        tracing::info!(
            target: TRACING_TARGET_INGEST,
            document_id = %id,
            title = %document.title,
            "Uploading document"
        );

        self.store.insert(document).await?;
        self.ingest(id, path).await?;
        self.store.get(id).await
    }

    /// Re-runs processing for an existing document from its stored file.
    pub async fn reprocess(&self, id: Uuid) -> Result<IngestReport> {
        let document = self.store.get(id).await?;
        self.ingest(id, &document.file_path).await
    }

    /// Processes the file at `path` into the document `id`.
    ///
    /// On success the document's text and chunks are replaced and it becomes
    /// `Ready`. On failure it is marked `Failed` and the error is returned.
    #[tracing::instrument(skip(self, path), fields(document_id = %id))]
    pub async fn ingest(&self, id: Uuid, path: &Path) -> Result<IngestReport> {
        let _lock = self.lock_document(id).await;

        let result = self.process(id, path).await;
        if let Err(error) = &result {
            tracing::error!(
                target: TRACING_TARGET_INGEST,
                document_id = %id,
                error = %error,
                "Document processing failed"
            );

            if let Err(status_error) = self.store.set_status(id, DocumentStatus::Failed).await {
                tracing::warn!(
                    target: TRACING_TARGET_INGEST,
                    document_id = %id,
                    error = %status_error,
                    "Could not mark document as failed"
                );
            }
        }

        result
    }

    async fn process(&self, id: Uuid, path: &Path) -> Result<IngestReport> {
        self.store.set_status(id, DocumentStatus::Processing).await?;

        let extracted = self.extractor.extract(path).await?;
        tracing::debug!(
            target: TRACING_TARGET_INGEST,
            document_id = %id,
            pages = extracted.page_count,
            chars = extracted.text.len(),
            "Extracted text"
        );
        if extracted.is_blank() {
            tracing::warn!(
                target: TRACING_TARGET_INGEST,
                document_id = %id,
                "No text extracted from document"
            );
        }

        let page_count = extracted.page_count;
        let gated = match &self.repairer {
            Some(repairer) => self.gate(repairer, path, extracted).await?,
            None => GatedText::unchanged(extracted.text),
        };

        let chunks = self.chunker.chunk(&gated.text);
        let report = IngestReport {
            document_id: id,
            page_count,
            chunk_count: chunks.len(),
            garbled_pages: gated.garbled_pages,
            repaired_pages: gated.repaired_pages,
            used_document_ocr: gated.used_document_ocr,
        };

        let content = ProcessedContent {
            extracted_text: gated.text,
            total_pages: u32::try_from(page_count).unwrap_or(u32::MAX),
            chunks,
        };
        self.store.replace_content(id, content).await?;

        tracing::info!(
            target: TRACING_TARGET_INGEST,
            document_id = %id,
            chunks = report.chunk_count,
            pages = report.page_count,
            "Document is ready"
        );

        Ok(report)
    }

    /// Runs the quality gate and the OCR it calls for.
    async fn gate(
        &self,
        repairer: &OcrRepairer,
        path: &Path,
        extracted: ExtractedText,
    ) -> Result<GatedText> {
        let report = QualityReport::assess_with(&self.config.quality, &extracted.pages);
        let garbled_pages = report.garbled.len();

        match report.verdict {
            Verdict::WholeDocumentOcr => {
                tracing::info!(
                    target: TRACING_TARGET_INGEST,
                    garbled = garbled_pages,
                    pages = report.page_count,
                    "Reading whole document with OCR"
                );

                let ocr_text = repairer.provider().ocr_document(path).await?;
                if ocr_text.trim().chars().count() > self.config.min_ocr_chars {
                    return Ok(GatedText {
                        text: ocr_text,
                        garbled_pages,
                        repaired_pages: 0,
                        used_document_ocr: true,
                    });
                }

                tracing::warn!(
                    target: TRACING_TARGET_INGEST,
                    chars = ocr_text.len(),
                    "OCR text too short, keeping extracted text"
                );
                Ok(GatedText {
                    garbled_pages,
                    ..GatedText::unchanged(extracted.text)
                })
            }
            Verdict::RepairPages(indexes) => {
                let mut pages = extracted.pages;
                let garbled: Vec<PageText> = indexes
                    .iter()
                    .filter_map(|&index| Some(PageText::new(index, pages.get(index)?.clone())))
                    .collect();

                let repaired = repairer.repair(&garbled).await;
                let repaired_pages = repaired.len();
                for (index, text) in repaired {
                    if let Some(page) = pages.get_mut(index) {
                        *page = text;
                    }
                }

                tracing::info!(
                    target: TRACING_TARGET_INGEST,
                    garbled = garbled_pages,
                    repaired = repaired_pages,
                    "Repaired garbled pages"
                );

                Ok(GatedText {
                    text: assemble_pages(&pages),
                    garbled_pages,
                    repaired_pages,
                    used_document_ocr: false,
                })
            }
            Verdict::Clean => Ok(GatedText::unchanged(assemble_pages(&extracted.pages))),
        }
    }

    async fn lock_document(&self, id: Uuid) -> DocumentLock {
        let mut claim = DocumentLock {
            id,
            table: self.locks.clone(),
            guard: None,
        };

        let lock = {
            let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            let entry = table.entry(id).or_default();
            entry.users += 1;
            entry.lock.clone()
        };

        claim.guard = Some(lock.lock_owned().await);
        claim
    }

    #[cfg(test)]
    fn held_locks(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("repairer", &self.repairer)
            .field("chunker", &self.chunker)
            .field("quality", &self.config.quality)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::document::InMemoryDocumentStore;
    use crate::mock::{MockExtractor, MockOcr};
    use crate::Error;

    const GARBLED: &str = "ÙØ§Ù„Ø¹Ø±Ø¨ÙŠØ© ÙƒØªØ§Ø¨ Ø§Ù„Ù…Ø¹Ù„Ù…";

    fn ingestor(extractor: MockExtractor) -> (Ingestor, InMemoryDocumentStore) {
        let store = InMemoryDocumentStore::new();
        let ingestor = Ingestor::new(
            Arc::new(store.clone()),
            Arc::new(extractor),
            &RagConfig::default(),
        );
        (ingestor, store)
    }

    fn path() -> PathBuf {
        PathBuf::from("/tmp/lectern-test.pdf")
    }

    #[tokio::test]
    async fn upload_chunks_and_marks_ready() {
        let (ingestor, store) = ingestor(MockExtractor::from_pages([
            "Photosynthesis converts light into chemical energy.",
            "Chlorophyll absorbs light.",
        ]));

        let document = ingestor.upload("Biology", path()).await.unwrap();

        assert_eq!(document.status, DocumentStatus::Ready);
        assert_eq!(document.total_pages, 2);
        assert_eq!(document.chunks.len(), 1);
        assert!(document.extracted_text.contains("Chlorophyll"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn empty_extraction_is_still_ready() {
        let (ingestor, _) = ingestor(MockExtractor::from_pages(["   "]));

        let document = ingestor.upload("Scan", path()).await.unwrap();

        assert_eq!(document.status, DocumentStatus::Ready);
        assert!(document.chunks.is_empty());
    }

    #[tokio::test]
    async fn extraction_failure_marks_failed() {
        let (ingestor, store) = ingestor(MockExtractor::failing("not a pdf"));

        let error = ingestor.upload("Broken", path()).await.unwrap_err();
        assert!(matches!(error, Error::Extraction(_)));

        let documents = store.list().await.unwrap();
        assert_eq!(documents[0].status, DocumentStatus::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn garbled_pages_are_repaired_and_pages_tagged() {
        let ocr = Arc::new(MockOcr::new());
        let (ingestor, _) = ingestor(MockExtractor::from_pages([
            "first readable page of text",
            GARBLED,
            "third readable page of text",
        ]));
        let ingestor = ingestor.with_ocr(ocr.clone());

        let document = ingestor.upload("Arabic", path()).await.unwrap();

        assert_eq!(ocr.repair_calls(), vec![vec![1]]);
        assert_eq!(
            document.extracted_text,
            "[Page 1]\nfirst readable page of text\n\n[Page 2]\nrepaired 2\n\n[Page 3]\nthird readable page of text"
        );
    }

    #[tokio::test]
    async fn mostly_garbled_documents_use_whole_document_ocr() {
        let text = "clean text recovered by optical character recognition of every page";
        let ocr = Arc::new(MockOcr::new().with_document_text(text));
        let (ingestor, store) = ingestor(MockExtractor::from_pages([GARBLED, GARBLED]));
        let ingestor = ingestor.with_ocr(ocr.clone());

        let document = Document::new("Scan", path());
        let id = document.id;
        store.insert(document).await.unwrap();
        let report = ingestor.ingest(id, &path()).await.unwrap();

        assert!(report.used_document_ocr);
        assert_eq!(report.garbled_pages, 2);
        assert_eq!(ocr.document_calls(), 1);
        assert_eq!(store.get(id).await.unwrap().extracted_text, text);
    }

    #[tokio::test]
    async fn short_ocr_text_is_discarded() {
        let ocr = Arc::new(MockOcr::new().with_document_text("too short"));
        let (ingestor, store) = ingestor(MockExtractor::from_pages([GARBLED]));
        let ingestor = ingestor.with_ocr(ocr);

        let document = ingestor.upload("Scan", path()).await.unwrap();

        assert_eq!(document.extracted_text, GARBLED);
        assert_eq!(store.get(document.id).await.unwrap().status, DocumentStatus::Ready);
    }

    #[tokio::test]
    async fn reprocess_replaces_chunks() {
        let (ingestor, store) = ingestor(MockExtractor::from_pages(["one two three"]));
        let document = ingestor.upload("Notes", path()).await.unwrap();
        let before = store.chunks(document.id).await.unwrap();

        let report = ingestor.reprocess(document.id).await.unwrap();

        assert_eq!(report.chunk_count, before.len());
        assert_eq!(store.chunks(document.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn concurrent_passes_are_serialized() {
        let extractor = Arc::new(MockExtractor::from_pages(["alpha beta gamma"]));
        let store = InMemoryDocumentStore::new();
        let ingestor = Ingestor::new(
            Arc::new(store.clone()),
            extractor.clone(),
            &RagConfig::default(),
        );
        let document = ingestor.upload("Notes", path()).await.unwrap();

        let (a, b) = tokio::join!(
            ingestor.reprocess(document.id),
            ingestor.reprocess(document.id)
        );

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(extractor.calls(), 3);
        assert_eq!(store.chunks(document.id).await.unwrap().len(), 1);
        assert_eq!(ingestor.held_locks(), 0);
    }

    #[tokio::test]
    async fn cancelled_passes_release_their_locks() {
        let (ingestor, _) = ingestor(MockExtractor::from_pages(["alpha"]));
        let id = Uuid::now_v7();

        // Cancelled while holding the lock.
        let holder = async {
            let _lock = ingestor.lock_document(id).await;
            std::future::pending::<()>().await;
        };
        let _ = tokio::time::timeout(Duration::from_millis(10), holder).await;
        assert_eq!(ingestor.held_locks(), 0);

        // Cancelled while waiting behind another pass.
        let held = ingestor.lock_document(id).await;
        let file = path();
        let waiting = ingestor.ingest(id, &file);
        assert!(tokio::time::timeout(Duration::from_millis(10), waiting).await.is_err());
        assert_eq!(ingestor.held_locks(), 1);

        drop(held);
        assert_eq!(ingestor.held_locks(), 0);
    }
}
