//! Document persistence.

use std::collections::HashMap;
use std::sync::Arc;

use lectern_core::Chunk;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::model::{Document, DocumentStatus};
use crate::{Error, Result};

/// Type alias for a shared document store.
pub type BoxedDocumentStore = Arc<dyn DocumentStore>;

/// Text and chunks produced by one processing pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessedContent {
    pub extracted_text: String,
    pub total_pages: u32,
    pub chunks: Vec<Chunk>,
}

/// Storage for documents and their chunks.
///
/// Chunks are only ever replaced as a whole: a processing pass never leaves a
/// mix of old and new chunks behind.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores a new document.
    async fn insert(&self, document: Document) -> Result<()>;

    /// Returns the document with the given id.
    async fn get(&self, id: Uuid) -> Result<Document>;

    /// Returns all documents, newest first.
    async fn list(&self) -> Result<Vec<Document>>;

    /// Returns the document's chunks ordered by `chunk_index`.
    async fn chunks(&self, id: Uuid) -> Result<Vec<Chunk>>;

    /// Replaces the document's text and chunks and marks it ready.
    async fn replace_content(&self, id: Uuid, content: ProcessedContent) -> Result<()>;

    /// Updates the document's status.
    async fn set_status(&self, id: Uuid, status: DocumentStatus) -> Result<()>;

    /// Removes the document, returning it.
    async fn delete(&self, id: Uuid) -> Result<Document>;
}

/// In-memory [`DocumentStore`], cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<Uuid, Document>>>,
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns true if no documents are stored.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, document: Document) -> Result<()> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id) {
            return Err(Error::invalid_input(format!(
                "document {} already exists",
                document.id
            )));
        }

        documents.insert(document.id, document);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Document> {
        self.documents
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(Error::DocumentNotFound(id))
    }

    async fn list(&self) -> Result<Vec<Document>> {
        let mut documents: Vec<Document> = self.documents.read().await.values().cloned().collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(documents)
    }

    async fn chunks(&self, id: Uuid) -> Result<Vec<Chunk>> {
        let mut chunks = self.get(id).await?.chunks;
        chunks.sort_by_key(|chunk| chunk.chunk_index);
        Ok(chunks)
    }

    async fn replace_content(&self, id: Uuid, content: ProcessedContent) -> Result<()> {
        let mut documents = self.documents.write().await;
        let document = documents.get_mut(&id).ok_or(Error::DocumentNotFound(id))?;

        document.extracted_text = content.extracted_text;
        document.total_pages = content.total_pages;
        document.chunks = content.chunks;
        document.status = DocumentStatus::Ready;
        document.touch();
        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: DocumentStatus) -> Result<()> {
        let mut documents = self.documents.write().await;
        let document = documents.get_mut(&id).ok_or(Error::DocumentNotFound(id))?;

        document.status = status;
        document.touch();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<Document> {
        self.documents
            .write()
            .await
            .remove(&id)
            .ok_or(Error::DocumentNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use lectern_core::chunk_text;

    use super::*;

    #[tokio::test]
    async fn replace_content_swaps_chunks_and_marks_ready() {
        let store = InMemoryDocumentStore::new();
        let document = Document::new("notes", "/tmp/notes.pdf");
        let id = document.id;
        store.insert(document).await.unwrap();

        let first = chunk_text("alpha beta gamma delta", 2, 0);
        store
            .replace_content(
                id,
                ProcessedContent {
                    extracted_text: "alpha beta gamma delta".into(),
                    total_pages: 1,
                    chunks: first,
                },
            )
            .await
            .unwrap();
        assert_eq!(store.chunks(id).await.unwrap().len(), 2);

        let second = chunk_text("omega", 2, 0);
        store
            .replace_content(
                id,
                ProcessedContent {
                    extracted_text: "omega".into(),
                    total_pages: 1,
                    chunks: second,
                },
            )
            .await
            .unwrap();

        let document = store.get(id).await.unwrap();
        assert_eq!(document.status, DocumentStatus::Ready);
        assert_eq!(document.chunks.len(), 1);
        assert_eq!(document.chunks[0].content, "omega");
    }

    #[tokio::test]
    async fn chunks_are_ordered_by_index() {
        let store = InMemoryDocumentStore::new();
        let mut document = Document::new("notes", "/tmp/notes.pdf");
        let mut chunks = chunk_text("a1 a2 a3 a4 a5 a6", 2, 0);
        chunks.reverse();
        document.chunks = chunks;
        let id = document.id;
        store.insert(document).await.unwrap();

        let indexes: Vec<u32> = store
            .chunks(id)
            .await
            .unwrap()
            .iter()
            .map(|chunk| chunk.chunk_index)
            .collect();
        assert_eq!(indexes, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn missing_documents_are_reported() {
        let store = InMemoryDocumentStore::new();
        let id = Uuid::now_v7();

        assert!(matches!(
            store.get(id).await,
            Err(Error::DocumentNotFound(missing)) if missing == id
        ));
        assert!(store.set_status(id, DocumentStatus::Failed).await.is_err());
        assert!(store.delete(id).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = InMemoryDocumentStore::new();
        let document = Document::new("notes", "/tmp/notes.pdf");
        store.insert(document.clone()).await.unwrap();

        assert!(store.insert(document).await.is_err());
        assert_eq!(store.len().await, 1);
    }
}
