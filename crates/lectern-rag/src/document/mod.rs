//! Documents, their storage and ingestion.

mod ingest;
mod model;
mod store;

pub use ingest::{IngestReport, Ingestor};
pub use model::{Document, DocumentStatus};
pub use store::{BoxedDocumentStore, DocumentStore, InMemoryDocumentStore, ProcessedContent};
