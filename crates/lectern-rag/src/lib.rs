#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for ingestion operations.
pub const TRACING_TARGET_INGEST: &str = "lectern_rag::ingest";

/// Tracing target for question answering.
pub const TRACING_TARGET_CHAT: &str = "lectern_rag::chat";

mod config;
mod error;

pub mod chat;
pub mod document;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
pub mod provider;

pub use chat::{Answer, ChatHistoryStore, ConversationTurn, QaService};
pub use config::RagConfig;
pub use document::{
    Document, DocumentStatus, DocumentStore, InMemoryDocumentStore, IngestReport, Ingestor,
};
pub use error::{Error, Result};
#[cfg(feature = "pdf")]
pub use provider::PdfTextExtractor;
pub use provider::{
    ChatProvider, OcrProvider, OpenRouterClient, OpenRouterConfig, PlainTextExtractor,
    TextExtractor,
};
