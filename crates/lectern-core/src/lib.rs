#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # Lectern Core
//!
//! Pure, synchronous building blocks for answering questions about a single
//! document: splitting extracted text into overlapping word-bounded chunks,
//! scoring chunks against a query by literal term frequency, and gating
//! extracted pages on text quality before they are chunked.

/// Tracing target for chunking operations.
pub const TRACING_TARGET_CHUNK: &str = "lectern_core::chunk";

/// Tracing target for retrieval operations.
pub const TRACING_TARGET_RETRIEVAL: &str = "lectern_core::retrieval";

/// Tracing target for page quality checks.
pub const TRACING_TARGET_QUALITY: &str = "lectern_core::quality";

mod error;

pub mod chunk;
pub mod quality;
pub mod retrieval;

pub use chunk::{Chunk, ChunkRecord, ChunkerConfig, ChunkerConfigBuilder, TextChunker, chunk_text};
pub use error::{Error, ErrorKind, Result};
pub use quality::{QualityConfig, QualityReport, Verdict, assemble_pages, is_page_garbled};
pub use retrieval::{KeywordRetriever, QueryTerms, ScoredChunk, find_relevant_chunks};
