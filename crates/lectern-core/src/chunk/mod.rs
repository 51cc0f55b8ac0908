//! Text chunking for retrieval.
//!
//! Extracted document text is split into word-bounded [`Chunk`]s that overlap
//! by a configurable number of words, so context is preserved across split
//! boundaries.

mod chunker;
mod config;
mod model;

pub use chunker::{TextChunker, chunk_text};
pub use config::{ChunkerConfig, ChunkerConfigBuilder};
pub use model::{Chunk, ChunkRecord};
