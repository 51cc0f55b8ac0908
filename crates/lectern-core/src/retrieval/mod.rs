//! Lexical retrieval over document chunks.
//!
//! Scoring is a plain literal term count: every query term of two or more
//! characters is counted as a case-insensitive substring of the chunk
//! content. There is no stemming, tokenization or embedding similarity.

mod query;
mod retriever;
mod scored;

pub use query::{MIN_TERM_CHARS, QueryTerms};
pub use retriever::{DEFAULT_MAX_CHUNKS, KeywordRetriever, find_relevant_chunks};
pub use scored::ScoredChunk;
