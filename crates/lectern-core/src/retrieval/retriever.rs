//! Keyword retrieval over a document's chunks.

use tracing::{debug, warn};

use super::{QueryTerms, ScoredChunk};
use crate::{Chunk, ChunkRecord, TRACING_TARGET_RETRIEVAL};

/// Default number of chunks returned by a retrieval call.
pub const DEFAULT_MAX_CHUNKS: usize = 3;

/// Ranks chunks by literal term frequency against a query.
///
/// Chunks without a single matching term are dropped. The rest are ordered by
/// score, highest first; equal scores keep their input order, so identical
/// input always produces identical output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordRetriever {
    max_chunks: usize,
}

impl Default for KeywordRetriever {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNKS)
    }
}

impl KeywordRetriever {
    /// Creates a retriever returning at most `max_chunks` chunks.
    pub fn new(max_chunks: usize) -> Self {
        Self { max_chunks }
    }

    /// Returns the maximum number of chunks returned per call.
    pub fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    /// Returns the most relevant chunks for `query`.
    pub fn find_relevant(&self, chunks: &[Chunk], query: &str) -> Vec<ScoredChunk> {
        let terms = QueryTerms::parse(query);
        if terms.is_empty() || chunks.is_empty() {
            return Vec::new();
        }

        let candidates = chunks
            .iter()
            .enumerate()
            .map(|(position, chunk)| (position, chunk.content.as_str()));

        self.rank(&terms, candidates)
            .into_iter()
            .map(|(position, score)| ScoredChunk::new(chunks[position].clone(), score))
            .collect()
    }

    /// Returns the most relevant persisted records for `query`.
    ///
    /// Records without content are skipped with a warning instead of failing
    /// the whole call.
    pub fn find_relevant_records(&self, records: &[ChunkRecord], query: &str) -> Vec<ScoredChunk> {
        let terms = QueryTerms::parse(query);
        if terms.is_empty() || records.is_empty() {
            return Vec::new();
        }

        let candidates = records
            .iter()
            .enumerate()
            .filter_map(|(position, record)| match record.content.as_deref() {
                Some(content) => Some((position, content)),
                None => {
                    warn!(
                        target: TRACING_TARGET_RETRIEVAL,
                        position,
                        chunk_index = ?record.chunk_index,
                        "skipping chunk record without content"
                    );
                    None
                }
            });

        self.rank(&terms, candidates)
            .into_iter()
            .filter_map(|(position, score)| {
                let chunk = records[position].clone().into_chunk(position).ok()?;
                Some(ScoredChunk::new(chunk, score))
            })
            .collect()
    }

    /// Scores candidates and returns `(position, score)` pairs, best first.
    fn rank<'a>(
        &self,
        terms: &QueryTerms,
        candidates: impl Iterator<Item = (usize, &'a str)>,
    ) -> Vec<(usize, u32)> {
        let mut scored: Vec<(usize, u32)> = candidates
            .map(|(position, content)| (position, terms.score(content)))
            .filter(|&(_, score)| score > 0)
            .collect();

        let matched = scored.len();

        // Stable: ties keep input order.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(self.max_chunks);

        debug!(
            target: TRACING_TARGET_RETRIEVAL,
            terms = terms.len(),
            matched,
            returned = scored.len(),
            "ranked chunks"
        );

        scored
    }
}

/// Returns up to `max_chunks` chunks most relevant to `query`.
///
/// Shorthand for `KeywordRetriever::new(max_chunks).find_relevant(chunks, query)`.
pub fn find_relevant_chunks(chunks: &[Chunk], query: &str, max_chunks: usize) -> Vec<ScoredChunk> {
    KeywordRetriever::new(max_chunks).find_relevant(chunks, query)
}
