//! Scored chunk returned by retrieval.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::Chunk;

/// A chunk paired with its relevance to a query.
///
/// Computed fresh on every retrieval call. Serializes as the chunk fields
/// plus `relevanceScore`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    /// Total literal occurrences of the query's significant terms.
    pub relevance_score: u32,
}

impl ScoredChunk {
    /// Creates a new scored chunk.
    pub fn new(chunk: Chunk, relevance_score: u32) -> Self {
        Self {
            chunk,
            relevance_score,
        }
    }

    /// Returns the first `max_chars` characters of the content followed by `...`.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut preview: String = self.chunk.content.chars().take(max_chars).collect();
        preview.push_str("...");
        preview
    }

    /// Consumes the scored chunk and returns the underlying chunk.
    pub fn into_chunk(self) -> Chunk {
        self.chunk
    }
}

impl Deref for ScoredChunk {
    type Target = Chunk;

    fn deref(&self) -> &Self::Target {
        &self.chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_text;

    #[test]
    fn serializes_flattened() {
        let chunk = chunk_text("the cat sat", 500, 50).remove(0);
        let scored = ScoredChunk::new(chunk, 1);
        let json = serde_json::to_value(&scored).unwrap();

        assert_eq!(json["content"], "the cat sat");
        assert_eq!(json["chunkIndex"], 0);
        assert_eq!(json["relevanceScore"], 1);
    }

    #[test]
    fn preview_truncates_on_characters() {
        let chunk = chunk_text("héllo wörld", 500, 50).remove(0);
        let scored = ScoredChunk::new(chunk, 1);

        assert_eq!(scored.preview(4), "héll...");
        assert_eq!(scored.preview(100), "héllo wörld...");
    }
}
