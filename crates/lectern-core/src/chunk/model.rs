//! Chunk data model.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A bounded, ordered unit of document text used as the retrieval granularity.
///
/// Chunks are created once, in bulk, right after text extraction and are never
/// patched afterwards. Reprocessing a document replaces its chunk set wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Space-joined words making up the chunk.
    pub content: String,
    /// Zero-based emission order within the document.
    pub chunk_index: u32,
    /// Page tag; the chunker does not track page boundaries and always emits 0.
    #[serde(default)]
    pub page_number: u32,
    /// Number of space-joined words in `content`.
    pub word_count: u32,
}

impl Chunk {
    /// Creates a chunk from its words.
    pub(crate) fn from_words(chunk_index: u32, words: &[&str]) -> Self {
        Self {
            content: words.join(" "),
            chunk_index,
            page_number: 0,
            word_count: words.len() as u32,
        }
    }

    /// Returns the chunk words in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.content.split_whitespace()
    }
}

/// A chunk as read back from persistence, with every field optional.
///
/// Stored chunk sets may predate the current schema or be hand-edited, so
/// retrieval accepts these records and skips the ones that cannot be scored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,
}

impl ChunkRecord {
    /// Converts the record into a [`Chunk`].
    ///
    /// `position` is the record's place in the stored sequence and stands in
    /// for a missing `chunk_index`. A missing `word_count` is recomputed.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MalformedChunk`](crate::ErrorKind::MalformedChunk)
    /// when the record has no `content`.
    pub fn into_chunk(self, position: usize) -> Result<Chunk> {
        let Some(content) = self.content else {
            return Err(Error::malformed_chunk()
                .with_message(format!("chunk record at position {position} has no content")));
        };

        let word_count = self
            .word_count
            .unwrap_or_else(|| content.split_whitespace().count() as u32);

        Ok(Chunk {
            chunk_index: self.chunk_index.unwrap_or(position as u32),
            page_number: self.page_number.unwrap_or_default(),
            word_count,
            content,
        })
    }
}

impl From<Chunk> for ChunkRecord {
    fn from(chunk: Chunk) -> Self {
        Self {
            content: Some(chunk.content),
            chunk_index: Some(chunk.chunk_index),
            page_number: Some(chunk.page_number),
            word_count: Some(chunk.word_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn chunk_serializes_camel_case() {
        let chunk = Chunk::from_words(2, &["alpha", "beta"]);
        let json = serde_json::to_value(&chunk).unwrap();

        assert_eq!(json["content"], "alpha beta");
        assert_eq!(json["chunkIndex"], 2);
        assert_eq!(json["pageNumber"], 0);
        assert_eq!(json["wordCount"], 2);
    }

    #[test]
    fn record_without_content_is_malformed() {
        let record: ChunkRecord = serde_json::from_str(r#"{"chunkIndex": 4}"#).unwrap();
        let error = record.into_chunk(4).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::MalformedChunk);
    }

    #[test]
    fn record_fills_missing_fields() {
        let record: ChunkRecord = serde_json::from_str(r#"{"content": "one two three"}"#).unwrap();
        let chunk = record.into_chunk(7).unwrap();

        assert_eq!(chunk.chunk_index, 7);
        assert_eq!(chunk.page_number, 0);
        assert_eq!(chunk.word_count, 3);
    }
}
