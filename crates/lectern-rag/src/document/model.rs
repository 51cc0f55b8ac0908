//! Document record and processing status.

use std::path::PathBuf;

use jiff::Timestamp;
use lectern_core::Chunk;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

/// Processing state of a document.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentStatus {
    /// Text extraction and chunking are in progress.
    #[default]
    Processing,
    /// Chunks are stored and the document can be queried.
    Ready,
    /// The last processing pass failed.
    Failed,
}

impl DocumentStatus {
    /// Returns true if the document can answer questions.
    #[inline]
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// An uploaded document and its derived text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    /// Location of the stored source file.
    pub file_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    pub status: DocumentStatus,
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default)]
    pub total_pages: u32,
    /// Chunks ordered by `chunk_index`.
    #[serde(default)]
    pub chunks: Vec<Chunk>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Document {
    /// Creates a new document in the `Processing` state.
    pub fn new(title: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        let now = Timestamp::now();
        Self {
            id: Uuid::now_v7(),
            title: title.into(),
            file_path: file_path.into(),
            file_size: None,
            status: DocumentStatus::Processing,
            extracted_text: String::new(),
            total_pages: 0,
            chunks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the size of the stored file.
    pub fn with_file_size(mut self, file_size: u64) -> Self {
        self.file_size = Some(file_size);
        self
    }

    /// Bumps `updated_at` to now.
    pub(crate) fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn new_documents_are_processing() {
        let document = Document::new("Lecture 1", "/tmp/lecture.pdf").with_file_size(42);
        assert_eq!(document.status, DocumentStatus::Processing);
        assert!(document.chunks.is_empty());
        assert_eq!(document.file_size, Some(42));
        assert_eq!(document.created_at, document.updated_at);
    }

    #[test]
    fn status_round_trips_as_snake_case() {
        assert_eq!(DocumentStatus::Ready.to_string(), "ready");
        assert_eq!(
            DocumentStatus::from_str("failed").unwrap(),
            DocumentStatus::Failed
        );
        assert_eq!(
            serde_json::to_string(&DocumentStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert!(DocumentStatus::Ready.is_ready());
        assert!(!DocumentStatus::Failed.is_ready());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let document = Document::new("t", "/tmp/t.pdf");
        let json = serde_json::to_value(&document).unwrap();
        assert!(json.get("extractedText").is_some());
        assert!(json.get("totalPages").is_some());
        assert!(json.get("fileSize").is_none());
    }
}
