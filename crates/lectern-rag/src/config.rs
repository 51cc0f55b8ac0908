//! RAG pipeline configuration.

use std::time::Duration;

use lectern_core::{ChunkerConfig, QualityConfig};

/// Configuration for ingestion and question answering.
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Chunk size and overlap used when ingesting documents.
    pub chunker: ChunkerConfig,

    /// Maximum chunks retrieved per question.
    pub retrieval_limit: usize,

    /// Number of most recent stored turns handed to prompt building.
    pub history_window: usize,

    /// Maximum prior turns placed into the model request.
    pub prompt_history_cap: usize,

    /// Characters of each used chunk recorded alongside the user's turn.
    pub preview_chars: usize,

    /// Upper bound on the joined context length. If `None`, only the chunk
    /// count bounds the context.
    pub context_char_budget: Option<usize>,

    /// Thresholds for the garbled-page gate.
    pub quality: QualityConfig,

    /// Pages sent to the OCR collaborator per repair request.
    pub ocr_batch_size: usize,

    /// Pause between consecutive page-repair requests.
    pub ocr_batch_delay: Duration,

    /// Whole-document OCR output shorter than this (trimmed) is discarded.
    pub min_ocr_chars: usize,

    /// Token limit for generated answers.
    pub answer_max_tokens: u32,

    /// Sampling temperature for generated answers.
    pub answer_temperature: f32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunker: ChunkerConfig::default(),
            retrieval_limit: 5,
            history_window: 6,
            prompt_history_cap: 8,
            preview_chars: 100,
            context_char_budget: None,
            quality: QualityConfig::default(),
            ocr_batch_size: 10,
            ocr_batch_delay: Duration::from_secs(2),
            min_ocr_chars: 50,
            answer_max_tokens: 1500,
            answer_temperature: 0.3,
        }
    }
}
