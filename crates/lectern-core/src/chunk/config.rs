//! Chunker configuration.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default values for configuration options.
mod defaults {
    /// Default target chunk size in words.
    pub const TARGET_WORDS: usize = 500;

    /// Default number of words carried into the following chunk.
    pub const OVERLAP_WORDS: usize = 50;
}

/// Validates the ChunkerConfig before building.
fn validate_config(builder: &ChunkerConfigBuilder) -> std::result::Result<(), String> {
    if let Some(0) = builder.target_words {
        return Err("Target words per chunk must be greater than 0".to_string());
    }

    Ok(())
}

/// Configuration for [`TextChunker`](super::TextChunker).
///
/// An `overlap_words` value greater than or equal to `target_words` is
/// accepted: oversized paragraphs are then cut into a single window with no
/// further advancement, and nothing is carried into the next chunk.
///
/// # Examples
///
/// ```rust
/// use lectern_core::ChunkerConfig;
///
/// let config = ChunkerConfig::builder()
///     .with_target_words(200usize)
///     .with_overlap_words(20usize)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.target_words(), 200);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "validate_config")
)]
pub struct ChunkerConfig {
    /// Target number of words per chunk (default: 500)
    #[builder(default = "defaults::TARGET_WORDS")]
    target_words: usize,

    /// Number of trailing words carried into the next chunk (default: 50)
    #[builder(default = "defaults::OVERLAP_WORDS")]
    overlap_words: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_words: defaults::TARGET_WORDS,
            overlap_words: defaults::OVERLAP_WORDS,
        }
    }
}

impl ChunkerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ChunkerConfigBuilder {
        ChunkerConfigBuilder::default()
    }

    /// Returns the target number of words per chunk.
    pub fn target_words(&self) -> usize {
        self.target_words
    }

    /// Returns the number of overlap words.
    pub fn overlap_words(&self) -> usize {
        self.overlap_words
    }

    /// Returns how far each window advances inside an oversized paragraph.
    ///
    /// `None` when the overlap swallows the whole window.
    pub fn window_step(&self) -> Option<usize> {
        self.target_words
            .checked_sub(self.overlap_words)
            .filter(|&step| step > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChunkerConfig::default();
        assert_eq!(config.target_words(), 500);
        assert_eq!(config.overlap_words(), 50);
        assert_eq!(config.window_step(), Some(450));
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let config = ChunkerConfig::builder().build().unwrap();
        assert_eq!(config, ChunkerConfig::default());
    }

    #[test]
    fn test_builder_validation() {
        let result = ChunkerConfig::builder().with_target_words(0usize).build();
        assert!(result.is_err());

        let config = ChunkerConfig::builder()
            .with_target_words(10usize)
            .with_overlap_words(10usize)
            .build()
            .unwrap();
        assert_eq!(config.window_step(), None);
    }
}
