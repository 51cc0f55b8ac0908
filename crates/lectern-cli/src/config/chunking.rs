//! Chunking options.

use anyhow::Context;
use clap::Args;
use lectern_core::ChunkerConfig;

/// Chunk size and overlap.
#[derive(Debug, Clone, Args)]
pub struct ChunkingArgs {
    /// Target number of words per chunk.
    #[arg(long, env = "LECTERN_TARGET_WORDS", default_value_t = 500)]
    pub target_words: usize,

    /// Number of trailing words carried into the next chunk.
    #[arg(long, env = "LECTERN_OVERLAP_WORDS", default_value_t = 50)]
    pub overlap_words: usize,
}

impl ChunkingArgs {
    /// Builds the chunker configuration.
    pub fn to_config(&self) -> anyhow::Result<ChunkerConfig> {
        ChunkerConfig::builder()
            .with_target_words(self.target_words)
            .with_overlap_words(self.overlap_words)
            .build()
            .context("invalid chunking options")
    }
}
