use std::path::PathBuf;

use clap::Args;
use lectern_core::TextChunker;

use crate::TRACING_TARGET_COMMAND;
use crate::config::ChunkingArgs;

/// Arguments of `lectern chunk`.
#[derive(Debug, Clone, Args)]
pub struct ChunkCommand {
    /// Document to chunk (`.pdf` or plain text).
    pub path: PathBuf,

    #[command(flatten)]
    pub chunking: ChunkingArgs,
}

impl ChunkCommand {
    pub async fn run(self) -> anyhow::Result<()> {
        let chunker = TextChunker::new(self.chunking.to_config()?);
        let extracted = super::extract(&self.path).await?;
        let chunks = chunker.chunk(&extracted.text);

        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            path = %self.path.display(),
            pages = extracted.page_count,
            chunks = chunks.len(),
            "Chunked document"
        );

        super::print_json(&chunks)
    }
}
