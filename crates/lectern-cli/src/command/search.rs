use std::path::PathBuf;

use clap::Args;
use lectern_core::{KeywordRetriever, TextChunker};

use crate::TRACING_TARGET_COMMAND;
use crate::config::ChunkingArgs;

/// Arguments of `lectern search`.
#[derive(Debug, Clone, Args)]
pub struct SearchCommand {
    /// Document to search (`.pdf` or plain text).
    pub path: PathBuf,

    /// Query whose terms are counted in each chunk.
    pub query: String,

    /// Maximum number of chunks to print.
    #[arg(long, short = 'k', env = "LECTERN_SEARCH_LIMIT", default_value_t = 3)]
    pub limit: usize,

    #[command(flatten)]
    pub chunking: ChunkingArgs,
}

impl SearchCommand {
    pub async fn run(self) -> anyhow::Result<()> {
        let chunker = TextChunker::new(self.chunking.to_config()?);
        let extracted = super::extract(&self.path).await?;
        let chunks = chunker.chunk(&extracted.text);

        let results = KeywordRetriever::new(self.limit).find_relevant(&chunks, &self.query);

        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            path = %self.path.display(),
            chunks = chunks.len(),
            matches = results.len(),
            "Searched document"
        );

        super::print_json(&results)
    }
}
