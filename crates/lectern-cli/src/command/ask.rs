use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use lectern_rag::{InMemoryDocumentStore, Ingestor, QaService, RagConfig};

use crate::TRACING_TARGET_COMMAND;
use crate::config::{ChunkingArgs, OpenRouterArgs};

/// Arguments of `lectern ask`.
#[derive(Debug, Clone, Args)]
pub struct AskCommand {
    /// Document to ask about (`.pdf` or plain text).
    pub path: PathBuf,

    /// Question to answer from the document.
    pub question: String,

    /// Maximum number of chunks placed in the model context.
    #[arg(long, env = "LECTERN_RETRIEVAL_LIMIT", default_value_t = 5)]
    pub limit: usize,

    /// Upper bound on the context length in characters.
    #[arg(long, env = "LECTERN_CONTEXT_CHARS")]
    pub context_chars: Option<usize>,

    /// Repair garbled pages with the OCR model before chunking.
    #[arg(long, env = "LECTERN_OCR")]
    pub ocr: bool,

    /// Print the full answer record as JSON instead of the answer text.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub chunking: ChunkingArgs,

    #[command(flatten)]
    pub openrouter: OpenRouterArgs,
}

impl AskCommand {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = RagConfig {
            chunker: self.chunking.to_config()?,
            retrieval_limit: self.limit,
            context_char_budget: self.context_chars,
            ..RagConfig::default()
        };

        let client = Arc::new(self.openrouter.create_client()?);
        let store = Arc::new(InMemoryDocumentStore::new());

        let mut ingestor = Ingestor::new(store.clone(), super::extractor_for(&self.path), &config);
        if self.ocr {
            ingestor = ingestor.with_ocr(client.clone());
        }

        let title = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_owned());
        let document = ingestor
            .upload(title, &self.path)
            .await
            .with_context(|| format!("failed to ingest {}", self.path.display()))?;

        tracing::info!(
            target: TRACING_TARGET_COMMAND,
            document_id = %document.id,
            pages = document.total_pages,
            chunks = document.chunks.len(),
            "Document ready"
        );

        let qa = QaService::new(store, client, config);
        let answer = qa
            .ask(document.id, &self.question)
            .await
            .context("failed to answer question")?;

        if self.json {
            super::print_json(&answer)
        } else {
            println!("{}", answer.answer);
            Ok(())
        }
    }
}
