//! Subcommands.

mod ask;
mod chunk;
mod search;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
pub use ask::AskCommand;
use clap::Subcommand;
pub use chunk::ChunkCommand;
use lectern_rag::provider::{BoxedTextExtractor, ExtractedText};
use lectern_rag::{PdfTextExtractor, PlainTextExtractor, TextExtractor};
pub use search::SearchCommand;
use serde::Serialize;

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Split a document into overlapping chunks and print them as JSON.
    Chunk(ChunkCommand),
    /// Rank a document's chunks against a query and print the best matches.
    Search(SearchCommand),
    /// Ask a question about a document using a chat model.
    Ask(AskCommand),
}

impl Command {
    /// Runs the subcommand.
    pub async fn run(self) -> anyhow::Result<()> {
        match self {
            Self::Chunk(command) => command.run().await,
            Self::Search(command) => command.run().await,
            Self::Ask(command) => command.run().await,
        }
    }
}

/// Picks an extractor by file extension: PDF files are parsed, anything
/// else is read as UTF-8 text.
fn extractor_for(path: &Path) -> BoxedTextExtractor {
    let is_pdf = path
        .extension()
        .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        Arc::new(PdfTextExtractor)
    } else {
        Arc::new(PlainTextExtractor)
    }
}

/// Extracts the text of the file at `path`.
async fn extract(path: &Path) -> anyhow::Result<ExtractedText> {
    extractor_for(path)
        .extract(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Prints `value` to stdout as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
