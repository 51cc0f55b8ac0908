//! Context assembly from retrieved chunks.

use lectern_core::ScoredChunk;

/// Separator placed between chunks in the joined context.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Joins retrieved chunks into the context handed to the model.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    char_budget: Option<usize>,
}

impl ContextBuilder {
    /// Creates a builder without a length bound.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the joined context to `budget` characters.
    ///
    /// Chunks are never cut: a chunk that would exceed the budget is dropped
    /// together with every chunk after it. The first chunk is always kept.
    pub fn with_char_budget(mut self, budget: Option<usize>) -> Self {
        self.char_budget = budget;
        self
    }

    /// Returns the chunks that fit the budget, in rank order.
    pub fn select<'a>(&self, chunks: &'a [ScoredChunk]) -> &'a [ScoredChunk] {
        let Some(budget) = self.char_budget else {
            return chunks;
        };

        let separator = CONTEXT_SEPARATOR.chars().count();
        let mut used = 0;
        let mut taken = 0;
        for (position, chunk) in chunks.iter().enumerate() {
            let cost = chunk.content.chars().count() + if position > 0 { separator } else { 0 };
            if position > 0 && used + cost > budget {
                break;
            }
            used += cost;
            taken += 1;
        }

        &chunks[..taken]
    }

    /// Joins the selected chunks with [`CONTEXT_SEPARATOR`].
    ///
    /// Returns an empty string when there are no chunks.
    pub fn build(&self, chunks: &[ScoredChunk]) -> String {
        self.select(chunks)
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use lectern_core::chunk_text;

    use super::*;

    fn scored(texts: &[&str]) -> Vec<ScoredChunk> {
        texts
            .iter()
            .flat_map(|text| chunk_text(text, 500, 50))
            .map(|chunk| ScoredChunk::new(chunk, 1))
            .collect()
    }

    #[test]
    fn joins_with_separator() {
        let chunks = scored(&["alpha one", "beta two"]);
        assert_eq!(
            ContextBuilder::new().build(&chunks),
            "alpha one\n\n---\n\nbeta two"
        );
        assert_eq!(ContextBuilder::new().build(&[]), "");
    }

    #[test]
    fn budget_keeps_whole_chunks_only() {
        let chunks = scored(&["aaaa", "bbbb", "cccc"]);
        let builder = ContextBuilder::new().with_char_budget(Some(4 + 7 + 4));
        assert_eq!(builder.build(&chunks), "aaaa\n\n---\n\nbbbb");
    }

    #[test]
    fn first_chunk_survives_any_budget() {
        let chunks = scored(&["a long first chunk", "second"]);
        let builder = ContextBuilder::new().with_char_budget(Some(1));
        assert_eq!(builder.build(&chunks), "a long first chunk");
    }
}
