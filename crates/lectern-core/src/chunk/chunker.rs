//! Word-bounded text chunking.

use tracing::{debug, instrument};

use super::{Chunk, ChunkerConfig};
use crate::TRACING_TARGET_CHUNK;

/// Splits text into overlapping, word-bounded chunks.
///
/// Paragraphs (separated by one or more newlines) are packed into chunks of at
/// most `target_words` words. A paragraph that is larger than that on its own
/// is cut into sliding windows that overlap by `overlap_words` words. Chunk
/// boundaries always fall between words.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextChunker {
    config: ChunkerConfig,
}

impl TextChunker {
    /// Creates a chunker with the given configuration.
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Returns the chunker configuration.
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Splits `text` into chunks indexed `0, 1, 2, …` in emission order.
    ///
    /// Empty or whitespace-only text produces no chunks.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let normalized = normalize_whitespace(text);
        if normalized.is_empty() {
            return Vec::new();
        }

        let target = self.config.target_words();
        let overlap = self.config.overlap_words();

        let mut emitter = Emitter::default();
        let mut current: Vec<&str> = Vec::new();

        for paragraph in normalized.split('\n') {
            let words: Vec<&str> = paragraph.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }

            if words.len() > target {
                if !current.is_empty() {
                    emitter.emit(&current);
                    current.clear();
                }

                let last_window = self.split_oversized(&words, &mut emitter);
                // A window that never advances carries nothing forward.
                if self.config.window_step().is_some() {
                    current = tail(last_window, overlap).to_vec();
                }
                continue;
            }

            if current.len() + words.len() > target {
                emitter.emit(&current);
                current = tail(&current, overlap).to_vec();
            }

            current.extend(words);
        }

        if !current.is_empty() {
            emitter.emit(&current);
        }

        if emitter.is_empty() {
            let words: Vec<&str> = normalized.split_whitespace().collect();
            self.split_oversized(&words, &mut emitter);
        }

        let chunks = emitter.into_chunks();
        debug!(
            target: TRACING_TARGET_CHUNK,
            chunk_count = chunks.len(),
            target_words = target,
            overlap_words = overlap,
            "split text into chunks"
        );
        chunks
    }

    /// Emits sliding windows over `words` and returns the last window.
    fn split_oversized<'w, 'a>(
        &self,
        words: &'w [&'a str],
        emitter: &mut Emitter,
    ) -> &'w [&'a str] {
        let target = self.config.target_words();
        let step = self.config.window_step();

        let mut start = 0;
        let mut last_window: &[&str] = &[];

        while start < words.len() {
            let end = (start + target).min(words.len());
            last_window = &words[start..end];
            emitter.emit(last_window);

            match step {
                Some(step) => start += step,
                None => break,
            }
        }

        last_window
    }
}

/// Collects emitted chunks and assigns their indices.
#[derive(Debug, Default)]
struct Emitter {
    chunks: Vec<Chunk>,
}

impl Emitter {
    fn emit(&mut self, words: &[&str]) {
        if words.is_empty() {
            return;
        }

        let index = self.chunks.len() as u32;
        self.chunks.push(Chunk::from_words(index, words));
    }

    fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn into_chunks(self) -> Vec<Chunk> {
        self.chunks
    }
}

/// Returns the last `count` words of `words`.
fn tail<'w, 'a>(words: &'w [&'a str], count: usize) -> &'w [&'a str] {
    &words[words.len().saturating_sub(count)..]
}

/// Collapses runs of spaces and trims; newlines are kept as paragraph breaks.
fn normalize_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut previous_space = false;

    for c in text.chars() {
        if c == ' ' {
            if !previous_space {
                normalized.push(' ');
            }
            previous_space = true;
        } else {
            normalized.push(c);
            previous_space = false;
        }
    }

    normalized.trim().to_string()
}

/// Splits `text` with explicit tuning knobs.
///
/// Shorthand for `TextChunker::new(config).chunk(text)`. A zero
/// `target_words` yields no chunks.
pub fn chunk_text(text: &str, target_words: usize, overlap_words: usize) -> Vec<Chunk> {
    match ChunkerConfig::builder()
        .with_target_words(target_words)
        .with_overlap_words(overlap_words)
        .build()
    {
        Ok(config) => TextChunker::new(config).chunk(text),
        Err(_) => Vec::new(),
    }
}
