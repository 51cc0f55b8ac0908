//! Text-quality gate for extracted PDF pages.
//!
//! PDF text layers for some scripts (Arabic in particular) are often extracted
//! as mojibake. Pages whose share of readable characters is too low are
//! flagged so they can be re-read with OCR before chunking.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::TRACING_TARGET_QUALITY;

/// Default values for the quality thresholds.
mod defaults {
    /// Pages shorter than this (after trimming) are never flagged.
    pub const MIN_PAGE_CHARS: usize = 10;

    /// Pages with a lower readable-character ratio are flagged.
    pub const MIN_READABLE_RATIO: f64 = 0.65;

    /// Above this share of flagged pages the whole document is re-read.
    pub const WHOLE_DOCUMENT_RATIO: f64 = 0.6;
}

/// Thresholds for the page quality gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Pages shorter than this many characters (after trimming) are never flagged.
    pub min_page_chars: usize,
    /// Minimum ratio of readable characters to total characters.
    pub min_readable_ratio: f64,
    /// Share of flagged pages above which the whole document goes to OCR.
    pub whole_document_ratio: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            min_page_chars: defaults::MIN_PAGE_CHARS,
            min_readable_ratio: defaults::MIN_READABLE_RATIO,
            whole_document_ratio: defaults::WHOLE_DOCUMENT_RATIO,
        }
    }
}

impl QualityConfig {
    /// Returns true if the page text looks garbled.
    pub fn is_garbled(&self, page: &str) -> bool {
        if page.trim().chars().count() < self.min_page_chars {
            return false;
        }

        let (readable, total) = page.chars().fold((0usize, 0usize), |(readable, total), c| {
            (readable + usize::from(is_readable(c)), total + 1)
        });

        (readable as f64) / (total as f64) < self.min_readable_ratio
    }
}

/// Returns true for characters expected in clean Latin or Arabic text.
fn is_readable(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}' | '\u{08A0}'..='\u{08FF}')
}

/// Returns true if the page text looks garbled under the default thresholds.
pub fn is_page_garbled(page: &str) -> bool {
    QualityConfig::default().is_garbled(page)
}

/// What to do with a document's extracted pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every page is usable as extracted.
    Clean,
    /// The listed pages (0-based) should be repaired individually.
    RepairPages(Vec<usize>),
    /// Too much of the document is unreadable; re-read the whole file.
    WholeDocumentOcr,
}

/// Result of running the quality gate over a document's pages.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    /// Total number of pages assessed.
    pub page_count: usize,
    /// 0-based indexes of garbled pages.
    pub garbled: Vec<usize>,
    /// Recommended action.
    pub verdict: Verdict,
}

impl QualityReport {
    /// Assesses `pages` with the default thresholds.
    pub fn assess<S: AsRef<str>>(pages: &[S]) -> Self {
        Self::assess_with(&QualityConfig::default(), pages)
    }

    /// Assesses `pages` with custom thresholds.
    pub fn assess_with<S: AsRef<str>>(config: &QualityConfig, pages: &[S]) -> Self {
        let garbled: Vec<usize> = pages
            .iter()
            .enumerate()
            .filter(|(_, page)| config.is_garbled(page.as_ref()))
            .map(|(index, _)| index)
            .collect();

        let page_count = pages.len();
        let verdict = if page_count == 0
            || garbled.len() as f64 > page_count as f64 * config.whole_document_ratio
        {
            Verdict::WholeDocumentOcr
        } else if garbled.is_empty() {
            Verdict::Clean
        } else {
            Verdict::RepairPages(garbled.clone())
        };

        debug!(
            target: TRACING_TARGET_QUALITY,
            page_count,
            garbled = garbled.len(),
            verdict = ?verdict,
            "assessed page quality"
        );

        Self {
            page_count,
            garbled,
            verdict,
        }
    }
}

/// Joins page texts into one document, tagging each page as `[Page N]`.
pub fn assemble_pages<S: AsRef<str>>(pages: &[S]) -> String {
    pages
        .iter()
        .enumerate()
        .map(|(index, page)| format!("[Page {}]\n{}", index + 1, page.as_ref()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const GARBLED: &str = "ÙØ§Ù„Ø¹Ø±Ø¨ÙŠØ© ÙƒØªØ§Ø¨ Ø§Ù„Ù…Ø¹Ù„Ù…";

    #[test]
    fn short_pages_are_never_garbled() {
        assert!(!is_page_garbled(""));
        assert!(!is_page_garbled("  ØØØ  "));
    }

    #[test]
    fn clean_latin_and_arabic_pass() {
        assert!(!is_page_garbled("The quick brown fox jumps over the lazy dog 42"));
        assert!(!is_page_garbled("هذا نص عربي واضح تماما للقراءة"));
    }

    #[test]
    fn mojibake_is_garbled() {
        assert!(is_page_garbled(GARBLED));
    }

    #[test]
    fn verdicts() {
        let clean = ["plain readable text here", "another readable page"];
        assert_eq!(QualityReport::assess(&clean).verdict, Verdict::Clean);

        let mixed = ["plain readable text here", GARBLED, "another readable page"];
        assert_eq!(
            QualityReport::assess(&mixed).verdict,
            Verdict::RepairPages(vec![1])
        );

        let mostly_bad = [GARBLED, GARBLED, "fine page of text"];
        assert_eq!(
            QualityReport::assess(&mostly_bad).verdict,
            Verdict::WholeDocumentOcr
        );

        let none: [&str; 0] = [];
        assert_eq!(QualityReport::assess(&none).verdict, Verdict::WholeDocumentOcr);
    }

    #[test]
    fn assemble_tags_pages() {
        let text = assemble_pages(&["first", "second"]);
        assert_eq!(text, "[Page 1]\nfirst\n\n[Page 2]\nsecond");
    }
}
