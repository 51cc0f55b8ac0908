//! Query term parsing and literal term-frequency scoring.

use regex::Regex;
use tracing::warn;

use crate::TRACING_TARGET_RETRIEVAL;

/// Terms shorter than this many characters never contribute to a score.
pub const MIN_TERM_CHARS: usize = 2;

/// The significant terms of a query, compiled once for scoring many chunks.
///
/// Each term is matched as a literal, case-insensitive substring: `cat` also
/// counts inside `concatenate`, and regex metacharacters such as `c++` or
/// `(a)` match themselves.
#[derive(Debug, Clone, Default)]
pub struct QueryTerms {
    terms: Vec<Regex>,
}

impl QueryTerms {
    /// Lower-cases, trims and splits `query` on whitespace, keeping only terms
    /// of at least [`MIN_TERM_CHARS`] characters. Repeated terms are kept and
    /// each repetition scores again.
    pub fn parse(query: &str) -> Self {
        let terms = query
            .to_lowercase()
            .split_whitespace()
            .filter(|term| term.chars().count() >= MIN_TERM_CHARS)
            .filter_map(|term| match Regex::new(&regex::escape(term)) {
                Ok(pattern) => Some(pattern),
                Err(error) => {
                    warn!(
                        target: TRACING_TARGET_RETRIEVAL,
                        term,
                        error = %error,
                        "skipping query term that cannot be compiled"
                    );
                    None
                }
            })
            .collect();

        Self { terms }
    }

    /// Returns true if no term can contribute to a score.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Returns the number of significant terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Sums the non-overlapping occurrences of every term in `content`.
    pub fn score(&self, content: &str) -> u32 {
        let content = content.to_lowercase();
        self.terms
            .iter()
            .map(|pattern| pattern.find_iter(&content).count() as u32)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_terms_are_ignored() {
        let terms = QueryTerms::parse("  a I  of  ");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms.score("a I of a"), 1);
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let terms = QueryTerms::parse("CAT");
        assert_eq!(terms.score("Cat concatenate CATALOG"), 3);
    }

    #[test]
    fn occurrences_do_not_overlap() {
        let terms = QueryTerms::parse("aa");
        assert_eq!(terms.score("aaaa"), 2);
        assert_eq!(terms.score("aaa"), 1);
    }

    #[test]
    fn metacharacters_match_literally() {
        let terms = QueryTerms::parse("c++ (x) a.b");
        assert_eq!(terms.score("c++ and (x) but not axb, only a.b"), 3);
        assert_eq!(terms.score("cc and x"), 0);
    }

    #[test]
    fn repeated_terms_score_each_time() {
        let terms = QueryTerms::parse("cat cat");
        assert_eq!(terms.score("the cat"), 2);
    }

    #[test]
    fn empty_query_has_no_terms() {
        assert!(QueryTerms::parse("").is_empty());
        assert!(QueryTerms::parse("   \t ").is_empty());
    }
}
