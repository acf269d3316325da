//! Full-text queries over course titles.
//!
//! The query syntax follows the usual document-store text search:
//!
//! * bare words are alternatives: a title matches if it contains any of them;
//! * `"quoted phrases"` are mandatory and matched as a whole;
//! * `-word` excludes every title containing `word`.
//!
//! Matching is case-insensitive and works on terms made of letters and digits.
//!
//! ```
//! use coursemart::TextQuery;
//!
//! let query = TextQuery::parse("rust async -beginner");
//! assert!(query.score("Async Rust in depth").is_some());
//! assert!(query.score("Rust for the beginner").is_none());
//! ```
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::{self, Display, Formatter};

lazy_static! {
    static ref TERM: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();
    static ref TOKEN: Regex = Regex::new(r#""([^"]*)"?|(\S+)"#).unwrap();
}

fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    TERM.find_iter(text).map(|m| m.as_str().to_lowercase())
}

/// A parsed text search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextQuery {
    raw: String,
    terms: Vec<String>,
    phrases: Vec<String>,
    excluded: Vec<String>,
}

impl TextQuery {
    pub fn parse(input: &str) -> Self {
        let mut query = TextQuery {
            raw: input.to_string(),
            ..Default::default()
        };
        for token in TOKEN.captures_iter(input) {
            if let Some(phrase) = token.get(1) {
                let phrase: Vec<String> = terms(phrase.as_str()).collect();
                if !phrase.is_empty() {
                    query.phrases.push(phrase.join(" "));
                }
            } else if let Some(word) = token.get(2) {
                let word = word.as_str();
                match word.strip_prefix('-') {
                    Some(negated) if !negated.is_empty() => query.excluded.extend(terms(negated)),
                    _ => query.terms.extend(terms(word)),
                }
            }
        }
        query.terms.sort();
        query.terms.dedup();
        query
    }

    /// The query as the caller wrote it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Bare words, lowercased and deduplicated. A title matches if it has any.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Quoted phrases, normalized to space-separated lowercase terms. All are required.
    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    /// Negated terms. A title containing any of them never matches.
    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// True when the query can never match.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.phrases.is_empty()
    }

    /// Relevance of `text` for this query, `None` when it does not match.
    ///
    /// The score counts matched term occurrences and phrases, weighted down by
    /// the length of the text so that shorter titles rank first.
    pub fn score(&self, text: &str) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let words: Vec<String> = terms(text).collect();
        if words.is_empty() {
            return None;
        }
        if words.iter().any(|word| self.excluded.contains(word)) {
            return None;
        }

        let normalized = format!(" {} ", words.join(" "));
        let mut hits = 0usize;
        for phrase in &self.phrases {
            if !normalized.contains(&format!(" {phrase} ")) {
                return None;
            }
            hits += 1;
        }

        let term_hits = words
            .iter()
            .filter(|word| self.terms.contains(word))
            .count();
        if !self.terms.is_empty() && term_hits == 0 && self.phrases.is_empty() {
            return None;
        }
        hits += term_hits;
        if hits == 0 {
            return None;
        }

        let coefficient = 0.5 + 0.5 / words.len() as f64;
        Some(hits as f64 * coefficient)
    }
}

impl Display for TextQuery {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for TextQuery {
    fn from(value: &str) -> Self {
        TextQuery::parse(value)
    }
}
