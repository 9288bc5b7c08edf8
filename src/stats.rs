//! Word and sentence statistics for a draft.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::state_machine::LengthBand;

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w+\b").unwrap());
static TERM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{3,15}\b").unwrap());
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());
static PARAGRAPH_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

const STOPWORDS: &[&str] = &[
    "and", "the", "to", "of", "in", "a", "is", "that", "it", "with", "as", "for", "was", "on",
    "are", "be", "this", "by", "an", "not", "or", "at", "from", "but", "what", "all", "were",
    "when", "we", "there", "can", "no", "have", "has", "had", "they", "you", "he", "she",
    "which", "their", "would", "could", "how", "if", "will",
];

pub const DEFAULT_TOP_TERMS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStats {
    pub words: usize,
    pub unique_words: usize,
    pub sentences: usize,
    pub avg_sentence_words: f64,
    /// Unique words over total words, 0.0 for empty text.
    pub vocabulary_richness: f64,
    /// Most frequent content words, case-folded, highest count first.
    pub top_terms: Vec<(String, usize)>,
}

/// Where a word count falls relative to a [`LengthBand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LengthFit {
    Under { missing: usize },
    Within,
    Over { excess: usize },
}

pub fn analyze(text: &str, top_n: usize) -> TextStats {
    let words: Vec<String> = WORD
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    let unique_words = words.iter().collect::<HashSet<_>>().len();
    let sentences = SENTENCE_END
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .count();

    let (avg_sentence_words, vocabulary_richness) = if words.is_empty() {
        (0.0, 0.0)
    } else {
        (
            words.len() as f64 / sentences.max(1) as f64,
            unique_words as f64 / words.len() as f64,
        )
    };

    TextStats {
        words: words.len(),
        unique_words,
        sentences,
        avg_sentence_words,
        vocabulary_richness,
        top_terms: top_terms(text, top_n),
    }
}

fn top_terms(text: &str, n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for m in TERM.find_iter(text) {
        let term = m.as_str().to_lowercase();
        if !STOPWORDS.contains(&term.as_str()) {
            *counts.entry(term).or_default() += 1;
        }
    }

    let mut terms: Vec<(String, usize)> = counts.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    terms.truncate(n);
    terms
}

pub fn length_fit(words: usize, band: LengthBand) -> LengthFit {
    let (min, max) = band.range();
    if band.contains(words) {
        LengthFit::Within
    } else if words < min {
        LengthFit::Under {
            missing: min - words,
        }
    } else {
        LengthFit::Over {
            excess: words - max,
        }
    }
}

/// 1-based positions of the paragraphs in `new` that `old` does not contain.
///
/// Paragraphs are blank-line separated and compared after trimming, so a
/// moved paragraph counts as unchanged.
pub fn changed_paragraphs(old: &str, new: &str) -> Vec<usize> {
    let before: HashSet<&str> = paragraphs(old).collect();
    paragraphs(new)
        .enumerate()
        .filter(|(_, p)| !before.contains(p))
        .map(|(i, _)| i + 1)
        .collect()
}

fn paragraphs(text: &str) -> impl Iterator<Item = &str> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
}
