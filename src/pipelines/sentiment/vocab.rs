use std::collections::HashMap;

use crate::error::{PipelineError, Result};

/// Reserved index for padding filler.
pub const PAD: u32 = 0;
/// Reserved index for unknown (out-of-vocabulary) tokens.
pub const UNK: u32 = 1;

pub(crate) const PAD_TOKEN: &str = "<PAD>";
pub(crate) const UNK_TOKEN: &str = "<UNK>";

/// Deterministic word→index table built from a training corpus.
///
/// Indices `0` and `1` are reserved for [`PAD`] and [`UNK`]; corpus-derived
/// words occupy `2..`. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Vocabulary {
    index: HashMap<String, u32>,
    // words[i] holds the word assigned index i + 2, in selection order.
    words: Vec<String>,
}

impl Vocabulary {
    /// Builds a vocabulary from `corpus`, keeping at most `vocab_size` entries
    /// including the two reserved slots.
    ///
    /// Tokens are counted across the whole corpus in order of first
    /// occurrence; selection takes the most frequent tokens, with ties going
    /// to the token seen earlier. Identical corpus and size always produce an
    /// identical mapping.
    pub fn build<I, S>(corpus: I, vocab_size: usize) -> Vocabulary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: Vec<(String, u64)> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();

        for text in corpus {
            for token in normalize(text.as_ref()) {
                match slots.get(&token) {
                    Some(&slot) => counts[slot].1 += 1,
                    None => {
                        slots.insert(token.clone(), counts.len());
                        counts.push((token, 1));
                    }
                }
            }
        }

        // Stable sort keeps first-occurrence order among equal counts.
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(vocab_size.saturating_sub(2));

        let words: Vec<String> = counts.into_iter().map(|(word, _)| word).collect();
        let index = words
            .iter()
            .enumerate()
            .map(|(i, word)| (word.clone(), i as u32 + 2))
            .collect();

        Vocabulary { index, words }
    }

    /// Looks up the index assigned to `word`, if any.
    pub fn lookup(&self, word: &str) -> Option<u32> {
        self.index.get(word).copied()
    }

    /// Number of entries including the reserved PAD and UNK slots.
    pub fn len(&self) -> usize {
        self.words.len() + 2
    }

    /// Whether the vocabulary holds no entries. Always `false`: the reserved
    /// PAD and UNK slots are built in and counted by [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ordered `(word, index)` pairs, reserved entries first.
    pub fn to_pairs(&self) -> Vec<(String, u32)> {
        let mut pairs = Vec::with_capacity(self.len());
        pairs.push((PAD_TOKEN.to_string(), PAD));
        pairs.push((UNK_TOKEN.to_string(), UNK));
        pairs.extend(
            self.words
                .iter()
                .enumerate()
                .map(|(i, word)| (word.clone(), i as u32 + 2)),
        );
        pairs
    }

    /// Rebuilds a vocabulary from persisted pairs, validating that the
    /// reserved slots come first and indices are contiguous.
    pub fn from_pairs(pairs: &[(String, u32)]) -> Result<Vocabulary> {
        let reserved_ok = matches!(pairs.first(), Some((w, i)) if w == PAD_TOKEN && *i == PAD)
            && matches!(pairs.get(1), Some((w, i)) if w == UNK_TOKEN && *i == UNK);
        if !reserved_ok {
            return Err(PipelineError::Persistence(
                "vocabulary pairs do not start with the reserved PAD/UNK entries".into(),
            ));
        }

        let mut index = HashMap::with_capacity(pairs.len());
        let mut words = Vec::with_capacity(pairs.len() - 2);
        for (slot, (word, idx)) in pairs.iter().enumerate().skip(2) {
            if *idx != slot as u32 {
                return Err(PipelineError::Persistence(format!(
                    "vocabulary index {idx} does not match its position {slot}"
                )));
            }
            if index.insert(word.clone(), *idx).is_some() {
                return Err(PipelineError::Persistence(format!(
                    "duplicate vocabulary word '{word}'"
                )));
            }
            words.push(word.clone());
        }

        Ok(Vocabulary { index, words })
    }
}

/// Shared normalization: lowercase, keep only `[a-z]` and whitespace, split
/// on whitespace runs, drop tokens of length ≤ 1.
pub(crate) fn normalize(text: &str) -> Vec<String> {
    let mut cleaned = String::with_capacity(text.len());
    for ch in text.chars() {
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_lowercase() || ch.is_whitespace() {
            cleaned.push(ch);
        }
    }
    cleaned
        .split_whitespace()
        .filter(|token| token.len() > 1)
        .map(str::to_string)
        .collect()
}
