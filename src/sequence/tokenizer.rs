//! Copyright © 2025-2026 The Moyun Team. All Rights Reserved.
//!
//! This file is part of Dao.
//! The Dao project belongs to the Moyun Team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Dao Tokenizer Module
//!
//! Word-level tokenization with a corpus-fitted vocabulary. The tokenizer is
//! fit on a text corpus, ranks tokens by descending frequency (ties broken
//! by first-seen order), and assigns integer indices starting at 1. Index 0
//! is reserved as the "no token" placeholder and is never emitted.
//!
//! ## Vocabulary Construction
//!
//! Fitting is two-phase: [`DaoTokenizer::fit_on_text`] tallies token
//! frequencies for one text (incrementing the document count), and
//! [`DaoTokenizer::finish_fit`] recomputes the index tables from the
//! accumulated totals. [`DaoTokenizer::fit_on_texts`] combines both.
//! Repeated fit calls accumulate counts and re-rank; indices are
//! deterministic only as a function of the complete accumulated counts at
//! the time they are computed, never stable across partial fits.
//!
//! When an OOV (out-of-vocabulary) token is configured it is inserted into
//! the counts with count 1 before ranking and always receives index 1;
//! unknown or out-of-window tokens encode to it. Without an OOV token they
//! are dropped silently.
//!
//! ## Encoding Window
//!
//! `num_words` is a soft cap consulted only when encoding/decoding: a token
//! participates only while its index is strictly below the cap. Fitting
//! ignores the cap entirely.
//!
//! ## Persistence
//!
//! [`DaoTokenizer::save`] serializes exactly the vocabulary state (document
//! count, word counts, both index tables) as an opaque serde_json blob.
//! Filters, the split character, and the analyzer callback are not
//! persisted; callers must reconstruct a tokenizer with a matching
//! configuration before calling [`DaoTokenizer::load`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::{DaoError, Result};

/// Default filter characters removed during tokenization (punctuation plus
/// tab and newline). The split character handles spaces.
pub const DEFAULT_FILTERS: &str = "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n";

/// Pluggable analyzer callback replacing the built-in normalizer.
pub type DaoAnalyzer = Box<dyn Fn(&str) -> Vec<String> + Send + Sync>;

/// Tokenizer configuration.
///
/// Every option, its default, and its effect:
/// - `num_words` (None): soft vocabulary cap applied when encoding, never
///   when fitting; a known token is emitted only if its index < cap.
/// - `filters` ([`DEFAULT_FILTERS`]): characters treated as token
///   boundaries and discarded.
/// - `specials` (None): characters isolated as their own single-character
///   token instead of being discarded.
/// - `lower` (true): lowercase texts before splitting.
/// - `split` (`' '`): the token delimiter, also used to re-join tokens in
///   [`DaoTokenizer::sequences_to_texts`].
/// - `oov_token` (None): placeholder receiving index 1 and count 1;
///   substituted for unknown/out-of-window tokens when set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaoTokenizerConfig {
    pub num_words: Option<usize>,
    pub filters: String,
    pub specials: Option<String>,
    pub lower: bool,
    pub split: char,
    pub oov_token: Option<String>,
}

impl Default for DaoTokenizerConfig {
    fn default() -> Self {
        Self {
            num_words: None,
            filters: DEFAULT_FILTERS.to_string(),
            specials: None,
            lower: true,
            split: ' ',
            oov_token: None,
        }
    }
}

/// Serialized vocabulary state exchanged by save/load.
///
/// `word_counts` keeps first-seen order so re-fitting after a load ranks
/// ties identically.
#[derive(Debug, Serialize, Deserialize)]
struct DaoVocabularyState {
    document_count: usize,
    word_counts: Vec<(String, u64)>,
    word_to_index: HashMap<String, i32>,
    index_to_word: Vec<String>,
}

/// Word↔index vocabulary builder and text/sequence converter.
pub struct DaoTokenizer {
    config: DaoTokenizerConfig,
    analyzer: Option<DaoAnalyzer>,
    document_count: usize,
    /// Accumulated token tallies in first-seen order.
    word_counts: Vec<(String, u64)>,
    /// token -> position in `word_counts`.
    count_lookup: HashMap<String, usize>,
    word_to_index: HashMap<String, i32>,
    /// Position i holds the word assigned index i + 1.
    index_to_word: Vec<String>,
}

impl Default for DaoTokenizer {
    fn default() -> Self {
        Self::new(DaoTokenizerConfig::default())
    }
}

impl DaoTokenizer {
    pub fn new(config: DaoTokenizerConfig) -> Self {
        Self {
            config,
            analyzer: None,
            document_count: 0,
            word_counts: Vec::new(),
            count_lookup: HashMap::new(),
            word_to_index: HashMap::new(),
            index_to_word: Vec::new(),
        }
    }

    /// Replaces the built-in normalizer with a custom analyzer callback.
    pub fn with_analyzer(mut self, analyzer: DaoAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn config(&self) -> &DaoTokenizerConfig {
        &self.config
    }

    /// Number of texts consumed by fitting so far.
    pub fn document_count(&self) -> usize {
        self.document_count
    }

    /// Whether any corpus has been tallied yet.
    pub fn is_fitted(&self) -> bool {
        !self.word_counts.is_empty()
    }

    /// Tallies one text into the accumulated counts without re-ranking.
    ///
    /// An empty text still increments the document count. Call
    /// [`DaoTokenizer::finish_fit`] once the corpus pass is complete.
    pub fn fit_on_text(&mut self, text: &str) {
        self.document_count += 1;
        for token in self.analyze(text) {
            let token = canonical_token(token);
            match self.count_lookup.get(&token) {
                Some(&pos) => self.word_counts[pos].1 += 1,
                None => {
                    self.count_lookup.insert(token.clone(), self.word_counts.len());
                    self.word_counts.push((token, 1));
                }
            }
        }
    }

    /// Recomputes the index tables from the accumulated counts.
    ///
    /// The OOV token, when configured, is forced to count 1 and pinned to
    /// index 1; every other token is ranked by descending count with ties
    /// kept in first-seen order and assigned indices upward from there.
    pub fn finish_fit(&mut self) {
        if let Some(oov) = self.config.oov_token.clone() {
            match self.count_lookup.get(&oov) {
                Some(&pos) => self.word_counts[pos].1 = 1,
                None => {
                    self.count_lookup.insert(oov.clone(), self.word_counts.len());
                    self.word_counts.push((oov, 1));
                }
            }
        }

        let oov = self.config.oov_token.as_deref();
        let mut ranked: Vec<(String, u64)> = self
            .word_counts
            .iter()
            .filter(|(word, _)| Some(word.as_str()) != oov)
            .cloned()
            .collect();
        // Stable sort: equal counts keep first-seen order.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));

        self.index_to_word.clear();
        self.word_to_index.clear();
        if let Some(oov) = oov {
            self.index_to_word.push(oov.to_string());
        }
        self.index_to_word.extend(ranked.into_iter().map(|(word, _)| word));
        for (i, word) in self.index_to_word.iter().enumerate() {
            self.word_to_index.insert(word.clone(), (i + 1) as i32);
        }
    }

    /// Fits the vocabulary on a corpus: tallies every text, then ranks.
    pub fn fit_on_texts<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for text in texts {
            self.fit_on_text(text.as_ref());
        }
        self.finish_fit();
    }

    /// Encodes one text to its index sequence under the current vocabulary.
    pub fn text_to_sequence(&self, text: &str) -> Vec<i32> {
        let cap = self.config.num_words;
        let oov_index = self
            .config
            .oov_token
            .as_ref()
            .and_then(|oov| self.word_to_index.get(oov).copied());
        let mut sequence = Vec::new();
        for token in self.analyze(text) {
            let token = canonical_token(token);
            match self.word_to_index.get(&token) {
                Some(&index) if cap.map_or(true, |c| (index as usize) < c) => {
                    sequence.push(index);
                }
                _ => {
                    if let Some(index) = oov_index {
                        sequence.push(index);
                    }
                }
            }
        }
        sequence
    }

    /// Lazily encodes each text; re-calling restarts the sequence.
    pub fn texts_to_sequences<'a, S>(
        &'a self,
        texts: &'a [S],
    ) -> impl Iterator<Item = Vec<i32>> + 'a
    where
        S: AsRef<str>,
    {
        texts.iter().map(move |text| self.text_to_sequence(text.as_ref()))
    }

    /// Decodes one index sequence back to text, re-joined with the split
    /// character. Unknown or out-of-window indices map to the OOV token or
    /// are dropped.
    pub fn sequence_to_text(&self, sequence: &[i32]) -> String {
        let cap = self.config.num_words;
        let mut words: Vec<&str> = Vec::with_capacity(sequence.len());
        for &index in sequence {
            let known = index >= 1
                && (index as usize) <= self.index_to_word.len()
                && cap.map_or(true, |c| (index as usize) < c);
            if known {
                words.push(&self.index_to_word[(index - 1) as usize]);
            } else if let Some(oov) = &self.config.oov_token {
                words.push(oov);
            }
        }
        words.join(&self.config.split.to_string())
    }

    /// Lazily decodes each sequence; re-calling restarts the sequence.
    pub fn sequences_to_texts<'a>(
        &'a self,
        sequences: &'a [Vec<i32>],
    ) -> impl Iterator<Item = String> + 'a {
        sequences.iter().map(move |seq| self.sequence_to_text(seq))
    }

    /// Active vocabulary size, counting the reserved index 0.
    ///
    /// Returns `count(index_to_word) + 1` when `internal` is set or no cap
    /// is configured, otherwise the minimum of that and the cap.
    pub fn num_words(&self, internal: bool) -> usize {
        let total = self.index_to_word.len() + 1;
        if internal {
            return total;
        }
        match self.config.num_words {
            Some(cap) => total.min(cap),
            None => total,
        }
    }

    /// Index assigned to `word`, failing when the word was never ranked.
    pub fn word_to_index(&self, word: &str) -> Result<i32> {
        self.word_to_index
            .get(word)
            .copied()
            .ok_or_else(|| DaoError::not_found(format!("word '{word}' is not in the vocabulary")))
    }

    /// Word assigned to `index`, failing when the index was never assigned.
    pub fn index_to_word(&self, index: i32) -> Result<&str> {
        if index >= 1 && (index as usize) <= self.index_to_word.len() {
            Ok(&self.index_to_word[(index - 1) as usize])
        } else {
            Err(DaoError::not_found(format!(
                "index {index} is not in the vocabulary"
            )))
        }
    }

    /// Serializes the vocabulary state to an opaque blob.
    pub fn save(&self) -> Result<Vec<u8>> {
        let state = DaoVocabularyState {
            document_count: self.document_count,
            word_counts: self.word_counts.clone(),
            word_to_index: self.word_to_index.clone(),
            index_to_word: self.index_to_word.clone(),
        };
        Ok(serde_json::to_vec(&state)?)
    }

    /// Restores vocabulary state from a blob produced by [`Self::save`].
    pub fn load(&mut self, blob: &[u8]) -> Result<()> {
        let state: DaoVocabularyState = serde_json::from_slice(blob)?;
        self.document_count = state.document_count;
        self.count_lookup = state
            .word_counts
            .iter()
            .enumerate()
            .map(|(pos, (word, _))| (word.clone(), pos))
            .collect();
        self.word_counts = state.word_counts;
        self.word_to_index = state.word_to_index;
        self.index_to_word = state.index_to_word;
        Ok(())
    }

    /// Splits one text into tokens via the analyzer callback or the
    /// built-in normalizer.
    fn analyze(&self, text: &str) -> Vec<String> {
        match &self.analyzer {
            Some(analyzer) => analyzer(text),
            None => self.split_text(text),
        }
    }

    /// Built-in normalizer: optional lowercasing, filter characters and the
    /// split character act as token boundaries, specials are isolated as
    /// their own tokens.
    fn split_text(&self, text: &str) -> Vec<String> {
        let lowered;
        let text = if self.config.lower {
            lowered = text.to_lowercase();
            lowered.as_str()
        } else {
            text
        };
        let specials = self.config.specials.as_deref().unwrap_or("");
        let mut tokens = Vec::new();
        let mut current = String::new();
        for ch in text.chars() {
            if specials.contains(ch) {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(ch.to_string());
            } else if ch == self.config.split || self.config.filters.contains(ch) {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            } else {
                current.push(ch);
            }
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        tokens
    }
}

/// Collapses integer-valued tokens onto their canonical decimal form so
/// that "007" and "7" count as the same key.
fn canonical_token(token: String) -> String {
    match token.parse::<i64>() {
        Ok(n) => n.to_string(),
        Err(_) => token,
    }
}
