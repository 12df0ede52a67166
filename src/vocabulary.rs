// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Vocabularies built from the training split
//!
//! - [`Vocabulary`]: frequency-ranked, capped token→index map (MLP input slots)
//! - [`TokenSet`]: every observed token, used for membership and size (Naive Bayes)

use crate::corpus::NewsRecord;
use crate::preprocess::TextPreprocessor;
use std::collections::{HashMap, HashSet};

/// Preprocessed tokens of every non-blank text in the records, in corpus order
fn corpus_tokens<'a>(
    records: &'a [NewsRecord],
    preprocessor: &'a TextPreprocessor,
) -> impl Iterator<Item = String> + 'a {
    records
        .iter()
        .flat_map(NewsRecord::examples)
        .flat_map(move |example| preprocessor.preprocess(example.text))
}

/// Token→index map capped to the most frequent tokens
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    index: HashMap<String, usize>,
    tokens: Vec<String>,
}

impl Vocabulary {
    /// Keep the `cap` most frequent tokens. Ties keep first-seen order.
    pub fn ranked(records: &[NewsRecord], preprocessor: &TextPreprocessor, cap: usize) -> Self {
        let mut position: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<(String, usize)> = Vec::new();

        for token in corpus_tokens(records, preprocessor) {
            match position.get(&token) {
                Some(&pos) => counts[pos].1 += 1,
                None => {
                    position.insert(token.clone(), counts.len());
                    counts.push((token, 1));
                }
            }
        }

        // Stable sort: equal counts stay in discovery order
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(cap);

        let tokens: Vec<String> = counts.into_iter().map(|(token, _)| token).collect();
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| (token.clone(), i))
            .collect();

        Self { index, tokens }
    }

    pub fn get(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Tokens ordered by index
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Unbounded set of every token observed in training
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    tokens: HashSet<String>,
}

impl TokenSet {
    pub fn from_records(records: &[NewsRecord], preprocessor: &TextPreprocessor) -> Self {
        Self {
            tokens: corpus_tokens(records, preprocessor).collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
