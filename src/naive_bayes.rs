// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Multinomial Naive Bayes with Laplace smoothing
//!
//! Scores are `ln(docs_c) + Σ ln((count_c(t) + α) / (docs_c + α·|V|))` over every
//! token occurrence. Priors use raw document counts, which only matters for the
//! relative comparison between the two classes.

use crate::classifier::{
    ClassProbabilities, ClassificationResult, ClassifierKind, NewsClassifier, TOP_TOKENS,
};
use crate::corpus::{ensure_trainable, Label, NewsRecord};
use crate::error::{ClassifierError, Result};
use crate::preprocess::TextPreprocessor;
use crate::vocabulary::TokenSet;
use std::collections::{HashMap, HashSet};

/// Laplace smoothing constant
pub const ALPHA: f64 = 1.0;

#[derive(Debug, Clone, Default)]
struct ClassStats {
    documents: usize,
    token_counts: HashMap<String, usize>,
}

impl ClassStats {
    fn log_likelihood(&self, token: &str, vocabulary_size: usize) -> f64 {
        let count = self.token_counts.get(token).copied().unwrap_or(0) as f64;
        let denominator = self.documents as f64 + ALPHA * vocabulary_size as f64;
        ((count + ALPHA) / denominator).ln()
    }
}

/// Per-class word and document counts over the full training vocabulary
#[derive(Debug, Clone, Default)]
pub struct NaiveBayesClassifier {
    preprocessor: TextPreprocessor,
    /// Indexed by `Label::index()`
    classes: [ClassStats; 2],
    vocabulary: TokenSet,
    trained: bool,
}

impl NaiveBayesClassifier {
    pub fn new(preprocessor: TextPreprocessor) -> Self {
        Self {
            preprocessor,
            ..Default::default()
        }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Number of training texts seen for a class
    pub fn document_count(&self, label: Label) -> usize {
        self.classes[label.index()].documents
    }

    fn stats(&self, label: Label) -> &ClassStats {
        &self.classes[label.index()]
    }

    fn ensure_trained(&self) -> Result<()> {
        if self.trained {
            Ok(())
        } else {
            Err(ClassifierError::NotTrained)
        }
    }

    /// Log-probability of each class in slot order `[true, fake]`
    fn log_probabilities(&self, tokens: &[String]) -> [f64; 2] {
        let vocabulary_size = self.vocabulary.len();
        Label::ALL.map(|label| {
            let stats = self.stats(label);
            let prior = (stats.documents as f64).ln();
            prior
                + tokens
                    .iter()
                    .map(|t| stats.log_likelihood(t, vocabulary_size))
                    .sum::<f64>()
        })
    }

    /// Signed contribution `ln P(t|fake) - ln P(t|true)` of one token.
    /// Positive values push towards fake.
    fn contribution(&self, token: &str) -> f64 {
        let vocabulary_size = self.vocabulary.len();
        self.stats(Label::Fake).log_likelihood(token, vocabulary_size)
            - self.stats(Label::True).log_likelihood(token, vocabulary_size)
    }

    /// Contribution of each distinct token of `text`, in first-occurrence order
    pub fn token_contributions(&self, text: &str) -> Result<Vec<(String, f64)>> {
        self.ensure_trained()?;

        let mut seen = HashSet::new();
        Ok(self
            .preprocessor
            .preprocess(text)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .map(|t| {
                let contribution = self.contribution(&t);
                (t, contribution)
            })
            .collect())
    }
}

impl NewsClassifier for NaiveBayesClassifier {
    fn train(&mut self, records: &[NewsRecord]) -> Result<()> {
        if self.trained {
            return Err(ClassifierError::AlreadyTrained);
        }
        ensure_trainable(records)?;

        self.vocabulary = TokenSet::from_records(records, &self.preprocessor);

        for example in records.iter().flat_map(NewsRecord::examples) {
            let stats = &mut self.classes[example.label.index()];
            stats.documents += 1;
            for token in self.preprocessor.preprocess(example.text) {
                *stats.token_counts.entry(token).or_insert(0) += 1;
            }
        }

        self.trained = true;
        tracing::info!(
            "Naive Bayes trained: {} true / {} fake documents, {} vocabulary tokens",
            self.document_count(Label::True),
            self.document_count(Label::Fake),
            self.vocabulary.len()
        );
        Ok(())
    }

    fn classify_with_detail(&self, text: &str) -> Result<ClassificationResult> {
        self.ensure_trained()?;

        let tokens = self.preprocessor.preprocess(text);
        let log_probs = self.log_probabilities(&tokens);

        // Ties go to fake
        let label = if log_probs[Label::True.index()] > log_probs[Label::Fake.index()] {
            Label::True
        } else {
            Label::Fake
        };

        let winner = log_probs[label.index()];
        let loser = log_probs[label.other().index()];
        let confidence = 100.0 / (1.0 + (loser - winner).exp());

        let mut slots = [0.0; 2];
        slots[label.index()] = confidence;
        slots[label.other().index()] = 100.0 - confidence;

        // One entry per occurrence, so repeated tokens rank repeatedly
        let mut contributions: Vec<(String, f64)> = tokens
            .into_iter()
            .map(|t| {
                let contribution = self.contribution(&t);
                (t, contribution)
            })
            .collect();
        contributions.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

        Ok(ClassificationResult {
            label,
            confidence,
            probabilities: ClassProbabilities::from_slots(slots),
            top_tokens: contributions
                .into_iter()
                .take(TOP_TOKENS)
                .map(|(token, _)| token)
                .collect(),
        })
    }

    fn kind(&self) -> ClassifierKind {
        ClassifierKind::NaiveBayes
    }

    fn description(&self) -> &str {
        "Laplace-smoothed multinomial Naive Bayes over the full training vocabulary"
    }

    fn is_trained(&self) -> bool {
        self.trained
    }
}
