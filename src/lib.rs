// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Fake/true news classification for Portuguese text
//!
//! This crate provides:
//! - Paired fake/true corpus loading (FakeTrue.Br CSV layout) and a synthetic corpus
//! - Text preprocessing with an explicit stop-word set
//! - A bag-of-words multilayer perceptron and a Laplace-smoothed Naive Bayes model
//!   behind one `NewsClassifier` contract
//! - k-fold cross-validation with micro-averaged Accuracy, Precision, Recall, F1
//! - A text analysis pipeline (single text or batch) with model agreement and reports

pub mod classifier;
pub mod corpus;
pub mod cross_validation;
pub mod error;
pub mod metrics;
pub mod mlp;
pub mod naive_bayes;
pub mod pipeline;
pub mod preprocess;
pub mod vocabulary;

pub use classifier::{
    all_classifiers, build_classifier, ClassProbabilities, Classification, ClassificationResult,
    ClassifierKind, ModelSettings, NewsClassifier,
};
pub use corpus::{Corpus, Label, NewsRecord};
pub use cross_validation::{evaluate, CrossValidationConfig, CrossValidationReport, CrossValidator};
pub use error::ClassifierError;
pub use metrics::{ConfusionMatrix, Metrics};
pub use mlp::{FeedforwardClassifier, MlpConfig};
pub use naive_bayes::NaiveBayesClassifier;
pub use pipeline::{
    AnalysisOutcome, AnalysisPipeline, AnalysisResults, BatchResults, BatchSummary, PipelineConfig,
};
pub use preprocess::{StopWords, TextPreprocessor};
pub use vocabulary::{TokenSet, Vocabulary};
