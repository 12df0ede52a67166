// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Common classification contract shared by every model
//!
//! Implements:
//! - [`NewsClassifier`]: train once, then classify any number of texts
//! - [`ClassificationResult`]: label, confidence, per-class percentages and
//!   the tokens that drove the decision
//! - [`build_classifier`] / [`all_classifiers`]: construction by [`ClassifierKind`]

use crate::corpus::{Label, NewsRecord};
use crate::error::{ClassifierError, Result};
use crate::mlp::{FeedforwardClassifier, MlpConfig};
use crate::naive_bayes::NaiveBayesClassifier;
use crate::preprocess::TextPreprocessor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of influential tokens reported with a detailed classification
pub const TOP_TOKENS: usize = 10;

/// Label plus confidence in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Label,
    pub confidence: f64,
}

/// Per-class scores in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    pub true_percent: f64,
    pub fake_percent: f64,
}

impl ClassProbabilities {
    /// Build from output-slot order `[true, fake]`
    pub fn from_slots(slots: [f64; 2]) -> Self {
        Self {
            true_percent: slots[Label::True.index()],
            fake_percent: slots[Label::Fake.index()],
        }
    }

    pub fn get(&self, label: Label) -> f64 {
        match label {
            Label::True => self.true_percent,
            Label::Fake => self.fake_percent,
        }
    }
}

/// Detailed output of a single inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: Label,
    pub confidence: f64,
    pub probabilities: ClassProbabilities,
    pub top_tokens: Vec<String>,
}

impl ClassificationResult {
    pub fn classification(&self) -> Classification {
        Classification {
            label: self.label,
            confidence: self.confidence,
        }
    }
}

/// Trait for all news classifiers
pub trait NewsClassifier: Send + Sync {
    /// Train on the labeled examples of the given records. Allowed once per instance.
    fn train(&mut self, records: &[NewsRecord]) -> Result<()>;

    /// Classify a single text
    fn classify(&self, text: &str) -> Result<Classification> {
        self.classify_with_detail(text).map(|r| r.classification())
    }

    /// Classify with per-class percentages and influential tokens
    fn classify_with_detail(&self, text: &str) -> Result<ClassificationResult>;

    /// Classify multiple texts
    fn classify_batch(&self, texts: &[&str]) -> Result<Vec<Classification>> {
        texts.iter().map(|t| self.classify(t)).collect()
    }

    fn kind(&self) -> ClassifierKind;

    fn name(&self) -> &str {
        self.kind().name()
    }

    fn description(&self) -> &str;

    fn is_trained(&self) -> bool;
}

/// The available model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassifierKind {
    Mlp,
    #[serde(alias = "nb")]
    NaiveBayes,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 2] = [ClassifierKind::Mlp, ClassifierKind::NaiveBayes];

    pub fn name(self) -> &'static str {
        match self {
            ClassifierKind::Mlp => "MLP",
            ClassifierKind::NaiveBayes => "Naive Bayes",
        }
    }

    /// Short identifier accepted on the command line
    pub fn id(self) -> &'static str {
        match self {
            ClassifierKind::Mlp => "mlp",
            ClassifierKind::NaiveBayes => "nb",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassifierKind {
    type Err = ClassifierError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mlp" | "neural" => Ok(ClassifierKind::Mlp),
            "nb" | "naive-bayes" | "naive_bayes" | "bayes" => Ok(ClassifierKind::NaiveBayes),
            other => Err(ClassifierError::UnknownClassifier(other.to_string())),
        }
    }
}

/// Everything needed to construct any classifier
#[derive(Debug, Clone, Default)]
pub struct ModelSettings {
    pub mlp: MlpConfig,
    pub preprocessor: TextPreprocessor,
}

impl ModelSettings {
    pub fn new(mlp: MlpConfig, preprocessor: TextPreprocessor) -> Self {
        Self { mlp, preprocessor }
    }
}

/// Create an untrained classifier of the given kind
pub fn build_classifier(
    kind: ClassifierKind,
    settings: &ModelSettings,
) -> Result<Box<dyn NewsClassifier>> {
    let classifier: Box<dyn NewsClassifier> = match kind {
        ClassifierKind::Mlp => Box::new(FeedforwardClassifier::new(
            settings.mlp.clone(),
            settings.preprocessor.clone(),
        )?),
        ClassifierKind::NaiveBayes => {
            Box::new(NaiveBayesClassifier::new(settings.preprocessor.clone()))
        }
    };
    Ok(classifier)
}

/// Factory function to create one untrained instance of every model
pub fn all_classifiers(settings: &ModelSettings) -> Result<Vec<Box<dyn NewsClassifier>>> {
    ClassifierKind::ALL
        .iter()
        .map(|&kind| build_classifier(kind, settings))
        .collect()
}
