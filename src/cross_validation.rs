// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! k-fold cross-validation with micro-averaged metrics
//!
//! Record `i` is held out in fold `i mod k`. Each fold trains a fresh model on
//! the other folds and classifies every example of its held-out records.
//! Counts are summed across folds before metrics are computed.

use crate::classifier::{build_classifier, ClassifierKind, ModelSettings};
use crate::corpus::NewsRecord;
use crate::error::{ClassifierError, Result};
use crate::metrics::{ConfusionMatrix, Metrics};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One train/test partition
#[derive(Debug, Clone)]
pub struct Fold {
    pub index: usize,
    pub train: Vec<NewsRecord>,
    pub test: Vec<NewsRecord>,
}

/// Partition records into `k` folds by position
pub fn create_folds(records: &[NewsRecord], k: usize) -> Result<Vec<Fold>> {
    if k < 2 || k > records.len() {
        return Err(ClassifierError::InvalidFoldCount {
            folds: k,
            records: records.len(),
        });
    }

    let mut buckets: Vec<Vec<NewsRecord>> = vec![Vec::new(); k];
    for (i, record) in records.iter().enumerate() {
        buckets[i % k].push(record.clone());
    }

    let folds = (0..k)
        .map(|index| Fold {
            index,
            train: buckets
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != index)
                .flat_map(|(_, bucket)| bucket.iter().cloned())
                .collect(),
            test: buckets[index].clone(),
        })
        .collect();

    Ok(folds)
}

/// Cross-validation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossValidationConfig {
    pub folds: usize,
    /// MLP epochs per fold, usually lower than for the final model
    pub mlp_epochs: usize,
    /// Evaluate folds on the rayon pool
    pub parallel: bool,
}

impl Default for CrossValidationConfig {
    fn default() -> Self {
        Self {
            folds: 5,
            mlp_epochs: 10,
            parallel: false,
        }
    }
}

/// Outcome of a single fold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldResult {
    pub index: usize,
    pub train_examples: usize,
    pub test_examples: usize,
    pub confusion: ConfusionMatrix,
}

/// Aggregated outcome over all folds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossValidationReport {
    pub kind: ClassifierKind,
    pub folds: Vec<FoldResult>,
    pub confusion: ConfusionMatrix,
    pub metrics: Metrics,
}

impl CrossValidationReport {
    /// Format as a human-readable string
    pub fn format(&self) -> String {
        let mut output = format!(
            "{} ({}-fold cross-validation)\n",
            self.kind.name(),
            self.folds.len()
        );
        for fold in &self.folds {
            output.push_str(&format!(
                "  Fold {}: train={} test={} correct={}\n",
                fold.index + 1,
                fold.train_examples,
                fold.test_examples,
                fold.confusion.tp + fold.confusion.tn
            ));
        }
        output.push('\n');
        output.push_str(&self.metrics.format());
        output.push('\n');
        output.push_str(&self.confusion.format());
        output
    }
}

/// Runs k-fold evaluation for any classifier kind
#[derive(Debug, Clone, Default)]
pub struct CrossValidator {
    config: CrossValidationConfig,
    settings: ModelSettings,
}

impl CrossValidator {
    /// `settings.mlp.epochs` is replaced by `config.mlp_epochs` for every fold
    pub fn new(config: CrossValidationConfig, settings: ModelSettings) -> Self {
        let mlp = settings.mlp.clone().with_epochs(config.mlp_epochs);
        Self {
            config,
            settings: ModelSettings { mlp, ..settings },
        }
    }

    pub fn config(&self) -> &CrossValidationConfig {
        &self.config
    }

    pub fn evaluate(
        &self,
        records: &[NewsRecord],
        kind: ClassifierKind,
    ) -> Result<CrossValidationReport> {
        let folds = create_folds(records, self.config.folds)?;

        tracing::info!(
            "Cross-validating {} with {} folds over {} records",
            kind.name(),
            folds.len(),
            records.len()
        );

        let results: Vec<FoldResult> = if self.config.parallel {
            folds
                .par_iter()
                .map(|fold| self.evaluate_fold(fold, kind))
                .collect::<Result<_>>()?
        } else {
            folds
                .iter()
                .map(|fold| self.evaluate_fold(fold, kind))
                .collect::<Result<_>>()?
        };

        let mut confusion = ConfusionMatrix::default();
        for result in &results {
            confusion += result.confusion;
        }
        let metrics = Metrics::from_confusion_matrix(&confusion);

        tracing::info!(
            "{}: accuracy={:.4} precision={:.4} recall={:.4} f1={:.4}",
            kind.name(),
            metrics.accuracy,
            metrics.precision,
            metrics.recall,
            metrics.f1_score
        );

        Ok(CrossValidationReport {
            kind,
            folds: results,
            confusion,
            metrics,
        })
    }

    fn evaluate_fold(&self, fold: &Fold, kind: ClassifierKind) -> Result<FoldResult> {
        let mut classifier = build_classifier(kind, &self.settings)?;
        classifier.train(&fold.train)?;

        let mut confusion = ConfusionMatrix::default();
        for example in fold.test.iter().flat_map(NewsRecord::examples) {
            let prediction = classifier.classify(example.text)?;
            confusion.record(prediction.label, example.label);
        }

        let result = FoldResult {
            index: fold.index,
            train_examples: fold.train.iter().map(|r| r.examples().count()).sum(),
            test_examples: confusion.total(),
            confusion,
        };

        tracing::debug!(
            "Fold {}: {} train / {} test examples, tp={} fp={} tn={} fn={}",
            fold.index,
            result.train_examples,
            result.test_examples,
            confusion.tp,
            confusion.fp,
            confusion.tn,
            confusion.fn_
        );

        Ok(result)
    }
}

/// k-fold metrics for one classifier kind with default model settings
pub fn evaluate(records: &[NewsRecord], kind: ClassifierKind, folds: usize) -> Result<Metrics> {
    let config = CrossValidationConfig {
        folds,
        ..CrossValidationConfig::default()
    };
    CrossValidator::new(config, ModelSettings::default())
        .evaluate(records, kind)
        .map(|report| report.metrics)
}
