// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Evaluation metrics for binary fake/true classification
//!
//! Implements:
//! - Confusion Matrix (positive class = true news)
//! - Accuracy, Precision, Recall, F1-Score
//!
//! Accuracy of an empty matrix is undefined and reported as NaN
//! (`null` once serialized). The other metrics fall back to 0.

use crate::corpus::Label;
use serde::{Deserialize, Deserializer, Serialize};
use std::ops::AddAssign;

/// Confusion matrix for binary classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// True Positives (true news predicted true)
    pub tp: usize,
    /// True Negatives (fake news predicted fake)
    pub tn: usize,
    /// False Positives (fake news predicted true)
    pub fp: usize,
    /// False Negatives (true news predicted fake)
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn new(tp: usize, fp: usize, tn: usize, fn_: usize) -> Self {
        Self { tp, tn, fp, fn_ }
    }

    /// Create from predictions and ground truth labels
    pub fn from_predictions(predictions: &[Label], ground_truth: &[Label]) -> Self {
        assert_eq!(
            predictions.len(),
            ground_truth.len(),
            "Prediction and ground truth lengths must match"
        );

        let mut matrix = Self::default();
        for (pred, truth) in predictions.iter().zip(ground_truth) {
            matrix.record(*pred, *truth);
        }
        matrix
    }

    pub fn record(&mut self, predicted: Label, actual: Label) {
        match (predicted, actual) {
            (Label::True, Label::True) => self.tp += 1,
            (Label::Fake, Label::Fake) => self.tn += 1,
            (Label::True, Label::Fake) => self.fp += 1,
            (Label::Fake, Label::True) => self.fn_ += 1,
        }
    }

    /// Total number of samples
    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }

    /// Accuracy: (TP + TN) / Total, NaN when empty
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return f64::NAN;
        }
        (self.tp + self.tn) as f64 / total as f64
    }

    /// Precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        let denom = self.tp + self.fp;
        if denom == 0 {
            return 0.0;
        }
        self.tp as f64 / denom as f64
    }

    /// Recall (Sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        let denom = self.tp + self.fn_;
        if denom == 0 {
            return 0.0;
        }
        self.tp as f64 / denom as f64
    }

    /// F1 Score: 2 * (Precision * Recall) / (Precision + Recall)
    pub fn f1_score(&self) -> f64 {
        let precision = self.precision();
        let recall = self.recall();
        let denom = precision + recall;
        if denom == 0.0 {
            return 0.0;
        }
        2.0 * precision * recall / denom
    }

    /// Format as a human-readable table
    pub fn format(&self) -> String {
        format!(
            r#"Confusion Matrix:
                  Predicted
                  True      Fake
Actual True      {:>6}    {:>6}
       Fake      {:>6}    {:>6}
"#,
            self.tp, self.fn_, self.fp, self.tn,
        )
    }
}

impl AddAssign for ConfusionMatrix {
    fn add_assign(&mut self, other: Self) {
        self.tp += other.tp;
        self.tn += other.tn;
        self.fp += other.fp;
        self.fn_ += other.fn_;
    }
}

/// The four headline metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// NaN when nothing was evaluated
    #[serde(deserialize_with = "nan_from_null")]
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl Metrics {
    /// Metrics from raw confusion counts
    pub fn calculate(tp: usize, fp: usize, tn: usize, fn_: usize) -> Self {
        Self::from_confusion_matrix(&ConfusionMatrix::new(tp, fp, tn, fn_))
    }

    pub fn from_confusion_matrix(cm: &ConfusionMatrix) -> Self {
        Self {
            accuracy: cm.accuracy(),
            precision: cm.precision(),
            recall: cm.recall(),
            f1_score: cm.f1_score(),
        }
    }

    /// Format as a human-readable string
    pub fn format(&self) -> String {
        format!(
            r#"Accuracy:  {}
Precision: {:.4}
Recall:    {:.4}
F1 Score:  {:.4}
"#,
            format_accuracy(self.accuracy),
            self.precision,
            self.recall,
            self.f1_score,
        )
    }
}

/// Undefined accuracy is written as `null`; read it back as NaN
fn nan_from_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Accuracy as `0.8750 (87.50%)`, or `n/a` when undefined
pub fn format_accuracy(accuracy: f64) -> String {
    if accuracy.is_nan() {
        "n/a".to_string()
    } else {
        format!("{:.4} ({:.2}%)", accuracy, accuracy * 100.0)
    }
}
