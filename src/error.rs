// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Errors reported by the classifiers and the cross-validation harness

use crate::corpus::Label;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ClassifierError {
    /// Training corpus has no usable text for one of the classes
    #[error("insufficient training data: class {label} has 0 examples")]
    InsufficientTrainingData { label: Label },

    #[error("classifier has not been trained")]
    NotTrained,

    /// Classifiers are trained once; retraining needs a new instance
    #[error("classifier has already been trained")]
    AlreadyTrained,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid fold count {folds} for {records} records (need 2 <= folds <= records)")]
    InvalidFoldCount { folds: usize, records: usize },

    #[error("unknown label '{0}' (expected 'true' or 'fake')")]
    UnknownLabel(String),

    #[error("unknown classifier '{0}' (expected 'mlp' or 'nb')")]
    UnknownClassifier(String),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
