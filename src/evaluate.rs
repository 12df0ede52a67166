// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Standalone cross-validation runner
//!
//! Runs k-fold evaluation of one or all models over a corpus

use anyhow::{bail, Result};
use clap::Parser;
use fakenews_detector::classifier::{all_classifiers, ClassifierKind, ModelSettings};
use fakenews_detector::corpus::{Corpus, Label};
use fakenews_detector::cross_validation::{CrossValidationConfig, CrossValidator};
use fakenews_detector::metrics::format_accuracy;
use fakenews_detector::pipeline::PipelineConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cross-validate")]
#[command(about = "Run k-fold cross-validation of the news classifiers")]
#[command(version)]
struct Args {
    /// Model to evaluate (mlp, nb); all models when omitted
    #[arg(short, long)]
    model: Option<ClassifierKind>,

    /// Corpus CSV (FakeTrue.Br layout)
    #[arg(short, long)]
    corpus: Option<PathBuf>,

    /// Number of records for the synthetic corpus
    #[arg(short, long, default_value_t = 200)]
    num_records: usize,

    /// Number of folds
    #[arg(short = 'k', long, default_value_t = 5)]
    folds: usize,

    /// MLP epochs per fold
    #[arg(short, long, default_value_t = 10)]
    epochs: usize,

    /// Random seed
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Evaluate folds in parallel
    #[arg(long)]
    parallel: bool,

    /// JSON configuration file (MLP shape and stop words)
    #[arg(long)]
    config: Option<PathBuf>,

    /// List available models
    #[arg(long)]
    list: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // List available models
    if args.list {
        println!("Available models:");
        println!("-----------------");
        for classifier in all_classifiers(&ModelSettings::default())? {
            println!(
                "  {} ({}): {}",
                classifier.name(),
                classifier.kind().id(),
                classifier.description()
            );
        }
        return Ok(());
    }

    // Load corpus
    let corpus = match &args.corpus {
        Some(path) => Corpus::load_csv(path)?,
        None => {
            tracing::info!(
                "Using synthetic corpus ({} records, seed={})",
                args.num_records,
                args.seed
            );
            Corpus::synthetic(args.num_records, args.seed)
        }
    };

    if corpus.is_empty() {
        bail!("corpus {} has no records", corpus.name);
    }

    let dist = corpus.label_distribution();
    let examples = corpus.example_count();

    println!("\nCorpus: {}", corpus.name);
    println!("  Records: {}", corpus.len());
    println!("  Examples: {}", examples);
    for label in Label::ALL {
        let count = dist.get(&label).copied().unwrap_or(0);
        println!(
            "  {}: {} ({:.1}%)",
            label,
            count,
            count as f64 / examples.max(1) as f64 * 100.0
        );
    }

    let settings = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?.model_settings(),
        None => ModelSettings::default(),
    };
    let settings = ModelSettings {
        mlp: settings.mlp.with_seed(args.seed),
        ..settings
    };

    let validator = CrossValidator::new(
        CrossValidationConfig {
            folds: args.folds,
            mlp_epochs: args.epochs,
            parallel: args.parallel,
        },
        settings,
    );

    let kinds: Vec<ClassifierKind> = match args.model {
        Some(kind) => vec![kind],
        None => ClassifierKind::ALL.to_vec(),
    };

    println!("\n{}", "=".repeat(70));
    println!("CROSS-VALIDATION ({} folds)", args.folds);
    println!("{}", "=".repeat(70));

    let mut reports = Vec::new();
    for kind in kinds {
        println!("\n## {} ##", kind.name());
        println!("{}", "-".repeat(50));

        let report = validator.evaluate(&corpus.records, kind)?;
        println!("{}", report.format());
        reports.push(report);
    }

    if reports.len() > 1 {
        println!("{}", "=".repeat(70));
        println!(
            "{:<15} {:>16} {:>10} {:>10} {:>10}",
            "Model", "Accuracy", "Precision", "Recall", "F1"
        );
        println!("{:-<70}", "");
        for report in &reports {
            let m = &report.metrics;
            println!(
                "{:<15} {:>16} {:>10.4} {:>10.4} {:>10.4}",
                report.kind.name(),
                format_accuracy(m.accuracy),
                m.precision,
                m.recall,
                m.f1_score
            );
        }
        println!("{:-<70}", "");
    }

    println!("\n{}", "=".repeat(70));
    println!("Evaluation complete!");

    Ok(())
}
