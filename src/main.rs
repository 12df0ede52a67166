// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Fake news analysis CLI
//!
//! Usage:
//!   fakenews --corpus FakeTrueBr_corpus.csv --text "Governo anuncia..."
//!   fakenews --corpus FakeTrueBr_corpus.csv --file noticia.txt --fast
//!   fakenews --synthetic 200 --text "..." --models nb
//!   fakenews --corpus FakeTrueBr_corpus.csv --files a.txt,b.txt,c.txt --fast

use anyhow::{bail, Context, Result};
use clap::Parser;
use fakenews_detector::classifier::ClassifierKind;
use fakenews_detector::corpus::Corpus;
use fakenews_detector::cross_validation::CrossValidationConfig;
use fakenews_detector::metrics::format_accuracy;
use fakenews_detector::pipeline::{
    AnalysisOutcome, AnalysisPipeline, AnalysisResults, BatchResults, PipelineConfig,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fakenews")]
#[command(about = "Classify a news text as probably true or probably fake")]
#[command(version)]
struct Args {
    /// News text to classify
    #[arg(short, long, conflicts_with = "file")]
    text: Option<String>,

    /// Read the news text from a file
    #[arg(short, long, conflicts_with = "files")]
    file: Option<PathBuf>,

    /// Analyze several text files (comma-separated) and summarize them
    #[arg(long, value_delimiter = ',', conflicts_with = "text")]
    files: Option<Vec<PathBuf>>,

    /// Corpus CSV (FakeTrue.Br layout)
    #[arg(short, long)]
    corpus: Option<PathBuf>,

    /// Use a synthetic corpus of this many records instead of a CSV
    #[arg(long, conflicts_with = "corpus")]
    synthetic: Option<usize>,

    /// Models to run (comma-separated: mlp, nb)
    #[arg(short, long, value_delimiter = ',')]
    models: Option<Vec<ClassifierKind>>,

    /// Skip cross-validation
    #[arg(long)]
    fast: bool,

    /// Number of cross-validation folds
    #[arg(long)]
    folds: Option<usize>,

    /// MLP training epochs
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Random seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format (json, markdown, both, none)
    #[arg(long, default_value = "none")]
    format: String,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(models) = args.models.clone() {
        config.models = models;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(epochs) = args.epochs {
        config.mlp.epochs = epochs;
    }
    if let Some(folds) = args.folds {
        config
            .cross_validation
            .get_or_insert_with(CrossValidationConfig::default)
            .folds = folds;
    }
    if args.fast {
        config.cross_validation = None;
    }
    if let Some(output) = &args.output {
        config.output_dir = output.to_string_lossy().to_string();
    }

    let corpus = match (&args.corpus, args.synthetic) {
        (Some(path), _) => Corpus::load_csv(path)?,
        (None, Some(size)) => Corpus::synthetic(size, config.seed),
        (None, None) => bail!("provide a corpus with --corpus (see download-corpus) or --synthetic"),
    };

    tracing::info!("Fake News Analysis");
    tracing::info!("==================");
    tracing::info!("Corpus: {} ({} records)", corpus.name, corpus.len());
    tracing::info!(
        "Models: {}",
        config
            .models
            .iter()
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    match &config.cross_validation {
        Some(cv) => tracing::info!("Cross-validation: {} folds", cv.folds),
        None => tracing::info!("Cross-validation: skipped"),
    }

    let pipeline = AnalysisPipeline::new(config, corpus)?;

    if let Some(files) = &args.files {
        let texts = files
            .iter()
            .map(|path| -> Result<(String, String)> { Ok((text_name(path), read_text(path)?)) })
            .collect::<Result<Vec<_>>>()?;
        let batch = pipeline.analyze_batch(&texts)?;
        print_batch_summary(&batch);
        return save_batch(&pipeline, &batch, &args.format);
    }

    let text = match (&args.text, &args.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => read_text(path)?,
        (None, None) => bail!("provide the news text with --text, --file or --files"),
    };

    let results = pipeline.analyze(&text)?;
    print_analysis(&results);
    save_analysis(&pipeline, &results, &args.format)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read text file: {}", path.display()))
}

/// Batch entries are named after their file stem
fn text_name(path: &Path) -> String {
    path.file_stem()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let mut truncated: String = s.chars().take(max - 3).collect();
        truncated.push_str("...");
        truncated
    } else {
        s.to_string()
    }
}

fn print_analysis(results: &AnalysisResults) {
    println!("\n{}", "=".repeat(100));
    println!("ANALYSIS SUMMARY");
    println!("{}", "=".repeat(100));
    println!("Text ({} characters): {}", results.text_chars, results.text_preview);
    for warning in &results.warnings {
        println!("[WARNING] {}", warning);
    }
    println!();

    match &results.outcome {
        AnalysisOutcome::Unusable => {
            println!("No relevant text could be classified.");
        }
        AnalysisOutcome::DebunkHeuristic { keyword } => {
            println!("[HEURISTIC] The text contains the debunk term \"{}\".", keyword);
            println!("Classification: Probably fake (by heuristic)");
        }
        AnalysisOutcome::Classified(analysis) => {
            println!(
                "{:<14} {:<16} {:>11} {:<18} {:>16} {:>10} {:>10} {:>10}",
                "Model", "Classification", "Confidence", " Probabilities", "Accuracy", "Precision", "Recall", "F1"
            );
            println!("{:-<100}", "");
            for verdict in &analysis.verdicts {
                let r = &verdict.result;
                let probabilities = format!(
                    " T:{:.1}% F:{:.1}%",
                    r.probabilities.true_percent, r.probabilities.fake_percent
                );
                match &verdict.cross_validation {
                    Some(m) => println!(
                        "{:<14} {:<16} {:>10.2}% {:<18} {:>16} {:>10.4} {:>10.4} {:>10.4}",
                        verdict.kind.name(),
                        r.label.verdict(),
                        r.confidence,
                        probabilities,
                        format_accuracy(m.accuracy),
                        m.precision,
                        m.recall,
                        m.f1_score
                    ),
                    None => println!(
                        "{:<14} {:<16} {:>10.2}% {:<18} {:>16} {:>10} {:>10} {:>10}",
                        verdict.kind.name(),
                        r.label.verdict(),
                        r.confidence,
                        probabilities,
                        "-",
                        "-",
                        "-",
                        "-"
                    ),
                }
            }
            println!("{:-<100}", "");

            println!("\nMost influential tokens:");
            for verdict in &analysis.verdicts {
                let tokens: Vec<&str> = verdict
                    .result
                    .top_tokens
                    .iter()
                    .take(5)
                    .map(String::as_str)
                    .collect();
                println!("  {:<12} {}", verdict.kind.name(), tokens.join(", "));
            }

            if let Some(comparison) = &analysis.comparison {
                println!();
                if comparison.agree {
                    println!("The models agree.");
                } else {
                    println!("The models disagree:");
                    for verdict in &analysis.verdicts[..2] {
                        println!(
                            "  {:<12} {} ({:.2}%)",
                            verdict.kind.name(),
                            verdict.result.label.verdict(),
                            verdict.result.confidence
                        );
                    }
                }
                println!(
                    "Confidence difference: {:.2}% ({} divergence)",
                    comparison.confidence_difference,
                    comparison.divergence.as_str()
                );
            }
        }
    }
    println!("{}", "=".repeat(100));
}

fn print_batch_summary(batch: &BatchResults) {
    println!("\n{}", "=".repeat(120));
    println!("BATCH SUMMARY");
    println!("{}", "=".repeat(120));

    print!("{:<60}", "Text");
    for kind in &batch.models {
        print!(" {:<30}", kind.name());
    }
    println!();
    println!("{:-<120}", "");

    for item in &batch.items {
        print!("{:<60}", truncate(&item.name, 58));
        for &kind in &batch.models {
            print!(" {:<30}", truncate(&item.results.model_verdict(kind), 28));
        }
        println!();
    }
    println!("{}", "=".repeat(120));

    let summary = &batch.summary;
    println!("\nStatistics:");
    println!("  Texts analyzed: {}", summary.total);
    println!(
        "  Agreement between models: {}/{} ({:.1}%)",
        summary.agreements, summary.total, summary.agreement_percent
    );
    for counts in &summary.label_counts {
        println!(
            "  {}: {} true, {} fake, {} unclassified",
            counts.kind.name(),
            counts.true_count,
            counts.fake_count,
            counts.unclassified
        );
    }
}

/// Output directory for `--format`, or `None` when nothing is saved
fn output_dir(pipeline: &AnalysisPipeline, format: &str) -> Result<Option<PathBuf>> {
    if format == "none" {
        return Ok(None);
    }
    let output_dir = PathBuf::from(&pipeline.config().output_dir);
    std::fs::create_dir_all(&output_dir)?;
    Ok(Some(output_dir))
}

fn save_analysis(pipeline: &AnalysisPipeline, results: &AnalysisResults, format: &str) -> Result<()> {
    let Some(output_dir) = output_dir(pipeline, format)? else {
        return Ok(());
    };
    let timestamp = results.timestamp.format("%Y%m%d_%H%M%S");

    if format == "json" || format == "both" {
        let json_path = output_dir.join(format!("analysis_{}.json", timestamp));
        AnalysisPipeline::save_results(results, &json_path)?;
        println!("\nJSON results saved to: {}", json_path.display());
    }

    if format == "markdown" || format == "both" {
        let report = AnalysisPipeline::generate_report(results);
        let md_path = output_dir.join(format!("analysis_{}.md", timestamp));
        std::fs::write(&md_path, report)?;
        println!("Markdown report saved to: {}", md_path.display());
    }

    Ok(())
}

fn save_batch(pipeline: &AnalysisPipeline, batch: &BatchResults, format: &str) -> Result<()> {
    let Some(output_dir) = output_dir(pipeline, format)? else {
        return Ok(());
    };
    let timestamp = batch.timestamp.format("%Y%m%d_%H%M%S");

    if format == "json" || format == "both" {
        let json_path = output_dir.join(format!("batch_{}.json", timestamp));
        AnalysisPipeline::save_results(batch, &json_path)?;
        println!("\nJSON results saved to: {}", json_path.display());
    }

    if format == "markdown" || format == "both" {
        let report = AnalysisPipeline::generate_batch_report(batch);
        let md_path = output_dir.join(format!("batch_{}.md", timestamp));
        std::fs::write(&md_path, report)?;
        println!("Markdown report saved to: {}", md_path.display());
    }

    Ok(())
}
