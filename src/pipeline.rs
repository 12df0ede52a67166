// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Text analysis pipeline
//!
//! Orchestrates:
//! - Usability check and short-text warning
//! - Debunk keyword heuristic
//! - Optional cross-validation metrics per model
//! - Training every configured model on the full corpus and classifying the text
//! - Agreement analysis between two models
//! - Batch analysis of named texts with a summary across them
//! - Markdown report and JSON serialization

use crate::classifier::{
    build_classifier, ClassificationResult, ClassifierKind, ModelSettings, NewsClassifier,
};
use crate::corpus::{Corpus, Label};
use crate::cross_validation::{CrossValidationConfig, CrossValidator};
use crate::error::{ClassifierError, Result};
use crate::metrics::{format_accuracy, Metrics};
use crate::mlp::MlpConfig;
use crate::preprocess::{StopWords, TextPreprocessor};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Characters of the input kept in reports
const PREVIEW_CHARS: usize = 200;

/// Tokens listed per model in reports
const REPORT_TOKENS: usize = 5;

/// Configuration for the analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Random seed for weight initialization (overrides `mlp.seed`)
    pub seed: u64,
    /// Models to run, in report order
    pub models: Vec<ClassifierKind>,
    pub mlp: MlpConfig,
    /// `None` skips cross-validation (fast mode)
    pub cross_validation: Option<CrossValidationConfig>,
    /// Custom stop words (default: Portuguese list)
    pub stop_words: Option<Vec<String>>,
    /// Texts containing any of these are judged fake without a model. Empty disables.
    pub debunk_keywords: Vec<String>,
    /// Shorter texts get a reliability warning
    pub min_reliable_chars: usize,
    /// Output directory for results
    pub output_dir: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            models: ClassifierKind::ALL.to_vec(),
            mlp: MlpConfig::default(),
            cross_validation: Some(CrossValidationConfig::default()),
            stop_words: None,
            debunk_keywords: ["boato", "falso", "mentira", "desmentido", "fake news"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_reliable_chars: 300,
            output_dir: "results".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(ClassifierError::InvalidConfig(
                "at least one model must be selected".to_string(),
            ));
        }
        self.mlp.validate()
    }

    pub fn preprocessor(&self) -> TextPreprocessor {
        match &self.stop_words {
            Some(words) => TextPreprocessor::new(StopWords::new(words)),
            None => TextPreprocessor::default(),
        }
    }

    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings::new(self.mlp.clone().with_seed(self.seed), self.preprocessor())
    }
}

/// How far apart two models' confidences are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergenceLevel {
    Low,
    Moderate,
    High,
}

impl DivergenceLevel {
    /// Classify an absolute confidence difference in percentage points
    pub fn from_difference(difference: f64) -> Self {
        if difference < 10.0 {
            DivergenceLevel::Low
        } else if difference < 25.0 {
            DivergenceLevel::Moderate
        } else {
            DivergenceLevel::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DivergenceLevel::Low => "low",
            DivergenceLevel::Moderate => "moderate",
            DivergenceLevel::High => "high",
        }
    }
}

/// One model's answer for the analyzed text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelVerdict {
    pub kind: ClassifierKind,
    pub result: ClassificationResult,
    /// Cross-validation metrics, absent in fast mode
    pub cross_validation: Option<Metrics>,
}

/// Agreement between the first two verdicts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub models: [ClassifierKind; 2],
    pub agree: bool,
    pub confidence_difference: f64,
    pub divergence: DivergenceLevel,
}

impl Comparison {
    pub fn between(a: &ModelVerdict, b: &ModelVerdict) -> Self {
        let confidence_difference = (a.result.confidence - b.result.confidence).abs();
        Self {
            models: [a.kind, b.kind],
            agree: a.result.label == b.result.label,
            confidence_difference,
            divergence: DivergenceLevel::from_difference(confidence_difference),
        }
    }
}

/// Model verdicts for a classified text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub verdicts: Vec<ModelVerdict>,
    pub comparison: Option<Comparison>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    /// Nothing to classify
    Unusable,
    /// Matched a debunk keyword; the verdict is fake and no model ran
    DebunkHeuristic { keyword: String },
    Classified(Analysis),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusInfo {
    pub name: String,
    pub records: usize,
    pub examples: usize,
}

/// Complete analysis results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub corpus: CorpusInfo,
    pub text_chars: usize,
    pub text_preview: String,
    pub warnings: Vec<String>,
    pub outcome: AnalysisOutcome,
}

impl AnalysisResults {
    /// Final label, if any verdict was reached (first model wins)
    pub fn label(&self) -> Option<Label> {
        match &self.outcome {
            AnalysisOutcome::Unusable => None,
            AnalysisOutcome::DebunkHeuristic { .. } => Some(Label::Fake),
            AnalysisOutcome::Classified(analysis) => {
                analysis.verdicts.first().map(|v| v.result.label)
            }
        }
    }

    /// Label attributed to one model. The heuristic answers for every model.
    pub fn model_label(&self, kind: ClassifierKind) -> Option<Label> {
        match &self.outcome {
            AnalysisOutcome::Unusable => None,
            AnalysisOutcome::DebunkHeuristic { .. } => Some(Label::Fake),
            AnalysisOutcome::Classified(analysis) => analysis
                .verdicts
                .iter()
                .find(|v| v.kind == kind)
                .map(|v| v.result.label),
        }
    }

    /// Short per-model verdict for summary tables
    pub fn model_verdict(&self, kind: ClassifierKind) -> String {
        match (&self.outcome, self.model_label(kind)) {
            (AnalysisOutcome::DebunkHeuristic { .. }, _) => {
                format!("{} (heuristic)", Label::Fake.verdict())
            }
            (_, Some(label)) => label.verdict().to_string(),
            (_, None) => "No text".to_string(),
        }
    }
}

/// Analysis of one named text in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    pub name: String,
    pub results: AnalysisResults,
}

/// Label counts for one model across a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLabelCounts {
    pub kind: ClassifierKind,
    pub true_count: usize,
    pub fake_count: usize,
    /// Texts that could not be classified
    pub unclassified: usize,
}

/// Statistics across a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    /// Texts on which every model gave the same answer
    pub agreements: usize,
    /// `agreements / total` in percent, 0 for an empty batch
    pub agreement_percent: f64,
    pub label_counts: Vec<ModelLabelCounts>,
}

impl BatchSummary {
    pub fn from_items(items: &[BatchItem], models: &[ClassifierKind]) -> Self {
        let total = items.len();
        let agreements = items
            .iter()
            .filter(|item| {
                let labels: Vec<_> = models.iter().map(|&k| item.results.model_label(k)).collect();
                labels.windows(2).all(|pair| pair[0] == pair[1])
            })
            .count();

        let label_counts = models
            .iter()
            .map(|&kind| {
                let mut counts = ModelLabelCounts {
                    kind,
                    true_count: 0,
                    fake_count: 0,
                    unclassified: 0,
                };
                for item in items {
                    match item.results.model_label(kind) {
                        Some(Label::True) => counts.true_count += 1,
                        Some(Label::Fake) => counts.fake_count += 1,
                        None => counts.unclassified += 1,
                    }
                }
                counts
            })
            .collect();

        Self {
            total,
            agreements,
            agreement_percent: if total == 0 {
                0.0
            } else {
                agreements as f64 / total as f64 * 100.0
            },
            label_counts,
        }
    }
}

/// Results of a batch analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub models: Vec<ClassifierKind>,
    pub items: Vec<BatchItem>,
    pub summary: BatchSummary,
}

/// A model trained on the full corpus, with its cross-validation metrics
struct TrainedModel {
    classifier: Box<dyn NewsClassifier>,
    cross_validation: Option<Metrics>,
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

/// Main analysis pipeline
pub struct AnalysisPipeline {
    config: PipelineConfig,
    corpus: Corpus,
}

impl AnalysisPipeline {
    pub fn new(config: PipelineConfig, corpus: Corpus) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, corpus })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn debunk_keyword(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.config
            .debunk_keywords
            .iter()
            .find(|kw| !kw.is_empty() && lowered.contains(&kw.to_lowercase()))
            .map(String::as_str)
    }

    fn train_model(&self, kind: ClassifierKind) -> Result<TrainedModel> {
        let settings = self.config.model_settings();

        let cross_validation = match &self.config.cross_validation {
            Some(cv) => {
                let report = CrossValidator::new(cv.clone(), settings.clone())
                    .evaluate(&self.corpus.records, kind)?;
                Some(report.metrics)
            }
            None => None,
        };

        tracing::info!("Training {} on {} records", kind.name(), self.corpus.len());
        let mut classifier = build_classifier(kind, &settings)?;
        classifier.train(&self.corpus.records)?;

        Ok(TrainedModel {
            classifier,
            cross_validation,
        })
    }

    fn train_models(&self) -> Result<Vec<TrainedModel>> {
        self.config
            .models
            .iter()
            .map(|&kind| self.train_model(kind))
            .collect()
    }

    fn classify(models: &[TrainedModel], text: &str) -> Result<Analysis> {
        let verdicts = models
            .iter()
            .map(|model| -> Result<ModelVerdict> {
                let result = model.classifier.classify_with_detail(text)?;
                tracing::info!(
                    "  {} - {} ({:.2}%)",
                    model.classifier.name(),
                    result.label.verdict(),
                    result.confidence
                );
                Ok(ModelVerdict {
                    kind: model.classifier.kind(),
                    result,
                    cross_validation: model.cross_validation,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let comparison = match verdicts.as_slice() {
            [a, b, ..] => Some(Comparison::between(a, b)),
            _ => None,
        };

        Ok(Analysis {
            verdicts,
            comparison,
        })
    }

    /// Analyze one text against the corpus
    pub fn analyze(&self, text: &str) -> Result<AnalysisResults> {
        self.analyze_with(text, &mut None)
    }

    /// Analyze several named texts, training each model at most once
    pub fn analyze_batch(&self, texts: &[(String, String)]) -> Result<BatchResults> {
        let mut trained = None;
        let mut items = Vec::with_capacity(texts.len());

        for (i, (name, text)) in texts.iter().enumerate() {
            tracing::info!("Analyzing {}/{}: {}", i + 1, texts.len(), name);
            items.push(BatchItem {
                name: name.clone(),
                results: self.analyze_with(text, &mut trained)?,
            });
        }

        let summary = BatchSummary::from_items(&items, &self.config.models);
        tracing::info!(
            "Batch complete: {} texts, models agree on {}",
            summary.total,
            summary.agreements
        );

        Ok(BatchResults {
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            models: self.config.models.clone(),
            items,
            summary,
        })
    }

    /// Models are trained on the first text that needs them
    fn analyze_with(
        &self,
        text: &str,
        trained: &mut Option<Vec<TrainedModel>>,
    ) -> Result<AnalysisResults> {
        let text_chars = text.chars().count();
        let mut warnings = Vec::new();

        let outcome = if text.trim().is_empty() {
            tracing::warn!("No usable text to classify");
            AnalysisOutcome::Unusable
        } else {
            if text_chars < self.config.min_reliable_chars {
                tracing::warn!("Text is short ({} characters), result may be unreliable", text_chars);
                warnings.push(format!(
                    "Text is very short ({} characters); the result may not be reliable",
                    text_chars
                ));
            }

            if let Some(keyword) = self.debunk_keyword(text) {
                tracing::info!("Debunk keyword '{}' found, skipping models", keyword);
                AnalysisOutcome::DebunkHeuristic {
                    keyword: keyword.to_string(),
                }
            } else {
                if trained.is_none() {
                    *trained = Some(self.train_models()?);
                }
                let models = trained.as_deref().unwrap_or_default();
                AnalysisOutcome::Classified(Self::classify(models, text)?)
            }
        };

        Ok(AnalysisResults {
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            corpus: CorpusInfo {
                name: self.corpus.name.clone(),
                records: self.corpus.len(),
                examples: self.corpus.example_count(),
            },
            text_chars,
            text_preview: preview(text),
            warnings,
            outcome,
        })
    }

    /// Save single or batch results to a JSON file
    pub fn save_results<T: Serialize>(results: &T, output_path: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(output_path.parent().unwrap_or(Path::new(".")))?;
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write results: {}", output_path.display()))?;
        tracing::info!("Results saved to {}", output_path.display());
        Ok(())
    }

    /// Generate a markdown report
    pub fn generate_report(results: &AnalysisResults) -> String {
        let mut report = String::new();

        report.push_str("# Fake News Analysis Report\n\n");
        report.push_str(&format!(
            "**Generated:** {}\n\n",
            results.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        report.push_str(&format!("**Version:** {}\n\n", results.version));

        report.push_str("## Input\n\n");
        report.push_str(&format!(
            "- **Corpus:** {} ({} records, {} examples)\n",
            results.corpus.name, results.corpus.records, results.corpus.examples
        ));
        report.push_str(&format!("- **Text length:** {} characters\n\n", results.text_chars));
        if !results.text_preview.trim().is_empty() {
            report.push_str(&format!("> {}\n\n", results.text_preview.replace('\n', " ")));
        }

        if !results.warnings.is_empty() {
            report.push_str("### Warnings\n\n");
            for warning in &results.warnings {
                report.push_str(&format!("- {}\n", warning));
            }
            report.push('\n');
        }

        report.push_str("## Verdict\n\n");

        match &results.outcome {
            AnalysisOutcome::Unusable => {
                report.push_str("No relevant text could be classified.\n");
            }
            AnalysisOutcome::DebunkHeuristic { keyword } => {
                report.push_str(&format!(
                    "**{}** (heuristic): the text contains the debunk term \"{}\".\n",
                    Label::Fake.verdict(),
                    keyword
                ));
            }
            AnalysisOutcome::Classified(analysis) => {
                Self::push_analysis(&mut report, analysis);
            }
        }

        report
    }

    /// Generate a markdown summary of a batch
    pub fn generate_batch_report(batch: &BatchResults) -> String {
        let mut report = String::new();

        report.push_str("# Fake News Batch Analysis\n\n");
        report.push_str(&format!(
            "**Generated:** {}\n\n",
            batch.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        report.push_str(&format!("**Version:** {}\n\n", batch.version));

        report.push_str("## Results\n\n");
        report.push_str("| Text |");
        for kind in &batch.models {
            report.push_str(&format!(" {} |", kind.name()));
        }
        report.push_str("\n|------|");
        for _ in &batch.models {
            report.push_str("------|");
        }
        report.push('\n');
        for item in &batch.items {
            report.push_str(&format!("| {} |", item.name));
            for &kind in &batch.models {
                report.push_str(&format!(" {} |", item.results.model_verdict(kind)));
            }
            report.push('\n');
        }

        let summary = &batch.summary;
        report.push_str("\n## Statistics\n\n");
        report.push_str(&format!("- **Texts analyzed:** {}\n", summary.total));
        report.push_str(&format!(
            "- **Agreement between models:** {}/{} ({:.1}%)\n",
            summary.agreements, summary.total, summary.agreement_percent
        ));
        for counts in &summary.label_counts {
            report.push_str(&format!(
                "- **{}:** {} true, {} fake, {} unclassified\n",
                counts.kind.name(),
                counts.true_count,
                counts.fake_count,
                counts.unclassified
            ));
        }

        report
    }

    fn push_analysis(report: &mut String, analysis: &Analysis) {
        report.push_str(
            "| Model | Classification | Confidence | Probabilities | Accuracy | Precision | Recall | F1 Score |\n",
        );
        report.push_str(
            "|-------|----------------|------------|---------------|----------|-----------|--------|----------|\n",
        );

        for verdict in &analysis.verdicts {
            let r = &verdict.result;
            let metrics = match &verdict.cross_validation {
                Some(m) => format!(
                    "{} | {:.4} | {:.4} | {:.4}",
                    format_accuracy(m.accuracy),
                    m.precision,
                    m.recall,
                    m.f1_score
                ),
                None => "- | - | - | -".to_string(),
            };
            report.push_str(&format!(
                "| {} | {} | {:.2}% | T:{:.1}% F:{:.1}% | {} |\n",
                verdict.kind.name(),
                r.label.verdict(),
                r.confidence,
                r.probabilities.true_percent,
                r.probabilities.fake_percent,
                metrics
            ));
        }

        report.push_str("\n### Influential Tokens\n\n");
        for verdict in &analysis.verdicts {
            let tokens: Vec<&str> = verdict
                .result
                .top_tokens
                .iter()
                .take(REPORT_TOKENS)
                .map(String::as_str)
                .collect();
            let listed = if tokens.is_empty() {
                "(none)".to_string()
            } else {
                tokens.join(", ")
            };
            report.push_str(&format!("- **{}:** {}\n", verdict.kind.name(), listed));
        }

        if let Some(comparison) = &analysis.comparison {
            report.push_str("\n### Agreement\n\n");
            if comparison.agree {
                report.push_str("The models agree.\n\n");
            } else {
                report.push_str("The models disagree.\n\n");
            }
            report.push_str(&format!(
                "Confidence difference: {:.2}% ({} divergence)\n",
                comparison.confidence_difference,
                comparison.divergence.as_str()
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassProbabilities;

    const FAKE_TEXT: &str = "Urgente: governo esconde verdade chocante. Compartilhe o escandalo secreto, \
        medico revela cura milagrosa!";

    fn fast_config() -> PipelineConfig {
        PipelineConfig {
            mlp: MlpConfig {
                input_size: 64,
                hidden_size: 6,
                learning_rate: 0.5,
                epochs: 30,
                ..MlpConfig::default()
            },
            cross_validation: None,
            ..PipelineConfig::default()
        }
    }

    fn pipeline(config: PipelineConfig) -> AnalysisPipeline {
        AnalysisPipeline::new(config, Corpus::synthetic(20, 42)).unwrap()
    }

    #[test]
    fn test_unusable_text() {
        let results = pipeline(fast_config()).analyze("  \n\t ").unwrap();
        assert!(matches!(results.outcome, AnalysisOutcome::Unusable));
        assert!(results.warnings.is_empty());
        assert_eq!(results.label(), None);
    }

    #[test]
    fn test_debunk_heuristic() {
        let results = pipeline(fast_config())
            .analyze("Circula nas redes um BOATO sobre vacinas")
            .unwrap();
        match &results.outcome {
            AnalysisOutcome::DebunkHeuristic { keyword } => assert_eq!(keyword, "boato"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(results.label(), Some(Label::Fake));
        assert_eq!(results.warnings.len(), 1);
    }

    #[test]
    fn test_heuristic_can_be_disabled() {
        let config = PipelineConfig {
            debunk_keywords: vec![],
            models: vec![ClassifierKind::NaiveBayes],
            ..fast_config()
        };
        let results = pipeline(config).analyze("isso e falso").unwrap();
        assert!(matches!(results.outcome, AnalysisOutcome::Classified(_)));
    }

    #[test]
    fn test_classified_with_both_models() {
        let results = pipeline(fast_config()).analyze(FAKE_TEXT).unwrap();

        let analysis = match &results.outcome {
            AnalysisOutcome::Classified(analysis) => analysis,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(analysis.verdicts.len(), 2);
        assert_eq!(analysis.verdicts[0].kind, ClassifierKind::Mlp);
        assert_eq!(analysis.verdicts[1].kind, ClassifierKind::NaiveBayes);
        assert!(analysis.verdicts.iter().all(|v| v.cross_validation.is_none()));
        assert_eq!(analysis.verdicts[1].result.label, Label::Fake);

        let comparison = analysis.comparison.as_ref().unwrap();
        let expected = (analysis.verdicts[0].result.confidence
            - analysis.verdicts[1].result.confidence)
            .abs();
        assert!((comparison.confidence_difference - expected).abs() < 1e-9);
        assert_eq!(
            comparison.agree,
            analysis.verdicts[0].result.label == analysis.verdicts[1].result.label
        );

        // Short text warning
        assert_eq!(results.warnings.len(), 1);
        assert_eq!(results.text_chars, FAKE_TEXT.chars().count());
    }

    #[test]
    fn test_cross_validation_metrics_included() {
        let config = PipelineConfig {
            models: vec![ClassifierKind::NaiveBayes],
            cross_validation: Some(CrossValidationConfig {
                folds: 4,
                ..CrossValidationConfig::default()
            }),
            ..fast_config()
        };
        let results = pipeline(config).analyze(FAKE_TEXT).unwrap();
        let AnalysisOutcome::Classified(analysis) = &results.outcome else {
            panic!("expected a classification");
        };
        assert!(analysis.comparison.is_none());
        let metrics = analysis.verdicts[0].cross_validation.unwrap();
        assert!((0.0..=1.0).contains(&metrics.accuracy));
    }

    #[test]
    fn test_divergence_levels() {
        assert_eq!(DivergenceLevel::from_difference(0.0), DivergenceLevel::Low);
        assert_eq!(DivergenceLevel::from_difference(9.99), DivergenceLevel::Low);
        assert_eq!(DivergenceLevel::from_difference(10.0), DivergenceLevel::Moderate);
        assert_eq!(DivergenceLevel::from_difference(24.9), DivergenceLevel::Moderate);
        assert_eq!(DivergenceLevel::from_difference(25.0), DivergenceLevel::High);
    }

    #[test]
    fn test_invalid_config() {
        let config = PipelineConfig {
            models: vec![],
            ..PipelineConfig::default()
        };
        assert!(matches!(
            AnalysisPipeline::new(config, Corpus::synthetic(2, 1)),
            Err(ClassifierError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_generate_report() {
        let p = pipeline(fast_config());

        let report = AnalysisPipeline::generate_report(&p.analyze(FAKE_TEXT).unwrap());
        assert!(report.contains("Fake News Analysis Report"));
        assert!(report.contains("| MLP |"));
        assert!(report.contains("| Naive Bayes |"));
        assert!(report.contains("Influential Tokens"));
        assert!(report.contains("Agreement"));
        assert!(report.contains("Warnings"));

        let report = AnalysisPipeline::generate_report(&p.analyze("").unwrap());
        assert!(report.contains("No relevant text"));

        let report = AnalysisPipeline::generate_report(&p.analyze("noticia falsa: mentira").unwrap());
        assert!(report.contains("heuristic"));
    }

    #[test]
    fn test_save_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("analysis.json");

        let results = pipeline(fast_config()).analyze(FAKE_TEXT).unwrap();
        AnalysisPipeline::save_results(&results, &path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"outcome\": \"classified\""));
        assert!(json.contains("\"verdicts\""));
        assert!(json.contains("\"naive-bayes\""));
    }

    fn verdict(kind: ClassifierKind, label: Label) -> ModelVerdict {
        let mut slots = [20.0; 2];
        slots[label.index()] = 80.0;
        ModelVerdict {
            kind,
            result: ClassificationResult {
                label,
                confidence: 80.0,
                probabilities: ClassProbabilities::from_slots(slots),
                top_tokens: vec![],
            },
            cross_validation: None,
        }
    }

    fn item(name: &str, outcome: AnalysisOutcome) -> BatchItem {
        BatchItem {
            name: name.to_string(),
            results: AnalysisResults {
                timestamp: Utc::now(),
                version: String::new(),
                corpus: CorpusInfo {
                    name: "inline".to_string(),
                    records: 0,
                    examples: 0,
                },
                text_chars: 0,
                text_preview: String::new(),
                warnings: vec![],
                outcome,
            },
        }
    }

    fn classified(mlp: Label, nb: Label) -> AnalysisOutcome {
        AnalysisOutcome::Classified(Analysis {
            verdicts: vec![
                verdict(ClassifierKind::Mlp, mlp),
                verdict(ClassifierKind::NaiveBayes, nb),
            ],
            comparison: None,
        })
    }

    #[test]
    fn test_batch_summary_statistics() {
        let items = vec![
            item(
                "boato",
                AnalysisOutcome::DebunkHeuristic {
                    keyword: "boato".to_string(),
                },
            ),
            item("vazio", AnalysisOutcome::Unusable),
            item("a", classified(Label::True, Label::True)),
            item("b", classified(Label::True, Label::Fake)),
            item("c", classified(Label::Fake, Label::Fake)),
        ];

        let summary = BatchSummary::from_items(&items, &ClassifierKind::ALL);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.agreements, 4);
        assert!((summary.agreement_percent - 80.0).abs() < 1e-6);
        assert_eq!(
            summary.label_counts,
            vec![
                ModelLabelCounts {
                    kind: ClassifierKind::Mlp,
                    true_count: 2,
                    fake_count: 2,
                    unclassified: 1,
                },
                ModelLabelCounts {
                    kind: ClassifierKind::NaiveBayes,
                    true_count: 1,
                    fake_count: 3,
                    unclassified: 1,
                },
            ]
        );

        assert_eq!(
            items[0].results.model_verdict(ClassifierKind::Mlp),
            "Probably fake (heuristic)"
        );
        assert_eq!(items[1].results.model_verdict(ClassifierKind::Mlp), "No text");
        assert_eq!(
            items[3].results.model_verdict(ClassifierKind::NaiveBayes),
            "Probably fake"
        );

        let empty = BatchSummary::from_items(&[], &ClassifierKind::ALL);
        assert_eq!(empty.total, 0);
        assert_eq!(empty.agreement_percent, 0.0);
        assert!(empty.label_counts.iter().all(|c| c.true_count + c.fake_count + c.unclassified == 0));
    }

    #[test]
    fn test_analyze_batch() {
        let texts: Vec<(String, String)> = [
            ("boato", "Circula nas redes um boato sobre vacinas"),
            ("vazio", "   "),
            ("primeira", FAKE_TEXT),
            ("segunda", FAKE_TEXT),
        ]
        .iter()
        .map(|(n, t)| (n.to_string(), t.to_string()))
        .collect();

        let batch = pipeline(fast_config()).analyze_batch(&texts).unwrap();

        let names: Vec<_> = batch.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["boato", "vazio", "primeira", "segunda"]);
        assert_eq!(batch.models, ClassifierKind::ALL.to_vec());
        assert!(matches!(
            batch.items[0].results.outcome,
            AnalysisOutcome::DebunkHeuristic { .. }
        ));
        assert!(matches!(batch.items[1].results.outcome, AnalysisOutcome::Unusable));

        // Same trained models answer both copies of the text
        for kind in ClassifierKind::ALL {
            assert_eq!(
                batch.items[2].results.model_label(kind),
                batch.items[3].results.model_label(kind)
            );
        }

        let summary = &batch.summary;
        assert_eq!(summary.total, 4);
        assert!(summary.agreements >= 2);
        for counts in &summary.label_counts {
            assert_eq!(counts.true_count + counts.fake_count + counts.unclassified, 4);
            assert_eq!(counts.unclassified, 1);
            assert!(counts.fake_count >= 1);
        }

        let report = AnalysisPipeline::generate_batch_report(&batch);
        assert!(report.contains("| boato | Probably fake (heuristic) | Probably fake (heuristic) |"));
        assert!(report.contains("| vazio | No text | No text |"));
        assert!(report.contains("Agreement between models"));
    }

    #[test]
    fn test_results_json_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            models: vec![ClassifierKind::NaiveBayes],
            cross_validation: Some(CrossValidationConfig {
                folds: 4,
                ..CrossValidationConfig::default()
            }),
            ..fast_config()
        };
        let p = pipeline(config);

        let path = dir.path().join("analysis.json");
        AnalysisPipeline::save_results(&p.analyze(FAKE_TEXT).unwrap(), &path).unwrap();
        let restored: AnalysisResults =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored.label(), Some(Label::Fake));

        let texts = vec![("texto".to_string(), FAKE_TEXT.to_string())];
        let path = dir.path().join("batch.json");
        AnalysisPipeline::save_results(&p.analyze_batch(&texts).unwrap(), &path).unwrap();
        let restored: BatchResults =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(restored.summary.total, 1);
        assert_eq!(restored.items[0].name, "texto");
    }

    #[test]
    fn test_config_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"models": ["nb"], "min_reliable_chars": 50, "stop_words": ["governo"], "cross_validation": null}"#,
        )
        .unwrap();

        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.models, vec![ClassifierKind::NaiveBayes]);
        assert_eq!(config.min_reliable_chars, 50);
        assert!(config.cross_validation.is_none());
        assert_eq!(config.seed, 42);
        assert_eq!(config.debunk_keywords.len(), 5);
        assert_eq!(config.preprocessor().preprocess("governo novo"), vec!["novo"]);

        assert!(PipelineConfig::from_json_file(&dir.path().join("missing.json")).is_err());
    }
}
