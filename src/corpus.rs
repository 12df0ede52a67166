// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Paired fake/true news corpus: records, labels and loaders

use crate::error::ClassifierError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Public location of the FakeTrue.Br corpus
pub const FAKETRUE_BR_URL: &str =
    "https://raw.githubusercontent.com/jpchav98/FakeTrue.Br/refs/heads/main/FakeTrueBr_corpus.csv";

/// Binary label for news classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// News judged authentic
    True,
    /// News judged fabricated
    Fake,
}

impl Label {
    /// Both labels in output-slot order
    pub const ALL: [Label; 2] = [Label::True, Label::Fake];

    /// Output slot of this label (`[true, fake]`)
    pub fn index(self) -> usize {
        match self {
            Label::True => 0,
            Label::Fake => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Label::True => Label::Fake,
            Label::Fake => Label::True,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::True => "true",
            Label::Fake => "fake",
        }
    }

    /// One-hot training target for this label
    pub fn one_hot(self) -> [f64; 2] {
        let mut target = [0.0; 2];
        target[self.index()] = 1.0;
        target
    }

    /// Human-readable verdict used in reports
    pub fn verdict(self) -> &'static str {
        match self {
            Label::True => "Probably true",
            Label::Fake => "Probably fake",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = ClassifierError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true" => Ok(Label::True),
            "fake" => Ok(Label::Fake),
            other => Err(ClassifierError::UnknownLabel(other.to_string())),
        }
    }
}

/// A pair of articles on the same subject, one fabricated and one authentic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsRecord {
    pub fake_title: String,
    pub fake_text: String,
    pub fake_link: String,
    pub true_text: String,
    pub true_link: String,
}

/// A single text with its known label, borrowed from a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledText<'a> {
    pub text: &'a str,
    pub label: Label,
}

impl NewsRecord {
    pub fn new(fake_text: impl Into<String>, true_text: impl Into<String>) -> Self {
        Self {
            fake_text: fake_text.into(),
            true_text: true_text.into(),
            ..Default::default()
        }
    }

    /// Labeled examples of this record: the fake side first, then the true side.
    /// Sides that are blank after trimming contribute nothing.
    pub fn examples(&self) -> impl Iterator<Item = LabeledText<'_>> {
        [
            (self.fake_text.as_str(), Label::Fake),
            (self.true_text.as_str(), Label::True),
        ]
        .into_iter()
        .filter(|(text, _)| !text.trim().is_empty())
        .map(|(text, label)| LabeledText { text, label })
    }
}

/// Count labeled examples per class
pub fn label_distribution(records: &[NewsRecord]) -> HashMap<Label, usize> {
    let mut dist = HashMap::new();
    for example in records.iter().flat_map(NewsRecord::examples) {
        *dist.entry(example.label).or_insert(0) += 1;
    }
    dist
}

/// Both classes need at least one example before a model can be trained
pub fn ensure_trainable(records: &[NewsRecord]) -> crate::error::Result<()> {
    let dist = label_distribution(records);
    for label in Label::ALL {
        if dist.get(&label).copied().unwrap_or(0) == 0 {
            return Err(ClassifierError::InsufficientTrainingData { label });
        }
    }
    Ok(())
}

/// A loaded corpus ready for training and evaluation
#[derive(Debug, Clone)]
pub struct Corpus {
    pub name: String,
    pub records: Vec<NewsRecord>,
}

impl Corpus {
    pub fn new(name: impl Into<String>, records: Vec<NewsRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Load a corpus in the FakeTrue.Br CSV layout
    pub fn load_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open corpus file: {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "corpus".to_string());
        Self::from_csv_reader(&name, file)
    }

    /// Parse CSV with a header row and the columns
    /// `title_fake, fake_text, link_fake, true_text, link_true`.
    pub fn from_csv_reader<R: Read>(name: &str, reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            let row = result.with_context(|| format!("Failed to read record {} in {}", idx, name))?;

            if row.len() < 5 {
                tracing::warn!("Skipping malformed row {} in {}: {} fields", idx, name, row.len());
                continue;
            }

            let field = |i: usize| row.get(i).unwrap_or("").to_string();
            records.push(NewsRecord {
                fake_title: field(0),
                fake_text: field(1),
                fake_link: field(2),
                true_text: field(3),
                true_link: field(4),
            });
        }

        tracing::info!("Loaded {} records from {}", records.len(), name);
        Ok(Self::new(name, records))
    }

    /// Generated Portuguese corpus for demos and tests
    pub fn synthetic(size: usize, seed: u64) -> Self {
        use rand::{Rng, SeedableRng};
        use rand_chacha::ChaCha8Rng;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let fake_phrases = [
            "urgente governo esconde verdade chocante sobre vacinas",
            "compartilhe antes que apaguem escandalo secreto revelado",
            "medico revela cura milagrosa proibida pela industria",
            "politico corrupto flagrado roubando bilhoes segundo fonte anonima",
            "exclusivo conspiracao internacional contra brasileiros exposta",
        ];

        let true_phrases = [
            "ministerio publica relatorio oficial sobre vacinacao nacional",
            "pesquisa universidade aponta crescimento economico moderado",
            "tribunal julga recurso apresentado pela defesa nesta semana",
            "instituto divulga dados atualizados sobre desemprego regional",
            "prefeitura anuncia obras saneamento bairros periferia",
        ];

        let records = (0..size)
            .map(|i| {
                let fake = fake_phrases[rng.gen_range(0..fake_phrases.len())];
                let real = true_phrases[rng.gen_range(0..true_phrases.len())];
                NewsRecord {
                    fake_title: format!("sintetico {}", i),
                    fake_text: format!("{} noticia {}", fake, i),
                    fake_link: String::new(),
                    true_text: format!("{} noticia {}", real, i),
                    true_link: String::new(),
                }
            })
            .collect();

        Self::new("synthetic", records)
    }

    /// Number of labeled examples across all records
    pub fn example_count(&self) -> usize {
        self.records.iter().map(|r| r.examples().count()).sum()
    }

    pub fn label_distribution(&self) -> HashMap<Label, usize> {
        label_distribution(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "title_fake,fake_text,link_fake,true_text,link_true\n\
        t1,governo cria imposto absurdo,http://a,governo anuncia nova politica fiscal,http://b\n\
        t2,\"texto, com virgula\",http://c,,http://d\n\
        curto,so tres,campos\n";

    #[test]
    fn test_label_roundtrip() {
        assert_eq!("true".parse::<Label>().unwrap(), Label::True);
        assert_eq!("FAKE".parse::<Label>().unwrap(), Label::Fake);
        assert!(matches!(
            "maybe".parse::<Label>(),
            Err(ClassifierError::UnknownLabel(_))
        ));
        assert_eq!(Label::True.to_string(), "true");
        assert_eq!(Label::ALL.map(Label::index), [0, 1]);
        assert_eq!(Label::True.one_hot(), [1.0, 0.0]);
        assert_eq!(Label::Fake.one_hot(), [0.0, 1.0]);
    }

    #[test]
    fn test_record_examples_skip_blank_sides() {
        let both = NewsRecord::new("falso", "verdadeiro");
        let labels: Vec<Label> = both.examples().map(|e| e.label).collect();
        assert_eq!(labels, vec![Label::Fake, Label::True]);

        let only_true = NewsRecord::new("   \n", "verdadeiro");
        let examples: Vec<_> = only_true.examples().collect();
        assert_eq!(examples.len(), 1);
        assert_eq!(examples[0].label, Label::True);

        assert_eq!(NewsRecord::default().examples().count(), 0);
    }

    #[test]
    fn test_csv_parsing() {
        let corpus = Corpus::from_csv_reader("inline", CSV.as_bytes()).unwrap();

        // The three-field row is skipped
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.records[0].fake_title, "t1");
        assert_eq!(corpus.records[1].fake_text, "texto, com virgula");
        assert_eq!(corpus.example_count(), 3);

        let dist = corpus.label_distribution();
        assert_eq!(dist[&Label::Fake], 2);
        assert_eq!(dist[&Label::True], 1);
    }

    #[test]
    fn test_load_csv_from_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let corpus = Corpus::load_csv(file.path()).unwrap();
        assert_eq!(corpus.len(), 2);
        assert!(!corpus.name.is_empty());
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = Corpus::load_csv(Path::new("/nonexistent/corpus.csv")).unwrap_err();
        assert!(err.to_string().contains("Failed to open corpus file"));
    }

    #[test]
    fn test_synthetic_corpus() {
        let corpus = Corpus::synthetic(20, 42);
        assert_eq!(corpus.len(), 20);
        assert_eq!(corpus.example_count(), 40);

        let again = Corpus::synthetic(20, 42);
        assert_eq!(corpus.records, again.records);
    }

    #[test]
    fn test_ensure_trainable() {
        assert!(ensure_trainable(&[NewsRecord::new("a b", "c d")]).is_ok());
        assert_eq!(
            ensure_trainable(&[NewsRecord::new("", "so verdade")]),
            Err(ClassifierError::InsufficientTrainingData { label: Label::Fake })
        );
        assert_eq!(
            ensure_trainable(&[]),
            Err(ClassifierError::InsufficientTrainingData { label: Label::True })
        );
    }
}
