// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Feedforward bag-of-words classifier
//!
//! One sigmoid hidden layer and a two-unit sigmoid output layer (`[true, fake]`)
//! trained online with plain backpropagation. Inputs are 0/1 presence flags over
//! the most frequent training tokens.
//!
//! Activations are returned by [`FeedforwardClassifier::forward`] and threaded
//! through the backward pass; neurons only hold parameters.

use crate::classifier::{
    ClassProbabilities, ClassificationResult, ClassifierKind, NewsClassifier, TOP_TOKENS,
};
use crate::corpus::{ensure_trainable, Label, NewsRecord};
use crate::error::{ClassifierError, Result};
use crate::preprocess::TextPreprocessor;
use crate::vocabulary::Vocabulary;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Output units, one per label
pub const OUTPUT_SIZE: usize = 2;

/// Initial weights and biases are drawn from `[-INIT_RANGE, INIT_RANGE)`
const INIT_RANGE: f64 = 0.1;

/// Epoch error is logged every this many epochs
const LOG_INTERVAL: usize = 10;

/// Network shape and training schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpConfig {
    /// Vocabulary cap and input width
    pub input_size: usize,
    pub hidden_size: usize,
    pub learning_rate: f64,
    pub epochs: usize,
    /// Seeds weight initialization only
    pub seed: u64,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            input_size: 1000,
            hidden_size: 50,
            learning_rate: 0.01,
            epochs: 100,
            seed: 42,
        }
    }
}

impl MlpConfig {
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(ClassifierError::InvalidConfig(
                "input_size must be at least 1".to_string(),
            ));
        }
        if self.hidden_size == 0 {
            return Err(ClassifierError::InvalidConfig(
                "hidden_size must be at least 1".to_string(),
            ));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(ClassifierError::InvalidConfig(format!(
                "learning_rate must be finite and positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone)]
struct Neuron {
    weights: Vec<f64>,
    bias: f64,
}

impl Neuron {
    fn random(inputs: usize, rng: &mut ChaCha8Rng) -> Self {
        // Bias is drawn before the weights
        let bias = rng.gen_range(-INIT_RANGE..INIT_RANGE);
        let weights = (0..inputs)
            .map(|_| rng.gen_range(-INIT_RANGE..INIT_RANGE))
            .collect();
        Self { weights, bias }
    }

    fn activate(&self, input: &[f64]) -> f64 {
        let sum: f64 = self
            .weights
            .iter()
            .zip(input)
            .map(|(w, x)| w * x)
            .sum();
        sigmoid(self.bias + sum)
    }
}

#[derive(Debug, Clone)]
struct Layer {
    neurons: Vec<Neuron>,
}

impl Layer {
    fn random(size: usize, inputs: usize, rng: &mut ChaCha8Rng) -> Self {
        Self {
            neurons: (0..size).map(|_| Neuron::random(inputs, rng)).collect(),
        }
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.neurons.iter().map(|n| n.activate(input)).collect()
    }

    fn apply_deltas(&mut self, deltas: &[f64], input: &[f64], learning_rate: f64) {
        for (neuron, delta) in self.neurons.iter_mut().zip(deltas) {
            let step = learning_rate * delta;
            for (w, x) in neuron.weights.iter_mut().zip(input) {
                *w += step * x;
            }
            neuron.bias += step;
        }
    }
}

/// Per-layer outputs of one forward pass
#[derive(Debug, Clone, PartialEq)]
pub struct Activations {
    pub hidden: Vec<f64>,
    pub output: Vec<f64>,
}

/// Multilayer perceptron over a capped bag-of-words vocabulary
#[derive(Debug, Clone)]
pub struct FeedforwardClassifier {
    config: MlpConfig,
    preprocessor: TextPreprocessor,
    hidden: Layer,
    output: Layer,
    vocabulary: Option<Vocabulary>,
    epoch_errors: Vec<f64>,
}

impl FeedforwardClassifier {
    pub fn new(config: MlpConfig, preprocessor: TextPreprocessor) -> Result<Self> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let hidden = Layer::random(config.hidden_size, config.input_size, &mut rng);
        let output = Layer::random(OUTPUT_SIZE, config.hidden_size, &mut rng);

        Ok(Self {
            config,
            preprocessor,
            hidden,
            output,
            vocabulary: None,
            epoch_errors: Vec::new(),
        })
    }

    pub fn config(&self) -> &MlpConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    /// Sum of squared output errors for each completed epoch
    pub fn epoch_errors(&self) -> &[f64] {
        &self.epoch_errors
    }

    fn vectorize(&self, vocabulary: &Vocabulary, tokens: &[String]) -> Vec<f64> {
        let mut vector = vec![0.0; self.config.input_size];
        for index in tokens.iter().filter_map(|t| vocabulary.get(t)) {
            vector[index] = 1.0;
        }
        vector
    }

    /// Presence vector of `text` over the trained vocabulary
    pub fn text_to_vector(&self, text: &str) -> Result<Vec<f64>> {
        let vocabulary = self.vocabulary.as_ref().ok_or(ClassifierError::NotTrained)?;
        Ok(self.vectorize(vocabulary, &self.preprocessor.preprocess(text)))
    }

    pub fn forward(&self, input: &[f64]) -> Activations {
        let hidden = self.hidden.forward(input);
        let output = self.output.forward(&hidden);
        Activations { hidden, output }
    }

    /// One gradient step. Every delta is computed from the pre-update weights.
    fn backward(&mut self, input: &[f64], activations: &Activations, target: &[f64; OUTPUT_SIZE]) {
        let output_deltas: Vec<f64> = activations
            .output
            .iter()
            .zip(target)
            .map(|(o, t)| (t - o) * o * (1.0 - o))
            .collect();

        let hidden_deltas: Vec<f64> = activations
            .hidden
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let error: f64 = self
                    .output
                    .neurons
                    .iter()
                    .zip(&output_deltas)
                    .map(|(n, d)| d * n.weights[i])
                    .sum();
                error * h * (1.0 - h)
            })
            .collect();

        let lr = self.config.learning_rate;
        self.output.apply_deltas(&output_deltas, &activations.hidden, lr);
        self.hidden.apply_deltas(&hidden_deltas, input, lr);
    }
}

impl NewsClassifier for FeedforwardClassifier {
    fn train(&mut self, records: &[NewsRecord]) -> Result<()> {
        if self.is_trained() {
            return Err(ClassifierError::AlreadyTrained);
        }
        ensure_trainable(records)?;

        let vocabulary = Vocabulary::ranked(records, &self.preprocessor, self.config.input_size);

        let examples: Vec<(Vec<f64>, [f64; OUTPUT_SIZE])> = records
            .iter()
            .flat_map(NewsRecord::examples)
            .map(|example| {
                let tokens = self.preprocessor.preprocess(example.text);
                (self.vectorize(&vocabulary, &tokens), example.label.one_hot())
            })
            .collect();

        tracing::info!(
            "Training MLP on {} examples ({} vocabulary tokens, {} epochs)",
            examples.len(),
            vocabulary.len(),
            self.config.epochs
        );

        for epoch in 0..self.config.epochs {
            let mut total_error = 0.0;

            for (input, target) in &examples {
                let activations = self.forward(input);
                total_error += activations
                    .output
                    .iter()
                    .zip(target)
                    .map(|(o, t)| (t - o).powi(2))
                    .sum::<f64>();
                self.backward(input, &activations, target);
            }

            if epoch % LOG_INTERVAL == 0 {
                tracing::debug!("Epoch {}/{}, error: {:.6}", epoch, self.config.epochs, total_error);
            }
            self.epoch_errors.push(total_error);
        }

        self.vocabulary = Some(vocabulary);
        tracing::info!("MLP training complete");
        Ok(())
    }

    fn classify_with_detail(&self, text: &str) -> Result<ClassificationResult> {
        let vocabulary = self.vocabulary.as_ref().ok_or(ClassifierError::NotTrained)?;
        let tokens = self.preprocessor.preprocess(text);
        let output = self.forward(&self.vectorize(vocabulary, &tokens)).output;

        let slots = [output[Label::True.index()], output[Label::Fake.index()]];
        let label = if slots[Label::True.index()] > slots[Label::Fake.index()] {
            Label::True
        } else {
            Label::Fake
        };

        // Every in-vocabulary occurrence counts, repeats included
        let top_tokens = tokens
            .into_iter()
            .filter(|t| vocabulary.contains(t))
            .take(TOP_TOKENS)
            .collect();

        Ok(ClassificationResult {
            label,
            confidence: slots[label.index()] * 100.0,
            probabilities: ClassProbabilities::from_slots(slots.map(|p| p * 100.0)),
            top_tokens,
        })
    }

    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Mlp
    }

    fn description(&self) -> &str {
        "Feedforward network over a capped bag-of-words vocabulary"
    }

    fn is_trained(&self) -> bool {
        self.vocabulary.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAKE: [&str; 5] = [
        "urgente governo esconde verdade chocante vacinas",
        "compartilhe antes apaguem escandalo secreto revelado",
        "medico revela cura milagrosa proibida industria",
        "politico corrupto flagrado roubando bilhoes fonte anonima",
        "exclusivo conspiracao internacional contra brasileiros exposta",
    ];

    const TRUE: [&str; 5] = [
        "ministerio publica relatorio oficial vacinacao nacional",
        "pesquisa universidade aponta crescimento economico moderado",
        "tribunal julga recurso apresentado defesa semana",
        "instituto divulga dados atualizados desemprego regional",
        "prefeitura anuncia obras saneamento bairros periferia",
    ];

    fn records() -> Vec<NewsRecord> {
        FAKE.iter()
            .zip(TRUE.iter())
            .map(|(f, t)| NewsRecord::new(*f, *t))
            .collect()
    }

    fn config() -> MlpConfig {
        MlpConfig {
            input_size: 100,
            hidden_size: 8,
            learning_rate: 1.0,
            epochs: 500,
            seed: 7,
        }
    }

    fn trained(config: MlpConfig) -> FeedforwardClassifier {
        let mut mlp = FeedforwardClassifier::new(config, TextPreprocessor::default()).unwrap();
        mlp.train(&records()).unwrap();
        mlp
    }

    #[test]
    fn test_default_config() {
        let config = MlpConfig::default();
        assert_eq!(config.input_size, 1000);
        assert_eq!(config.hidden_size, 50);
        assert!((config.learning_rate - 0.01).abs() < 1e-12);
        assert_eq!(config.epochs, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_config() {
        for bad in [
            MlpConfig { input_size: 0, ..MlpConfig::default() },
            MlpConfig { hidden_size: 0, ..MlpConfig::default() },
            MlpConfig { learning_rate: 0.0, ..MlpConfig::default() },
            MlpConfig { learning_rate: f64::NAN, ..MlpConfig::default() },
        ] {
            assert!(matches!(
                FeedforwardClassifier::new(bad, TextPreprocessor::default()),
                Err(ClassifierError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_initial_weights_in_range() {
        let mlp = FeedforwardClassifier::new(config(), TextPreprocessor::default()).unwrap();
        assert_eq!(mlp.hidden.neurons.len(), 8);
        assert_eq!(mlp.output.neurons.len(), OUTPUT_SIZE);
        for neuron in mlp.hidden.neurons.iter().chain(&mlp.output.neurons) {
            assert!((-0.1..0.1).contains(&neuron.bias));
            assert!(neuron.weights.iter().all(|w| (-0.1..0.1).contains(w)));
        }
        assert_eq!(mlp.hidden.neurons[0].weights.len(), 100);
        assert_eq!(mlp.output.neurons[0].weights.len(), 8);
    }

    #[test]
    fn test_forward_shapes_and_range() {
        let mlp = FeedforwardClassifier::new(config(), TextPreprocessor::default()).unwrap();
        let activations = mlp.forward(&[1.0; 100]);
        assert_eq!(activations.hidden.len(), 8);
        assert_eq!(activations.output.len(), OUTPUT_SIZE);
        assert!(activations
            .hidden
            .iter()
            .chain(&activations.output)
            .all(|a| *a > 0.0 && *a < 1.0));
    }

    #[test]
    fn test_learns_separable_corpus() {
        let mlp = trained(config());

        for text in FAKE {
            assert_eq!(mlp.classify(text).unwrap().label, Label::Fake, "{}", text);
        }
        for text in TRUE {
            assert_eq!(mlp.classify(text).unwrap().label, Label::True, "{}", text);
        }

        let errors = mlp.epoch_errors();
        assert_eq!(errors.len(), 500);
        assert!(errors[errors.len() - 1] < errors[0]);
    }

    #[test]
    fn test_detail_output() {
        let mlp = trained(config());
        let result = mlp
            .classify_with_detail("Urgente: governo esconde a verdade! Governo mente. palavrainedita")
            .unwrap();

        assert!((result.confidence - result.probabilities.get(result.label)).abs() < 1e-9);
        assert!(result.probabilities.get(result.label) >= result.probabilities.get(result.label.other()));
        assert_eq!(
            result.top_tokens,
            vec!["urgente", "governo", "esconde", "verdade", "governo"]
        );
    }

    #[test]
    fn test_top_tokens_keep_repeats() {
        let mlp = trained(config().with_epochs(20));
        let result = mlp
            .classify_with_detail("governo governo urgente inedito governo")
            .unwrap();
        assert_eq!(result.top_tokens, vec!["governo", "governo", "urgente", "governo"]);

        let repeated = "vacinas ".repeat(TOP_TOKENS + 3);
        let result = mlp.classify_with_detail(&repeated).unwrap();
        assert_eq!(result.top_tokens.len(), TOP_TOKENS);
        assert!(result.top_tokens.iter().all(|t| t == "vacinas"));
    }

    #[test]
    fn test_deterministic_with_same_seed() {
        let a = trained(config());
        let b = trained(config());
        let text = "governo publica relatorio sobre vacinas";
        assert_eq!(
            a.classify_with_detail(text).unwrap(),
            b.classify_with_detail(text).unwrap()
        );
    }

    #[test]
    fn test_vocabulary_capped_to_input_size() {
        let mlp = trained(MlpConfig {
            input_size: 5,
            epochs: 2,
            ..config()
        });
        let vocabulary = mlp.vocabulary().unwrap();
        assert_eq!(vocabulary.len(), 5);

        let vector = mlp.text_to_vector(FAKE[0]).unwrap();
        assert_eq!(vector.len(), 5);
        assert!(vector.iter().all(|v| *v == 0.0 || *v == 1.0));
    }

    #[test]
    fn test_empty_text_after_training() {
        let mlp = trained(config().with_epochs(20));
        let result = mlp.classify_with_detail("").unwrap();
        assert!((0.0..=100.0).contains(&result.confidence));
        assert!(result.top_tokens.is_empty());
        assert!(mlp.text_to_vector("").unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_lifecycle_errors() {
        let mut mlp = FeedforwardClassifier::new(config(), TextPreprocessor::default()).unwrap();
        assert_eq!(mlp.classify("texto"), Err(ClassifierError::NotTrained));
        assert_eq!(mlp.text_to_vector("texto"), Err(ClassifierError::NotTrained));

        assert_eq!(
            mlp.train(&[NewsRecord::new("apenas falso aqui", "")]),
            Err(ClassifierError::InsufficientTrainingData { label: Label::True })
        );
        assert!(!mlp.is_trained());

        mlp.train(&records()).unwrap();
        assert_eq!(mlp.train(&records()), Err(ClassifierError::AlreadyTrained));
    }
}
