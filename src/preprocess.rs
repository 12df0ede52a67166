// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Text normalization shared by every model
//!
//! Both classifiers must see byte-for-byte identical tokens, otherwise
//! vocabulary indices learned at training time stop meaning anything at
//! inference time. Tokenization is therefore a pure function of the text and
//! an explicit, immutable stop-word set.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Anything that is not a Unicode letter or whitespace
static NON_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\s]").expect("non-letter pattern is valid"));

/// Tokens must be longer than this many characters
const MIN_TOKEN_CHARS: usize = 1;

/// Portuguese stop words of the FakeTrue.Br corpus
pub const PORTUGUESE_STOP_WORDS: &[&str] = &[
    "a", "o", "e", "é", "de", "do", "da", "em", "um", "para", "com", "não", "uma", "os", "no",
    "se", "na", "por", "mais", "as", "dos", "como", "mas", "foi", "ao", "ele", "das", "tem",
    "à", "seu", "sua", "ou", "ser", "quando", "muito", "há", "nos", "já", "está", "eu",
    "também", "só", "pelo", "pela", "até", "isso", "ela", "entre", "era", "depois", "sem",
    "mesmo", "aos", "ter", "seus", "suas", "minha", "têm", "numa", "num", "eles", "você",
    "esse", "esses", "essas", "meu", "minhas", "teu", "tuas", "nosso", "nossa", "nossos",
    "nossas", "dela", "delas", "esta", "estes", "estas", "aquele", "aquela", "aqueles",
    "aquelas", "isto", "aquilo", "estou", "estamos", "estão", "estava", "estávamos",
    "estavam", "estive", "esteve", "estivemos", "estiveram", "estivera", "estivéramos",
    "esteja", "estejamos", "estejam", "estivesse", "estivéssemos", "estivessem", "estiver",
    "estivermos", "estiverem", "hei", "havemos", "hão", "houve", "houvemos", "houveram",
    "houvera", "houvéramos", "haja", "hajamos", "hajam", "houvesse", "houvéssemos",
    "houvessem", "houver", "houvermos", "houverem", "houverei", "houverá", "houveremos",
    "houverão", "houveria", "houveríamos", "houveriam", "sou", "somos", "são", "éramos",
    "eram", "fui", "fomos", "foram", "fora", "fôramos", "seja", "sejamos", "sejam", "fosse",
    "fôssemos", "fossem", "for", "formos", "forem", "serei", "será", "seremos", "serão",
    "seria", "seríamos", "seriam", "tenho", "temos", "tinha", "tínhamos", "tinham", "tive",
    "teve", "tivemos", "tiveram", "tivera", "tivéramos", "tenha", "tenhamos", "tenham",
    "tivesse", "tivéssemos", "tivessem", "tiver", "tivermos", "tiverem", "terei", "terá",
    "teremos", "terão", "teria", "teríamos", "teriam",
];

/// Immutable stop-word set (stored lowercase)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn portuguese() -> Self {
        Self::new(PORTUGUESE_STOP_WORDS)
    }

    /// No stop words at all
    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(word)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Turns raw text into content tokens
#[derive(Debug, Clone)]
pub struct TextPreprocessor {
    stop_words: StopWords,
}

impl Default for TextPreprocessor {
    fn default() -> Self {
        Self::new(StopWords::portuguese())
    }
}

impl TextPreprocessor {
    pub fn new(stop_words: StopWords) -> Self {
        Self { stop_words }
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Lowercase, blank out non-letters, split on whitespace, then drop
    /// single-character tokens and stop words. Order follows the source text.
    pub fn preprocess(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let letters_only = NON_LETTER.replace_all(&lowered, " ");

        letters_only
            .split_whitespace()
            .filter(|token| token.chars().count() > MIN_TOKEN_CHARS)
            .filter(|token| !self.stop_words.contains(token))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_basic() {
        let pre = TextPreprocessor::default();
        let tokens = pre.preprocess("O Governo, de novo, CRIA um imposto absurdo!!! (2024)");
        assert_eq!(tokens, vec!["governo", "novo", "cria", "imposto", "absurdo"]);
    }

    #[test]
    fn test_preprocess_empty_and_garbage() {
        let pre = TextPreprocessor::default();
        assert!(pre.preprocess("").is_empty());
        assert!(pre.preprocess("   \t\n").is_empty());
        assert!(pre.preprocess("123 !!! ... 4.5 % a e o").is_empty());
    }

    #[test]
    fn test_single_letter_words_dropped() {
        let pre = TextPreprocessor::new(StopWords::none());
        assert_eq!(pre.preprocess("x y zz ç"), vec!["zz"]);
    }

    #[test]
    fn test_accented_letters_kept() {
        let pre = TextPreprocessor::default();
        assert_eq!(
            pre.preprocess("Eleição: ministério confirma informação."),
            vec!["eleição", "ministério", "confirma", "informação"]
        );
    }

    #[test]
    fn test_punctuation_splits_words() {
        let pre = TextPreprocessor::new(StopWords::none());
        assert_eq!(pre.preprocess("bolsa-familia/auxilio"), vec!["bolsa", "familia", "auxilio"]);
    }

    #[test]
    fn test_letter_only_token_is_lowercased() {
        let pre = TextPreprocessor::default();
        for word in ["Brasil", "VACINA", "saúde", "Política", "xy"] {
            assert_eq!(pre.preprocess(word), vec![word.to_lowercase()]);
        }
    }

    #[test]
    fn test_stop_words_are_configurable() {
        let text = "para o povo";
        assert_eq!(TextPreprocessor::default().preprocess(text), vec!["povo"]);
        assert_eq!(
            TextPreprocessor::new(StopWords::none()).preprocess(text),
            vec!["para", "povo"]
        );
        assert_eq!(
            TextPreprocessor::new(StopWords::new(["POVO"])).preprocess(text),
            vec!["para"]
        );
    }

    #[test]
    fn test_preprocess_is_idempotent() {
        let pre = TextPreprocessor::default();
        let samples = [
            "URGENTE!!! Compartilhe: o governo esconde a verdade sobre as vacinas.",
            "Ministério da Saúde divulga relatório (2023) com dados de vacinação.",
            "Ação, reação & emoção — não é só isso...",
            "",
        ];
        for text in samples {
            let once = pre.preprocess(text);
            let twice = pre.preprocess(&once.join(" "));
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_portuguese_list_loaded() {
        let stop_words = StopWords::portuguese();
        assert!(stop_words.contains("não"));
        assert!(stop_words.contains("teriam"));
        assert!(!stop_words.contains("governo"));
        assert_eq!(stop_words.len(), PORTUGUESE_STOP_WORDS.len());
    }
}
