//! Tokenizer configuration.
//!
//! Defaults reproduce the SmolLM2 / GPT-2 family setup. A config can also be
//! deserialized from JSON; missing fields fall back to their defaults.

use serde::Deserialize;

use crate::{pretokenizer::GPT2_SPLIT_PATTERN, types::TokenId};

/// How the characters of a word become initial BPE symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolMode {
    /// One symbol per character. Characters below U+0100 go through the
    /// byte map (so a space becomes `Ġ`); all others pass through as-is.
    #[default]
    CodePoint,
    /// One symbol per UTF-8 byte, each through the byte map.
    Utf8Bytes,
}

/// Settings applied when building a [`crate::Tokenizer`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    /// Pre-tokenizer split pattern (fancy-regex syntax).
    pub pattern: String,

    /// Initial symbol construction.
    pub symbol_mode: SymbolMode,

    /// Marker strings matched literally before pre-tokenization.
    ///
    /// Only those present in the vocabulary take effect; each is emitted as
    /// its own ID instead of being split into byte pieces.
    pub special_tokens: Vec<String>,

    /// Strings probed, in order, for the BOS ID.
    pub bos_candidates: Vec<String>,

    /// BOS ID used when no candidate is in the vocabulary.
    pub bos_default: TokenId,

    /// Strings probed, in order, for the EOS ID.
    pub eos_candidates: Vec<String>,

    /// EOS ID used when no candidate is in the vocabulary.
    pub eos_default: TokenId,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>();
        Self {
            pattern: GPT2_SPLIT_PATTERN.to_owned(),
            symbol_mode: SymbolMode::CodePoint,
            special_tokens: owned(&["<|im_start|>", "<|im_end|>", "<|endoftext|>", "<s>", "</s>"]),
            bos_candidates: owned(&["<|im_start|>", "<s>"]),
            bos_default: 1,
            eos_candidates: owned(&["<|im_end|>", "</s>"]),
            eos_default: 2,
        }
    }
}

impl TokenizerConfig {
    /// Parses a JSON config; absent fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Same config with a different symbol mode.
    #[must_use]
    pub fn with_symbol_mode(mut self, mode: SymbolMode) -> Self {
        self.symbol_mode = mode;
        self
    }

    /// Same config with no literal special-token matching.
    #[must_use]
    pub fn without_special_tokens(mut self) -> Self {
        self.special_tokens.clear();
        self
    }
}
