//! Prompt formatting applied in front of the tokenizer.
//!
//! The template decides what wrapper text surrounds a raw prompt. It knows
//! nothing about merges or vocabularies and can be swapped per tokenizer.

use std::{borrow::Cow, fmt};

/// Formats a raw user prompt into model input text.
pub trait ChatTemplate: fmt::Debug + Send + Sync {
    /// Wraps `prompt`.
    fn apply<'a>(&self, prompt: &'a str) -> Cow<'a, str>;
}

/// ChatML single-turn template used by SmolLM2 / Qwen instruct models.
///
/// `<|im_start|>{user}\n{prompt}<|im_end|>\n<|im_start|>{assistant}\n`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMl {
    /// Role name of the prompt author.
    pub user_role: String,
    /// Role name the model answers as.
    pub assistant_role: String,
}

impl Default for ChatMl {
    fn default() -> Self {
        Self {
            user_role: String::from("user"),
            assistant_role: String::from("assistant"),
        }
    }
}

impl ChatTemplate for ChatMl {
    fn apply<'a>(&self, prompt: &'a str) -> Cow<'a, str> {
        Cow::Owned(format!(
            "<|im_start|>{}\n{prompt}<|im_end|>\n<|im_start|>{}\n",
            self.user_role, self.assistant_role
        ))
    }
}

/// Leaves the prompt untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Verbatim;

impl ChatTemplate for Verbatim {
    fn apply<'a>(&self, prompt: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(prompt)
    }
}
