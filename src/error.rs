//! Error types for tokenizer construction and batch operations.
//!
//! Only resource loading can hard-fail. Encoding and decoding of arbitrary
//! input never produce an error; see [`crate::Tokenizer::decode_detailed`]
//! for the recoverable decode path.

use std::{error::Error, fmt, io};

use indicatif::style::TemplateError;

use crate::types::TokenId;

/// Errors raised while parsing the vocabulary resource.
#[derive(Debug)]
pub enum VocabError {
    /// The resource is not valid JSON.
    Json(serde_json::Error),
    /// The top-level JSON value is not an object.
    NotAnObject,
    /// A vocabulary value is not a non-negative integer.
    InvalidId {
        /// Token string whose value was rejected.
        token: String,
        /// The offending JSON value, rendered.
        value: String,
    },
    /// Two token strings share the same ID.
    DuplicateId {
        /// The shared ID.
        id: TokenId,
        /// Token string seen first.
        first: String,
        /// Token string seen second.
        second: String,
    },
}

impl fmt::Display for VocabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(e) => write!(f, "vocabulary is not valid JSON: {e}"),
            Self::NotAnObject => write!(f, "vocabulary must be a JSON object"),
            Self::InvalidId { token, value } => {
                write!(f, "vocabulary entry {token:?} has non-integer id {value}")
            }
            Self::DuplicateId { id, first, second } => {
                write!(f, "token id {id} assigned to both {first:?} and {second:?}")
            }
        }
    }
}

impl Error for VocabError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for VocabError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Errors raised while parsing the merge-rule resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// A merge line holds fewer than two symbols.
    MissingSecondSymbol {
        /// 1-based line number in the raw resource (header included).
        line: usize,
        /// The offending line.
        content: String,
    },
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSecondSymbol { line, content } => {
                write!(f, "merge rule on line {line} needs two symbols: {content:?}")
            }
        }
    }
}

impl Error for MergeError {}

/// Errors that can occur when initializing a tokenizer.
#[derive(Debug)]
pub enum TokenizerInitError {
    /// The vocabulary resource was malformed.
    Vocab(VocabError),
    /// The merge resource was malformed.
    Merges(MergeError),
    /// The split pattern or the special-token pattern failed to compile.
    InvalidPattern(fancy_regex::Error),
    /// A resource could not be read.
    Io(io::Error),
}

impl fmt::Display for TokenizerInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vocab(e) => write!(f, "failed to load vocabulary: {e}"),
            Self::Merges(e) => write!(f, "failed to load merges: {e}"),
            Self::InvalidPattern(e) => write!(f, "invalid split pattern: {e}"),
            Self::Io(e) => write!(f, "failed to read tokenizer resource: {e}"),
        }
    }
}

impl Error for TokenizerInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Vocab(e) => Some(e),
            Self::Merges(e) => Some(e),
            Self::InvalidPattern(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<VocabError> for TokenizerInitError {
    fn from(e: VocabError) -> Self {
        Self::Vocab(e)
    }
}

impl From<MergeError> for TokenizerInitError {
    fn from(e: MergeError) -> Self {
        Self::Merges(e)
    }
}

impl From<fancy_regex::Error> for TokenizerInitError {
    fn from(e: fancy_regex::Error) -> Self {
        Self::InvalidPattern(e)
    }
}

impl From<io::Error> for TokenizerInitError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Errors that can occur during batch encoding or decoding.
#[derive(Debug)]
pub enum BatchError {
    /// Progress bar template string was invalid.
    ProgressBarSetup(TemplateError),
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProgressBarSetup(msg) => write!(f, "template parsing failed: {msg}"),
        }
    }
}

impl Error for BatchError {}

impl From<TemplateError> for BatchError {
    fn from(e: TemplateError) -> Self {
        Self::ProgressBarSetup(e)
    }
}
