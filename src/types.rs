//! Type aliases and shared types for BPE encoding and decoding.
//!
//! These type aliases provide semantic clarity throughout the codebase.

/// Represents a token identifier in the vocabulary.
///
/// Signed 64-bit to match the integer width model runtimes consume.
/// Vocabulary loading rejects negative values, so every live ID is `>= 0`.
pub type TokenId = i64;

/// Merge priority of a symbol pair.
///
/// Lower values represent earlier merges (e.g., 0 = first line of merges.txt).
/// Pairs missing from the table have no rank at all.
pub type Rank = usize;

/// A pair of adjacent symbols as listed in a merge rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolPair(pub String, pub String);
