//! Byte-level BPE tokenizer for GPT-2 family chat models.
//!
//! A [`Tokenizer`] is built once from a `vocab.json` mapping and a
//! `merges.txt` rule list, then turns prompts into token IDs and generated
//! IDs back into text:
//!
//! ```no_run
//! use bpetok::Tokenizer;
//!
//! # fn main() -> Result<(), bpetok::TokenizerInitError> {
//! let tokenizer = Tokenizer::from_files("vocab.json", "merges.txt")?;
//! let ids = tokenizer.encode("What is Rust?", true);
//! let text = tokenizer.decode(&ids);
//! # Ok(())
//! # }
//! ```
//!
//! Python bindings are available behind the `python` feature.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod bpe;
mod byte_map;
mod config;
mod error;
mod merges;
mod pretokenizer;
mod template;
mod tokenizer;
mod types;
mod vocab;

#[cfg(feature = "python")]
mod python;

pub use bpe::BpeMerger;
pub use byte_map::ByteSymbolMap;
pub use config::{SymbolMode, TokenizerConfig};
pub use error::{BatchError, MergeError, TokenizerInitError, VocabError};
pub use merges::MergeTable;
pub use pretokenizer::{PreTokenizer, Words, GPT2_SPLIT_PATTERN};
pub use template::{ChatMl, ChatTemplate, Verbatim};
pub use tokenizer::{Decoded, Tokenizer};
pub use types::{Rank, SymbolPair, TokenId};
pub use vocab::Vocabulary;
