//! This module provides the complete encoding pipeline:
//! 1. Chat-template formatting of the prompt.
//! 2. Literal matching of special tokens (e.g. `<|im_start|>`).
//! 3. Regex pre-tokenization of the text between them.
//! 4. BPE merging of each word and vocabulary lookup.
//!
//! and the reverse path from token IDs back to text. Batch variants run on
//! Rayon with an optional progress bar.

use std::{
    borrow::Cow,
    fs::File,
    io::{BufReader, Read},
    path::Path,
    sync::Arc,
};

use fancy_regex::Regex;
use indicatif::{
    style::TemplateError, ParallelProgressIterator, ProgressBar, ProgressDrawTarget,
    ProgressStyle,
};
use rayon::prelude::*;

use crate::{
    bpe::BpeMerger,
    config::TokenizerConfig,
    error::{BatchError, TokenizerInitError},
    merges::MergeTable,
    pretokenizer::PreTokenizer,
    template::{ChatMl, ChatTemplate},
    types::TokenId,
    vocab::Vocabulary,
};

/// Outcome of [`Tokenizer::decode_detailed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// The reconstructed bytes were valid UTF-8.
    Utf8(String),
    /// Byte reconstruction failed; the raw symbol string with the space and
    /// newline markers replaced.
    Fallback(String),
}

impl Decoded {
    /// The decoded text, whichever path produced it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Utf8(s) | Self::Fallback(s) => s,
        }
    }

    /// Consumes the outcome, returning the text.
    pub fn into_string(self) -> String {
        match self {
            Self::Utf8(s) | Self::Fallback(s) => s,
        }
    }

    /// Whether the fallback path was taken.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// A stretch of input that is either ordinary text or one special token.
#[derive(Debug, PartialEq, Eq)]
enum Segment<'t> {
    Text(&'t str),
    Special(&'t str),
}

/// Byte-level BPE tokenizer.
///
/// This struct encapsulates the complete pipeline by combining:
/// - A vocabulary and its inverse.
/// - A BPE merger with the merge-rank table.
/// - A compiled pre-tokenizer pattern.
/// - An optional literal pattern over special tokens.
/// - A chat template applied when `add_bos` is requested.
///
/// All tables are immutable after construction, so a `Tokenizer` can be
/// shared across threads and used concurrently.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    vocab: Vocabulary,
    merger: BpeMerger,
    pretokenizer: PreTokenizer,
    special: Option<Regex>,
    template: Arc<dyn ChatTemplate>,
    bos_token_id: TokenId,
    eos_token_id: TokenId,
}

impl Tokenizer {
    /// Creates a tokenizer from loaded tables.
    ///
    /// # Arguments
    ///
    /// * `vocab` - Token-string to ID mapping.
    /// * `merges` - Merge rules in priority order.
    /// * `config` - Split pattern, symbol mode, special tokens and BOS/EOS
    ///   probes.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerInitError::InvalidPattern`] if the split pattern in
    /// `config` or the special-token pattern fails to compile.
    pub fn new(
        vocab: Vocabulary,
        merges: MergeTable,
        config: TokenizerConfig,
    ) -> Result<Self, TokenizerInitError> {
        let pretokenizer = PreTokenizer::new(&config.pattern)?;
        let special = special_token_pattern(&vocab, &config.special_tokens)?;

        let bos_token_id = vocab.probe(&config.bos_candidates, config.bos_default);
        let eos_token_id = vocab.probe(&config.eos_candidates, config.eos_default);

        tracing::info!(
            vocab_size = vocab.len(),
            merges = merges.len(),
            bos_token_id,
            eos_token_id,
            symbol_mode = ?config.symbol_mode,
            "tokenizer ready"
        );

        Ok(Self {
            merger: BpeMerger::new(merges, config.symbol_mode),
            vocab,
            pretokenizer,
            special,
            template: Arc::new(ChatMl::default()),
            bos_token_id,
            eos_token_id,
        })
    }

    /// Creates a tokenizer from `vocab.json` and `merges.txt` contents with
    /// the default configuration.
    ///
    /// # Arguments
    ///
    /// * `vocab_json` - JSON object mapping token strings to IDs.
    /// * `merges_txt` - Version header followed by one merge rule per line.
    ///
    /// # Errors
    ///
    /// Fails fast if either resource is malformed; the tokenizer is never
    /// partially built.
    pub fn from_resources(vocab_json: &str, merges_txt: &str) -> Result<Self, TokenizerInitError> {
        Self::from_resources_with_config(vocab_json, merges_txt, TokenizerConfig::default())
    }

    /// Like [`Tokenizer::from_resources`] with an explicit configuration.
    ///
    /// # Errors
    ///
    /// See [`Tokenizer::from_resources`] and [`Tokenizer::new`].
    pub fn from_resources_with_config(
        vocab_json: &str,
        merges_txt: &str,
        config: TokenizerConfig,
    ) -> Result<Self, TokenizerInitError> {
        let vocab = Vocabulary::from_json(vocab_json)?;
        let merges = MergeTable::parse(merges_txt)?;
        Self::new(vocab, merges, config)
    }

    /// Reads both resources to the end and builds a tokenizer.
    ///
    /// # Errors
    ///
    /// Returns [`TokenizerInitError::Io`] if a read fails, otherwise see
    /// [`Tokenizer::from_resources`].
    pub fn from_readers(
        mut vocab: impl Read,
        mut merges: impl Read,
    ) -> Result<Self, TokenizerInitError> {
        let mut vocab_json = String::new();
        vocab.read_to_string(&mut vocab_json)?;
        let mut merges_txt = String::new();
        merges.read_to_string(&mut merges_txt)?;
        Self::from_resources(&vocab_json, &merges_txt)
    }

    /// Loads `vocab.json` and `merges.txt` from disk.
    ///
    /// # Arguments
    ///
    /// * `vocab_path` - Path to the vocabulary JSON file.
    /// * `merges_path` - Path to the merge rules file.
    ///
    /// # Errors
    ///
    /// See [`Tokenizer::from_readers`].
    pub fn from_files(
        vocab_path: impl AsRef<Path>,
        merges_path: impl AsRef<Path>,
    ) -> Result<Self, TokenizerInitError> {
        let vocab = BufReader::new(File::open(vocab_path)?);
        let merges = BufReader::new(File::open(merges_path)?);
        Self::from_readers(vocab, merges)
    }

    /// Replaces the template applied when `add_bos` is set.
    #[must_use]
    pub fn with_chat_template(mut self, template: impl ChatTemplate + 'static) -> Self {
        self.template = Arc::new(template);
        self
    }

    /// Encodes `text` into token IDs.
    ///
    /// With `add_bos`, the text is first wrapped by the chat template, whose
    /// start marker doubles as BOS; no extra BOS ID is prepended.
    ///
    /// # Arguments
    ///
    /// * `text` - Prompt to encode.
    /// * `add_bos` - Whether to apply the chat template first.
    ///
    /// # Returns
    ///
    /// IDs of the merged symbols in order. Symbols missing from the
    /// vocabulary are dropped.
    pub fn encode(&self, text: &str, add_bos: bool) -> Vec<TokenId> {
        let symbols = self.tokenize(&self.format(text, add_bos));

        let mut ids = Vec::with_capacity(symbols.len());
        let mut dropped = 0usize;
        for symbol in &symbols {
            match self.vocab.id(symbol) {
                Some(id) => ids.push(id),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            tracing::debug!(dropped, kept = ids.len(), "dropped out-of-vocabulary symbols");
        }

        ids
    }

    /// Splits already formatted text into final BPE symbols.
    ///
    /// Special tokens come out as single symbols; everything else is
    /// pre-tokenized and merged word by word. No vocabulary lookup happens
    /// here, so the result may contain symbols without an ID.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        // pre-allocate: merged symbols are usually a fraction of the bytes
        let mut symbols = Vec::with_capacity(text.len() / 3);

        for segment in self.split_on_special_tokens(text) {
            match segment {
                Segment::Special(token) => symbols.push(token.to_owned()),
                Segment::Text(chunk) => {
                    for word in self.pretokenizer.words(chunk) {
                        symbols.extend(self.merger.encode_word(word));
                    }
                }
            }
        }

        symbols
    }

    /// Decodes token IDs back into text.
    ///
    /// # Arguments
    ///
    /// * `ids` - Token IDs; unknown IDs contribute nothing.
    ///
    /// # Returns
    ///
    /// The reconstructed text, or the marker-replaced symbol string if the
    /// bytes are not valid UTF-8. Never fails; see
    /// [`Tokenizer::decode_detailed`] to tell the two paths apart.
    pub fn decode(&self, ids: &[TokenId]) -> String {
        self.decode_detailed(ids).into_string()
    }

    /// Decodes token IDs, reporting whether UTF-8 reconstruction succeeded.
    pub fn decode_detailed(&self, ids: &[TokenId]) -> Decoded {
        let joined: String = ids.iter().filter_map(|&id| self.vocab.token(id)).collect();

        let byte_map = self.merger.byte_map();
        match String::from_utf8(byte_map.to_bytes(&joined)) {
            Ok(text) => Decoded::Utf8(text),
            Err(e) => {
                tracing::debug!(error = %e, "decoded bytes are not UTF-8; using marker fallback");
                let text = joined
                    .replace(byte_map.symbol(b' '), " ")
                    .replace(byte_map.symbol(b'\n'), "\n");
                Decoded::Fallback(text)
            }
        }
    }

    /// Encodes many texts in parallel using Rayon.
    ///
    /// # Arguments
    ///
    /// * `texts` - Prompts to encode.
    /// * `add_bos` - Passed to [`Tokenizer::encode`] for every text.
    /// * `show_progress` - Whether to display a progress bar.
    ///
    /// # Returns
    ///
    /// Token sequences in the same order as `texts`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::ProgressBarSetup`] if the progress bar template
    /// fails to compile.
    pub fn encode_batch(
        &self,
        texts: &[&str],
        add_bos: bool,
        show_progress: bool,
    ) -> Result<Vec<Vec<TokenId>>, BatchError> {
        let pb = self.batch_progress(texts.len(), "Encoding texts", show_progress)?;

        Ok(texts
            .par_iter()
            .progress_with(pb)
            .map(|text| self.encode(text, add_bos))
            .collect())
    }

    /// Decodes many token sequences in parallel using Rayon.
    ///
    /// # Arguments
    ///
    /// * `id_seqs` - Token sequences to decode.
    /// * `show_progress` - Whether to display a progress bar.
    ///
    /// # Returns
    ///
    /// Decoded strings in the same order as `id_seqs`.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::ProgressBarSetup`] if the progress bar template
    /// fails to compile.
    pub fn decode_batch(
        &self,
        id_seqs: &[&[TokenId]],
        show_progress: bool,
    ) -> Result<Vec<String>, BatchError> {
        let pb = self.batch_progress(id_seqs.len(), "Decoding tokens", show_progress)?;

        Ok(id_seqs
            .par_iter()
            .progress_with(pb)
            .map(|ids| self.decode(ids))
            .collect())
    }

    /// ID used as beginning-of-sequence marker.
    pub fn bos_token_id(&self) -> TokenId {
        self.bos_token_id
    }

    /// ID used as end-of-sequence marker.
    pub fn eos_token_id(&self) -> TokenId {
        self.eos_token_id
    }

    /// Number of vocabulary entries.
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Number of merge rules.
    pub fn num_merges(&self) -> usize {
        self.merger.merges().len()
    }

    /// ID of `token`, if any.
    pub fn token_to_id(&self, token: &str) -> Option<TokenId> {
        self.vocab.id(token)
    }

    /// Token string of `id`, if any.
    pub fn id_to_token(&self, id: TokenId) -> Option<&str> {
        self.vocab.token(id)
    }

    /// Whether `token` is matched literally as a special token.
    pub fn is_special(&self, token: &str) -> bool {
        self.split_on_special_tokens(token) == [Segment::Special(token)]
    }

    fn format<'a>(&self, text: &'a str, add_bos: bool) -> Cow<'a, str> {
        if add_bos {
            self.template.apply(text)
        } else {
            Cow::Borrowed(text)
        }
    }

    /// Segments text into alternating normal and special-token spans.
    ///
    /// Empty normal spans (text starting with a special token, or two
    /// special tokens in a row) are not emitted.
    fn split_on_special_tokens<'t>(&self, text: &'t str) -> Vec<Segment<'t>> {
        let Some(re) = &self.special else {
            return vec![Segment::Text(text)];
        };

        let mut segments = Vec::new();
        let mut segment_start = 0;

        for mat in re.find_iter(text) {
            let mat = match mat {
                Ok(mat) => mat,
                Err(e) => {
                    tracing::warn!(error = %e, "special-token scan failed; treating rest as text");
                    break;
                }
            };

            if mat.start() > segment_start {
                // push normal segment first to preserve ordering
                segments.push(Segment::Text(&text[segment_start..mat.start()]));
            }
            segments.push(Segment::Special(mat.as_str()));
            segment_start = mat.end();
        }

        if segment_start < text.len() {
            segments.push(Segment::Text(&text[segment_start..]));
        }

        segments
    }

    /// Progress bar for a batch; hidden unless `show` is set.
    fn batch_progress(
        &self,
        len: usize,
        msg: &'static str,
        show: bool,
    ) -> Result<ProgressBar, BatchError> {
        if show {
            return Ok(self.progress_bar(len as u64, msg)?);
        }
        // create dummy progress bar and force to not render
        let pb = ProgressBar::new(len as u64);
        pb.set_draw_target(ProgressDrawTarget::hidden());
        Ok(pb)
    }

    /// Creates a styled progress bar with elapsed time, a fixed-width message
    /// label, and position/total counters.
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] if the progress bar style template is invalid.
    fn progress_bar(&self, size: u64, msg: impl Into<String>) -> Result<ProgressBar, TemplateError> {
        let style =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {msg:<30!} {wide_bar} {pos}/{len}")?;

        let pb = ProgressBar::new(size);
        pb.set_style(style);
        pb.set_message(msg.into());
        pb.enable_steady_tick(std::time::Duration::from_secs(1));

        Ok(pb)
    }
}

/// Compiles a literal alternation over the configured special tokens that
/// exist in `vocab`, longest first so that overlapping markers resolve to
/// the longest one.
fn special_token_pattern(
    vocab: &Vocabulary,
    candidates: &[String],
) -> Result<Option<Regex>, fancy_regex::Error> {
    let mut tokens: Vec<&str> = candidates
        .iter()
        .map(String::as_str)
        .filter(|t| !t.is_empty() && vocab.contains(t))
        .collect();
    if tokens.is_empty() {
        return Ok(None);
    }
    tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    tokens.dedup();

    // escape regex metachars in special tokens to avoid
    // undesired pattern match behavior.
    let pattern = tokens
        .iter()
        .map(|t| fancy_regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");

    Ok(Some(Regex::new(&pattern)?))
}
