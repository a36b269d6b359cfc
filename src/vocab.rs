//! Token-string ↔ ID vocabulary loaded from a `vocab.json` resource.

use std::{
    collections::{hash_map::Entry, HashMap},
    io::Read,
};

use serde_json::Value;

use crate::{error::VocabError, types::TokenId};

/// Bijection between token strings and integer IDs.
///
/// The inverse table is derived from the forward one at load time, so every
/// token that can be looked up by string can also be looked up by ID.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    encoder: HashMap<String, TokenId>,
    decoder: HashMap<TokenId, String>,
}

impl Vocabulary {
    /// Builds a vocabulary from `(token, id)` entries.
    ///
    /// # Errors
    ///
    /// Returns [`VocabError::InvalidId`] for a negative ID and
    /// [`VocabError::DuplicateId`] if two tokens share an ID.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (String, TokenId)>,
    ) -> Result<Self, VocabError> {
        let mut encoder = HashMap::new();
        let mut decoder = HashMap::new();

        for (token, id) in entries {
            if id < 0 {
                return Err(VocabError::InvalidId {
                    token,
                    value: id.to_string(),
                });
            }
            match decoder.entry(id) {
                Entry::Occupied(slot) => {
                    let first: &String = slot.get();
                    // the same (token, id) listed twice is harmless
                    if *first != token {
                        return Err(VocabError::DuplicateId {
                            id,
                            first: first.clone(),
                            second: token,
                        });
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(token.clone());
                }
            }
            encoder.insert(token, id);
        }

        Ok(Self { encoder, decoder })
    }

    /// Parses a JSON object mapping token strings to non-negative integers.
    ///
    /// # Arguments
    ///
    /// * `json` - Contents of `vocab.json`.
    ///
    /// # Errors
    ///
    /// Fails fast on invalid JSON, a non-object root, or any value that is
    /// not a non-negative integer.
    pub fn from_json(json: &str) -> Result<Self, VocabError> {
        let root: Value = serde_json::from_str(json)?;
        Self::from_value(root)
    }

    /// Like [`Vocabulary::from_json`], reading from `reader`.
    ///
    /// # Errors
    ///
    /// Same as [`Vocabulary::from_json`]; read failures surface as
    /// [`VocabError::Json`].
    pub fn from_reader(reader: impl Read) -> Result<Self, VocabError> {
        let root: Value = serde_json::from_reader(reader)?;
        Self::from_value(root)
    }

    fn from_value(root: Value) -> Result<Self, VocabError> {
        let Value::Object(map) = root else {
            return Err(VocabError::NotAnObject);
        };

        let mut entries = Vec::with_capacity(map.len());
        for (token, value) in map {
            let Some(id) = value.as_u64().and_then(|v| TokenId::try_from(v).ok()) else {
                return Err(VocabError::InvalidId {
                    token,
                    value: value.to_string(),
                });
            };
            entries.push((token, id));
        }

        Self::from_entries(entries)
    }

    /// ID of `token`, if it is in the vocabulary.
    #[inline]
    pub fn id(&self, token: &str) -> Option<TokenId> {
        self.encoder.get(token).copied()
    }

    /// Token string for `id`, if it is in the vocabulary.
    #[inline]
    pub fn token(&self, id: TokenId) -> Option<&str> {
        self.decoder.get(&id).map(String::as_str)
    }

    /// Whether `token` is in the vocabulary.
    pub fn contains(&self, token: &str) -> bool {
        self.encoder.contains_key(token)
    }

    /// First candidate present in the vocabulary, else `default`.
    pub fn probe<S: AsRef<str>>(&self, candidates: &[S], default: TokenId) -> TokenId {
        candidates
            .iter()
            .find_map(|c| self.id(c.as_ref()))
            .unwrap_or(default)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.encoder.len()
    }

    /// Whether the vocabulary has no entries.
    pub fn is_empty(&self) -> bool {
        self.encoder.is_empty()
    }
}
