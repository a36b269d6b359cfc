//! Merge-rank table loaded from a `merges.txt` resource.
//!
//! Each rule is a pair of symbols; its position in the file is its rank and
//! lower ranks merge first. Pairs not in the table never merge.

use std::collections::HashMap;

use crate::{
    error::MergeError,
    types::{Rank, SymbolPair},
};

/// Ordered merge rules plus a `(left, right) -> rank` lookup.
#[derive(Debug, Clone, Default)]
pub struct MergeTable {
    /// Rules in priority order; index = rank.
    pairs: Vec<SymbolPair>,

    /// left -> right -> rank.
    ///
    /// Nested so that lookups can borrow `&str` halves without allocating.
    ranks: HashMap<String, HashMap<String, Rank>>,
}

impl MergeTable {
    /// Builds a table from pairs in priority order.
    ///
    /// # Arguments
    ///
    /// * `pairs` - Merge rules; the position of each rule is its rank.
    ///
    /// A pair listed more than once takes the rank of its last occurrence.
    pub fn from_pairs(pairs: impl IntoIterator<Item = SymbolPair>) -> Self {
        let pairs: Vec<SymbolPair> = pairs.into_iter().collect();
        let mut ranks: HashMap<String, HashMap<String, Rank>> = HashMap::new();

        for (rank, SymbolPair(left, right)) in pairs.iter().enumerate() {
            ranks
                .entry(left.clone())
                .or_default()
                .insert(right.clone(), rank);
        }

        Self { pairs, ranks }
    }

    /// Parses `merges.txt` content.
    ///
    /// # Arguments
    ///
    /// * `text` - The whole resource, header line included.
    ///
    /// The first line is a version header and is skipped, as are blank
    /// lines. Every other line must hold two whitespace-separated symbols;
    /// anything after the second is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::MissingSecondSymbol`] for a line with a single
    /// symbol.
    pub fn parse(text: &str) -> Result<Self, MergeError> {
        let mut pairs = Vec::new();
        for (idx, line) in text.lines().enumerate().skip(1) {
            if let Some(pair) = parse_line(idx + 1, line)? {
                pairs.push(pair);
            }
        }
        Ok(Self::from_pairs(pairs))
    }

    /// Rank of the pair `(left, right)`, or `None` if it never merges.
    #[inline]
    pub fn rank(&self, left: &str, right: &str) -> Option<Rank> {
        self.ranks.get(left)?.get(right).copied()
    }

    /// Rules in priority order.
    pub fn pairs(&self) -> &[SymbolPair] {
        &self.pairs
    }

    /// Number of rules, duplicates included.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the table has no rules.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn parse_line(line_no: usize, line: &str) -> Result<Option<SymbolPair>, MergeError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(left), Some(right)) => Ok(Some(SymbolPair(left.to_owned(), right.to_owned()))),
        _ => Err(MergeError::MissingSecondSymbol {
            line: line_no,
            content: line.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_header_and_blank_lines() {
        let table = MergeTable::parse("#version: 0.2\nĠ t\n\nh e\n").expect("valid merges");
        assert_eq!(table.len(), 2);
        assert_eq!(table.rank("Ġ", "t"), Some(0));
        assert_eq!(table.rank("h", "e"), Some(1));
    }

    #[test]
    fn test_header_is_skipped_even_if_it_looks_like_a_rule() {
        let table = MergeTable::parse("a b\nc d").expect("valid merges");
        assert_eq!(table.rank("a", "b"), None);
        assert_eq!(table.rank("c", "d"), Some(0));
    }

    #[test]
    fn test_missing_second_symbol_fails() {
        let result = MergeTable::parse("#version: 0.2\na b\nc\n");
        assert_eq!(
            result.map(|t| t.len()),
            Err(MergeError::MissingSecondSymbol {
                line: 3,
                content: String::from("c"),
            })
        );
    }

    #[test]
    fn test_unknown_pair_has_no_rank() {
        let table = MergeTable::from_pairs(vec![SymbolPair("a".into(), "b".into())]);
        assert_eq!(table.rank("b", "a"), None);
        assert_eq!(table.rank("x", "y"), None);
    }

    #[test]
    fn test_duplicate_pair_keeps_last_rank() {
        let table = MergeTable::from_pairs(vec![
            SymbolPair("a".into(), "b".into()),
            SymbolPair("c".into(), "d".into()),
            SymbolPair("a".into(), "b".into()),
        ]);
        assert_eq!(table.rank("a", "b"), Some(2));
        assert_eq!(table.rank("c", "d"), Some(1));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_empty_resource() {
        assert!(MergeTable::parse("").expect("valid merges").is_empty());
    }
}
