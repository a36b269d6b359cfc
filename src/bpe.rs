//! BPE Merger - applies learned merge rules to the symbols of one word.
//!
//! Merges follow the rank order of `merges.txt`: at every step the adjacent
//! pair with the lowest rank is fused, the leftmost one on ties, until no
//! adjacent pair has a rank left. Instead of rescanning the word after each
//! merge, candidates sit in a min-heap keyed by (rank, position) and are
//! validated lazily when popped, which yields the same sequence of merges.

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::{
    byte_map::ByteSymbolMap,
    config::SymbolMode,
    merges::MergeTable,
    types::Rank,
};

/// Item in the priority queue for merge ordering.
///
/// Candidates are ordered by rank (lowest first) with position as a
/// tiebreaker, so the leftmost of equally ranked pairs merges first.
#[derive(Debug, PartialEq, Eq)]
struct MergeCandidate {
    /// Rank of the pair when the candidate was pushed.
    rank: Rank,

    /// Slot of the left symbol of the pair.
    ///
    /// Slots never move: a merge writes into the left slot and empties the
    /// right one, so slot order is sequence order.
    position: usize,
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed to get min-heap behavior out of BinaryHeap
        other
            .rank
            .cmp(&self.rank)
            .then_with(|| other.position.cmp(&self.position))
    }
}

/// Turns words into merged BPE symbols.
#[derive(Debug, Clone)]
pub struct BpeMerger {
    byte_map: ByteSymbolMap,
    merges: MergeTable,
    mode: SymbolMode,
}

impl BpeMerger {
    /// Creates a merger over `merges`.
    ///
    /// # Arguments
    ///
    /// * `merges` - Rank table consulted for every adjacent pair.
    /// * `mode` - How a word is cut into initial symbols.
    pub fn new(merges: MergeTable, mode: SymbolMode) -> Self {
        Self {
            byte_map: ByteSymbolMap::new(),
            merges,
            mode,
        }
    }

    /// Splits `word` into its initial, unmerged symbols.
    pub fn symbols(&self, word: &str) -> Vec<String> {
        match self.mode {
            SymbolMode::CodePoint => word
                .chars()
                .map(|c| match u8::try_from(u32::from(c)) {
                    Ok(b) => self.byte_map.symbol(b).to_string(),
                    Err(_) => c.to_string(),
                })
                .collect(),
            SymbolMode::Utf8Bytes => word
                .bytes()
                .map(|b| self.byte_map.symbol(b).to_string())
                .collect(),
        }
    }

    /// Symbols of `word` after all applicable merges.
    pub fn encode_word(&self, word: &str) -> Vec<String> {
        self.merge(self.symbols(word))
    }

    /// Applies merge rules to `symbols` until none applies.
    ///
    /// # Arguments
    ///
    /// * `symbols` - Initial symbols of one word.
    ///
    /// # Returns
    ///
    /// The merged symbols: the same or fewer, concatenating to the same
    /// string as the input. The lowest-ranked pair merges first, the
    /// leftmost one on ties.
    pub fn merge(&self, symbols: Vec<String>) -> Vec<String> {
        if symbols.len() <= 1 {
            return symbols;
        }

        // slots[i] = None once the symbol was absorbed by its left neighbor
        let mut slots: Vec<Option<String>> = symbols.into_iter().map(Some).collect();
        let mut heap = self.initialize_minheap(&slots);

        while let Some(candidate) = heap.pop() {
            let pos = candidate.position;
            let Some(right_idx) = next_live(&slots, pos) else {
                continue;
            };
            let (Some(left), Some(right)) = (slots[pos].as_deref(), slots[right_idx].as_deref())
            else {
                continue;
            };

            // ranks are unique per pair, so an equal rank means the same live pair
            if self.merges.rank(left, right) != Some(candidate.rank) {
                continue;
            }

            let Some(right) = slots[right_idx].take() else {
                continue;
            };
            if let Some(left) = slots[pos].as_mut() {
                left.push_str(&right);
            }

            self.track_new_merge_candidates(&mut heap, &slots, pos);
        }

        slots.into_iter().flatten().collect()
    }

    /// The byte map used for initial symbols.
    pub fn byte_map(&self) -> &ByteSymbolMap {
        &self.byte_map
    }

    /// The merge table.
    pub fn merges(&self) -> &MergeTable {
        &self.merges
    }

    /// Populates the queue with every initially mergeable adjacent pair.
    fn initialize_minheap(&self, slots: &[Option<String>]) -> BinaryHeap<MergeCandidate> {
        let mut heap = BinaryHeap::with_capacity(slots.len());
        for (position, pair) in slots.windows(2).enumerate() {
            if let [Some(left), Some(right)] = pair {
                if let Some(rank) = self.merges.rank(left, right) {
                    heap.push(MergeCandidate { rank, position });
                }
            }
        }
        heap
    }

    /// Queues the pairs the freshly merged symbol at `pos` forms with its
    /// live neighbors.
    fn track_new_merge_candidates(
        &self,
        heap: &mut BinaryHeap<MergeCandidate>,
        slots: &[Option<String>],
        pos: usize,
    ) {
        let Some(merged) = slots[pos].as_deref() else {
            return;
        };

        if let Some(left_idx) = prev_live(slots, pos) {
            if let Some(left) = slots[left_idx].as_deref() {
                if let Some(rank) = self.merges.rank(left, merged) {
                    heap.push(MergeCandidate {
                        rank,
                        position: left_idx,
                    });
                }
            }
        }

        if let Some(right_idx) = next_live(slots, pos) {
            if let Some(right) = slots[right_idx].as_deref() {
                if let Some(rank) = self.merges.rank(merged, right) {
                    heap.push(MergeCandidate {
                        rank,
                        position: pos,
                    });
                }
            }
        }
    }
}

/// Closest occupied slot after `pos`.
fn next_live(slots: &[Option<String>], pos: usize) -> Option<usize> {
    (pos + 1..slots.len()).find(|&i| slots[i].is_some())
}

/// Closest occupied slot before `pos`.
fn prev_live(slots: &[Option<String>], pos: usize) -> Option<usize> {
    (0..pos).rev().find(|&i| slots[i].is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymbolPair;

    fn merger(rules: &[(&str, &str)]) -> BpeMerger {
        let pairs = rules
            .iter()
            .map(|(l, r)| SymbolPair((*l).to_owned(), (*r).to_owned()));
        BpeMerger::new(MergeTable::from_pairs(pairs), SymbolMode::CodePoint)
    }

    fn strings(xs: &[&str]) -> Vec<String> {
        xs.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn test_merge_greediness() {
        let m = merger(&[("a", "b"), ("ab", "c")]);
        assert_eq!(m.encode_word("abc"), strings(&["abc"]));
    }

    #[test]
    fn test_lower_rank_wins_over_position() {
        // (b, c) outranks (a, b) even though (a, b) is further left
        let m = merger(&[("b", "c"), ("a", "b")]);
        assert_eq!(m.encode_word("abc"), strings(&["a", "bc"]));
    }

    #[test]
    fn test_tie_break_by_position() {
        let m = merger(&[("a", "a")]);
        assert_eq!(m.encode_word("aaa"), strings(&["aa", "a"]));
    }

    #[test]
    fn test_merge_skips_consumed_left() {
        let m = merger(&[("a", "b"), ("c", "d"), ("ab", "cd")]);
        assert_eq!(m.encode_word("abcd"), strings(&["abcd"]));
    }

    #[test]
    fn test_no_merge_rules_apply() {
        let m = merger(&[("x", "y")]);
        assert_eq!(m.encode_word("abc"), strings(&["a", "b", "c"]));
    }

    #[test]
    fn test_multiple_disjoint_merges() {
        let m = merger(&[("a", "a"), ("b", "b")]);
        assert_eq!(m.encode_word("aabb"), strings(&["aa", "bb"]));
    }

    #[test]
    fn test_empty_word() {
        let m = merger(&[("a", "b")]);
        assert!(m.encode_word("").is_empty());
    }

    #[test]
    fn test_single_symbol() {
        let m = merger(&[("a", "b")]);
        assert_eq!(m.encode_word("a"), strings(&["a"]));
    }

    #[test]
    fn test_leading_space_becomes_marker() {
        let m = merger(&[("Ġ", "h"), ("Ġh", "i")]);
        assert_eq!(m.encode_word(" hi"), strings(&["Ġhi"]));
    }

    #[test]
    fn test_code_point_mode_symbols() {
        let m = merger(&[]);
        // below U+0100 goes through the byte map; above passes through
        assert_eq!(m.symbols("\né世"), strings(&["Ċ", "é", "世"]));
    }

    #[test]
    fn test_utf8_bytes_mode_symbols() {
        let m = BpeMerger::new(MergeTable::default(), SymbolMode::Utf8Bytes);
        // 'é' is [0xC3, 0xA9]; both bytes are printable Latin-1
        assert_eq!(m.symbols("é"), strings(&["Ã", "©"]));
    }

    #[test]
    fn test_merge_preserves_concatenation() {
        let m = merger(&[("l", "l"), ("e", "ll"), ("h", "ell"), ("ell", "o")]);
        let word = "hellohello";
        let merged = m.encode_word(word);
        assert_eq!(merged.concat(), word);
        assert!(merged.len() < word.len());
    }

    #[test]
    fn test_matches_naive_rescan() {
        let rules = [("a", "b"), ("b", "a"), ("ab", "a"), ("a", "ba"), ("ab", "ab")];
        let m = merger(&rules);

        // reference: rescan every adjacent pair after each merge
        let naive = |word: &str| {
            let mut syms: Vec<String> = word.chars().map(String::from).collect();
            loop {
                let best = syms
                    .windows(2)
                    .enumerate()
                    .filter_map(|(i, w)| m.merges().rank(&w[0], &w[1]).map(|r| (r, i)))
                    .min();
                let Some((_, i)) = best else { break };
                let right = syms.remove(i + 1);
                syms[i].push_str(&right);
            }
            syms
        };

        for word in ["ababab", "abaab", "babab", "aabba", "abba"] {
            assert_eq!(m.encode_word(word), naive(word), "word {word:?}");
        }
    }
}
