//! Reversible byte ↔ symbol remapping used by byte-level BPE.
//!
//! Merge rules are written over printable strings, not raw bytes. Every byte
//! value therefore gets a printable stand-in character:
//! - bytes in `'!'..='~'`, `'¡'..='¬'` and `'®'..='ÿ'` stand for themselves.
//! - every other byte takes the next code point from 256 upward, in
//!   increasing byte order.
//!
//! The table is identical to GPT-2's `bytes_to_unicode`, which is what makes
//! externally trained vocabularies line up with ours.

use std::collections::HashMap;

/// Bytes that are printable as-is and keep their own code point.
#[inline]
fn is_printable(b: u8) -> bool {
    (b'!'..=b'~').contains(&b) || (0xA1..=0xAC).contains(&b) || (0xAE..=0xFF).contains(&b)
}

/// Bijection between the 256 byte values and 256 printable characters.
#[derive(Debug, Clone)]
pub struct ByteSymbolMap {
    /// Forward table, indexed by byte value.
    to_symbol: [char; 256],

    /// Inverse of `to_symbol`.
    to_byte: HashMap<char, u8>,
}

impl ByteSymbolMap {
    /// Builds the table. Deterministic: every call yields the same mapping.
    pub fn new() -> Self {
        let mut to_symbol = ['\0'; 256];
        let mut to_byte = HashMap::with_capacity(256);

        let mut next = 256u32;
        for b in 0..=255u8 {
            let code = if is_printable(b) {
                u32::from(b)
            } else {
                let c = next;
                next += 1;
                c
            };
            // 256..=323 is always a valid scalar value, so the fallback is unreachable
            let symbol = char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER);
            to_symbol[usize::from(b)] = symbol;
            to_byte.insert(symbol, b);
        }

        Self { to_symbol, to_byte }
    }

    /// Printable stand-in for `byte`.
    #[inline]
    pub fn symbol(&self, byte: u8) -> char {
        self.to_symbol[usize::from(byte)]
    }

    /// Byte value a symbol stands for, if it is one of the 256 stand-ins.
    #[inline]
    pub fn byte(&self, symbol: char) -> Option<u8> {
        self.to_byte.get(&symbol).copied()
    }

    /// Reinterprets a symbol string as raw bytes.
    ///
    /// Characters outside the table contribute their code point truncated
    /// to the low byte.
    pub fn to_bytes(&self, symbols: &str) -> Vec<u8> {
        symbols
            .chars()
            .map(|c| self.byte(c).unwrap_or(u32::from(c) as u8))
            .collect()
    }

    /// Iterates `(byte, symbol)` in byte order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, char)> + '_ {
        (0..=255u8).map(move |b| (b, self.symbol(b)))
    }
}

impl Default for ByteSymbolMap {
    fn default() -> Self {
        Self::new()
    }
}
