//! Regex-based word splitting applied before BPE merging.
//!
//! Words are matched with the GPT-2 split pattern: contraction suffixes,
//! letter runs, digit runs and symbol runs (each optionally led by one
//! space), then whitespace. The alternatives are tried in order and the
//! first one that matches wins. Every character of the input lands in
//! exactly one word.

use fancy_regex::Regex;

/// GPT-2 pre-tokenization pattern.
///
/// `\s+(?!\S)` needs look-ahead, which is why this goes through
/// `fancy_regex` rather than `regex`.
pub const GPT2_SPLIT_PATTERN: &str =
    r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// Compiled word splitter.
#[derive(Debug, Clone)]
pub struct PreTokenizer {
    pattern: Regex,
}

impl PreTokenizer {
    /// Compiles `pattern`.
    ///
    /// # Arguments
    ///
    /// * `pattern` - `fancy_regex` syntax; look-around is allowed.
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error if `pattern` is invalid.
    pub fn new(pattern: &str) -> Result<Self, fancy_regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Splitter using [`GPT2_SPLIT_PATTERN`].
    ///
    /// # Errors
    ///
    /// Only fails if the regex engine rejects the built-in pattern.
    pub fn gpt2() -> Result<Self, fancy_regex::Error> {
        Self::new(GPT2_SPLIT_PATTERN)
    }

    /// Lazily splits `text` into words.
    ///
    /// The iterator borrows `text` and can be recreated at will; every call
    /// yields the same sequence.
    pub fn words<'r, 't>(&'r self, text: &'t str) -> Words<'r, 't> {
        Words {
            pattern: &self.pattern,
            text,
            cursor: 0,
            search: 0,
            pending: None,
        }
    }

    /// The source of the compiled pattern.
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Iterator over the words of one input, returned by [`PreTokenizer::words`].
///
/// Gaps left between matches by a custom pattern are yielded as words of
/// their own, so concatenating the output always reproduces the input.
pub struct Words<'r, 't> {
    pattern: &'r Regex,
    text: &'t str,
    /// Byte offset of the first character not yet yielded.
    cursor: usize,
    /// Byte offset the next regex search starts from.
    search: usize,
    /// Match found after a gap; yielded right after the gap.
    pending: Option<(usize, usize)>,
}

impl<'t> Iterator for Words<'_, 't> {
    type Item = &'t str;

    fn next(&mut self) -> Option<&'t str> {
        if let Some((start, end)) = self.pending.take() {
            self.cursor = end;
            self.search = end;
            return Some(&self.text[start..end]);
        }
        if self.cursor >= self.text.len() {
            return None;
        }

        loop {
            match self.pattern.find_from_pos(self.text, self.search) {
                Ok(Some(m)) if m.start() == m.end() => {
                    // empty match: step over one character and search again
                    match self.text[m.start()..].chars().next() {
                        Some(c) => self.search = m.start() + c.len_utf8(),
                        None => return self.rest(),
                    }
                }
                Ok(Some(m)) => {
                    if m.start() > self.cursor {
                        let gap = &self.text[self.cursor..m.start()];
                        self.cursor = m.start();
                        self.pending = Some((m.start(), m.end()));
                        return Some(gap);
                    }
                    self.cursor = m.end();
                    self.search = m.end();
                    return Some(m.as_str());
                }
                Ok(None) => return self.rest(),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        offset = self.cursor,
                        "pre-tokenizer regex failed; keeping the remainder as one word"
                    );
                    return self.rest();
                }
            }
        }
    }
}

impl<'t> Words<'_, 't> {
    /// Yields whatever has not been covered yet and ends the iteration.
    fn rest(&mut self) -> Option<&'t str> {
        let tail = &self.text[self.cursor..];
        self.cursor = self.text.len();
        (!tail.is_empty()).then_some(tail)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn split(text: &str) -> Vec<String> {
        let pre = PreTokenizer::gpt2().expect("built-in pattern compiles");
        pre.words(text).map(str::to_owned).collect()
    }

    #[test]
    fn test_leading_space_attaches_to_word() {
        assert_eq!(split("hello world"), vec!["hello", " world"]);
    }

    #[test]
    fn test_contractions() {
        assert_eq!(split("I'm they'll"), vec!["I", "'m", " they", "'ll"]);
    }

    #[test]
    fn test_digits_and_symbols() {
        assert_eq!(split("abc 123!?"), vec!["abc", " 123", "!?"]);
    }

    #[test]
    fn test_trailing_whitespace_run_split_before_word() {
        // the last space stays with the next word; the rest is its own run
        assert_eq!(split("a   b"), vec!["a", "  ", " b"]);
    }

    #[test]
    fn test_newline_before_word() {
        assert_eq!(split("user\nhello"), vec!["user", "\n", "hello"]);
    }

    #[test]
    fn test_trailing_whitespace() {
        assert_eq!(split("hi \n"), vec!["hi", " \n"]);
    }

    #[test]
    fn test_unicode_letters() {
        assert_eq!(split("héllo 世界"), vec!["héllo", " 世界"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split("").is_empty());
    }

    #[test]
    fn test_restartable() {
        let pre = PreTokenizer::gpt2().expect("built-in pattern compiles");
        let text = "It's 2024, friends!";
        let first: Vec<&str> = pre.words(text).collect();
        let second: Vec<&str> = pre.words(text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_gaps_of_custom_pattern_are_kept() {
        let pre = PreTokenizer::new(r"\p{L}+").expect("pattern compiles");
        let words: Vec<&str> = pre.words("ab, cd").collect();
        assert_eq!(words, vec!["ab", ", ", "cd"]);
    }

    #[test]
    fn test_backtrack_limit_keeps_remainder_as_one_word() {
        // the backreference forces the backtracking engine, which gives up
        // on the long run of `a`s
        let pre = PreTokenizer::new(r"(?:(a+)\1?)+(?=b)|.").expect("pattern compiles");
        let text = format!("xy{}c", "a".repeat(40));

        let words: Vec<&str> = pre.words(&text).collect();

        assert_eq!(words.first(), Some(&"x"));
        assert_eq!(words.last().copied(), Some(&text[2..]));
        assert_eq!(words.len(), 3);
        assert_eq!(words.concat(), text);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(PreTokenizer::new("(unclosed").is_err());
    }

    proptest! {
        #[test]
        fn prop_words_cover_input(text in "\\PC{0,64}") {
            let pre = PreTokenizer::gpt2().expect("built-in pattern compiles");
            let joined: String = pre.words(&text).collect();
            prop_assert_eq!(joined, text);
        }

        #[test]
        fn prop_words_are_non_empty(text in "[ a-z0-9'\\n\\t!.]{0,48}") {
            let pre = PreTokenizer::gpt2().expect("built-in pattern compiles");
            prop_assert!(pre.words(&text).all(|w| !w.is_empty()));
        }
    }
}
