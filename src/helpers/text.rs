//! Word splitting for text pipelines.

use crate::PCollection;
use regex::Regex;
use std::sync::LazyLock;

static WORD: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"[A-Za-z']+").unwrap()
});

/// Words of `line`: maximal runs of ASCII letters and apostrophes.
pub fn split_words(line: &str) -> Vec<String> {
    WORD.find_iter(line).map(|m| m.as_str().to_string()).collect()
}

impl PCollection<String> {
    /// One output element per word of every input line.
    pub fn split_words(self) -> PCollection<String> {
        self.flat_map(|line: &String| split_words(line))
    }

    /// Classic word count: lines -> (word, occurrences).
    pub fn count_words(self) -> PCollection<(String, u64)> {
        self.split_words().count_per_element()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punctuation_and_digits_separate_words() {
        assert_eq!(split_words("it's 2 o'clock, Bob!"), vec!["it's", "o'clock", "Bob"]);
        assert!(split_words("  42 -- ").is_empty());
    }
}
