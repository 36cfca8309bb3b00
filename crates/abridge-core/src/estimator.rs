/// External token-counting oracle.
///
/// Only monotonicity-in-practice is assumed: longer text yields a larger
/// or equal estimate. Exactness is not required anywhere in the engine.
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// Default heuristic: roughly four characters per token, rounded up.
/// Matches the conservative fallback used when no model tokenizer is
/// available.
#[derive(Clone, Copy, Debug)]
pub struct CharsPerTokenEstimator {
    chars_per_token: usize,
}

impl CharsPerTokenEstimator {
    pub fn new(chars_per_token: usize) -> Self {
        assert!(chars_per_token > 0, "chars_per_token must be positive");
        Self { chars_per_token }
    }
}

impl Default for CharsPerTokenEstimator {
    fn default() -> Self {
        Self::new(4)
    }
}

impl TokenEstimator for CharsPerTokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(CharsPerTokenEstimator::default().estimate(""), 0);
    }

    #[test]
    fn rounds_up() {
        let est = CharsPerTokenEstimator::new(4);
        assert_eq!(est.estimate("abc"), 1);
        assert_eq!(est.estimate("abcd"), 1);
        assert_eq!(est.estimate("abcde"), 2);
    }

    #[test]
    fn monotone_in_length() {
        let est = CharsPerTokenEstimator::new(4);
        let short = "word ".repeat(10);
        let long = "word ".repeat(100);
        assert!(est.estimate(&long) >= est.estimate(&short));
    }

    #[test]
    fn counts_chars_not_bytes() {
        let est = CharsPerTokenEstimator::new(4);
        // Four 3-byte chars are still one token's worth of chars.
        assert_eq!(est.estimate("日本語文"), 1);
    }
}
