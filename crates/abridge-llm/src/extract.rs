use once_cell::sync::Lazy;
use regex::Regex;

static THINK_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think regex"));

static ANSWER_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<answer>\s*(.*?)\s*</answer>").expect("valid answer regex"));

/// Normalize a raw model response into the usable answer text.
///
/// Reasoning models emit `<think>...</think>` scratchpads and some wrap
/// the real output in `<answer>...</answer>`. The pipeline only ever wants
/// the answer body:
///
/// 1. `<think>` blocks are removed entirely.
/// 2. If an `<answer>` block is present, its trimmed body is returned.
/// 3. Otherwise the trimmed remainder is returned.
pub fn extract_answer(text: &str) -> String {
    let without_think = THINK_BLOCK.replace_all(text, "");
    if let Some(caps) = ANSWER_BLOCK.captures(&without_think) {
        return caps[1].trim().to_string();
    }
    without_think.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_trimmed() {
        assert_eq!(extract_answer("  condensed story  \n"), "condensed story");
    }

    #[test]
    fn think_block_removed() {
        let raw = "<think>let me plan the summary</think>The hero departed.";
        assert_eq!(extract_answer(raw), "The hero departed.");
    }

    #[test]
    fn answer_block_preferred() {
        let raw = "preamble <answer> The hero departed. </answer> postamble";
        assert_eq!(extract_answer(raw), "The hero departed.");
    }

    #[test]
    fn think_then_answer() {
        let raw = "<think>hmm\nmultiline</think><answer>Done.</answer>";
        assert_eq!(extract_answer(raw), "Done.");
    }

    #[test]
    fn multiline_answer_body_kept() {
        let raw = "<answer>Line one.\n\nLine two.</answer>";
        assert_eq!(extract_answer(raw), "Line one.\n\nLine two.");
    }

    #[test]
    fn multiple_think_blocks_removed() {
        let raw = "<think>a</think>kept<think>b</think> text";
        assert_eq!(extract_answer(raw), "kept text");
    }
}
