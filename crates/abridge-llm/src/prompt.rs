/// Editorial instructions applied at every stage and every reduction
/// layer. The same prompt condenses raw chapters, merged chapter groups,
/// and already-condensed arcs; depth never changes the editorial contract.
pub const CONDENSATION_PROMPT: &str = "\
You are acting as a disciplined literary editor.

Your task is to produce a faithful, condensed version of the provided text.

Rules:
- Preserve all events, actions, decisions, and outcomes.
- Preserve chronology and causal relationships.
- Remove repetition, padding, and filler that do not affect outcomes.
- Do not add opinions, evaluations, interpretations, or genre labels.
- Do not omit events that influence future developments.
- Do not rewrite the story into an abstract summary.

Style requirements:
- Neutral tone
- Third-person perspective
- Past tense
- Continuous narrative prose
- No meta commentary or references to the author or reader

The output must read like an abridged version of the original narrative and be understandable on its own.

Text to condense:
<<<
";

const PAYLOAD_OPEN: &str = "<<<\n";
const PAYLOAD_CLOSE: &str = "\n>>>";

/// Build the full prompt for one condensation call.
pub fn condensation_prompt(input: &str) -> String {
    let mut prompt = String::with_capacity(CONDENSATION_PROMPT.len() + input.len() + 8);
    prompt.push_str(CONDENSATION_PROMPT);
    prompt.push_str(input);
    prompt.push_str(PAYLOAD_CLOSE);
    prompt.push('\n');
    prompt
}

/// The text between the prompt's payload markers, or the whole string
/// when no markers are present. Test compressors use this to act on the
/// input text rather than the instruction header.
pub fn prompt_payload(prompt: &str) -> &str {
    let Some(start) = prompt.find(PAYLOAD_OPEN) else {
        return prompt;
    };
    let rest = &prompt[start + PAYLOAD_OPEN.len()..];
    match rest.rfind(PAYLOAD_CLOSE) {
        Some(end) => &rest[..end],
        None => rest,
    }
}
