// The resume pipeline: initial generation, the compile-and-repair loop,
// targeted refinement, and improvement suggestions.
// All LLM calls go through llm_client — no direct Anthropic calls here.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod refiner;
pub mod repair;
pub mod suggestions;

/// Truncates to at most `max` bytes without splitting a UTF-8 character.
/// Prompt inputs are capped so a huge resume or log cannot blow the context.
pub(crate) fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
