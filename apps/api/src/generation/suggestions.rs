//! Improvement suggestions for the current document. Read-only, single model
//! call, no feedback loop. Any failure yields the fixed defaults so this can
//! never fail the caller's request.

use std::time::Duration;

use tracing::warn;

use crate::generation::prompts::{DOC_CAP, JD_CAP, SUGGEST_PROMPT_TEMPLATE, SUGGEST_SYSTEM};
use crate::generation::truncate;
use crate::llm_client::{CompletionAdapter, SamplingParams};

const SUGGEST_PARAMS: SamplingParams = SamplingParams {
    temperature: 0.4,
    max_tokens: 500,
    timeout: Duration::from_secs(30),
};

pub const MAX_SUGGESTIONS: usize = 4;

pub fn default_suggestions() -> Vec<String> {
    vec![
        "Add metrics and quantifiable achievements (e.g., '25% improvement')".to_string(),
        "Incorporate the top 5 keywords from the job description".to_string(),
        "Use strong action verbs (e.g., 'Developed', 'Implemented', 'Architected')".to_string(),
        "Highlight technical skills matching the role requirements".to_string(),
    ]
}

/// Returns up to four actionable suggestions for `latex_code` against the
/// job description.
pub async fn improvement_suggestions(
    llm: &dyn CompletionAdapter,
    latex_code: &str,
    job_description: &str,
) -> Vec<String> {
    let prompt = SUGGEST_PROMPT_TEMPLATE
        .replace("{latex_code}", truncate(latex_code, DOC_CAP))
        .replace("{jd_text}", truncate(job_description, JD_CAP));

    match llm.complete(SUGGEST_SYSTEM, &prompt, SUGGEST_PARAMS).await {
        Ok(text) => {
            let parsed = parse_suggestion_list(&text);
            if parsed.is_empty() {
                default_suggestions()
            } else {
                parsed
            }
        }
        Err(e) => {
            warn!("Suggestion LLM call failed: {e}");
            default_suggestions()
        }
    }
}

/// Parses a numbered or bulleted list line by line, stripping list markers.
fn parse_suggestion_list(text: &str) -> Vec<String> {
    let mut suggestions = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let starts_digit = line.chars().next().is_some_and(|c| c.is_ascii_digit());
        if !(starts_digit || line.starts_with('•') || line.starts_with('-')) {
            continue;
        }

        let cleaned = if starts_digit {
            match line.split_once(". ") {
                Some((_, rest)) => rest,
                None => line,
            }
        } else {
            line.trim_start_matches(['•', '-']).trim_start()
        };

        let cleaned = cleaned.trim();
        if !cleaned.is_empty() {
            suggestions.push(cleaned.to_string());
        }
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
    }

    suggestions
}
