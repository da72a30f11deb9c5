//! Targeted refinement of an already-valid document. The whole document plus
//! the user's change request go to the model; anything suspicious comes back
//! as the original, untouched. Refinement does not guarantee compilability —
//! the caller re-runs the repair loop on the result.

use std::time::Duration;

use tracing::warn;

use crate::generation::prompts::{REFINE_JD_CAP, REFINE_PROMPT_TEMPLATE, REFINE_SYSTEM};
use crate::generation::truncate;
use crate::latex::sanitize::sanitize;
use crate::llm_client::{CompletionAdapter, SamplingParams};

const REFINE_PARAMS: SamplingParams = SamplingParams {
    temperature: 0.2,
    max_tokens: 4096,
    timeout: Duration::from_secs(60),
};

/// Applies one user-requested edit to `current`. Returns the original
/// document unmodified on adapter failure, envelope rejection, or when the
/// result is shorter than `min_length_ratio` of the original — a well-formed
/// but drastically shorter reply is a truncated rewrite, not an edit.
pub async fn refine_document(
    llm: &dyn CompletionAdapter,
    current: &str,
    feedback: &str,
    job_description: &str,
    min_length_ratio: f64,
) -> String {
    let prompt = REFINE_PROMPT_TEMPLATE
        .replace("{latex_code}", current)
        .replace("{feedback}", feedback)
        .replace("{jd_text}", truncate(job_description, REFINE_JD_CAP));

    let completion = match llm.complete(REFINE_SYSTEM, &prompt, REFINE_PARAMS).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Refinement LLM call failed: {e}");
            return current.to_string();
        }
    };

    let refined = match sanitize(&completion) {
        Ok(document) => document,
        Err(e) => {
            warn!("Refined document failed envelope validation: {e}");
            return current.to_string();
        }
    };

    let ratio = refined.len() as f64 / current.len().max(1) as f64;
    if ratio < min_length_ratio {
        warn!(
            "Refined document is {:.0}% of the original length; keeping the original",
            ratio * 100.0
        );
        return current.to_string();
    }

    refined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedCompletion;

    const RATIO: f64 = 0.5;

    fn long_document() -> String {
        format!(
            "\\documentclass{{article}}\n\\begin{{document}}\n{}\n\\end{{document}}",
            "Experienced engineer. ".repeat(40)
        )
    }

    #[tokio::test]
    async fn test_valid_refinement_is_returned() {
        let current = long_document();
        let refined = current.replace("Experienced", "Seasoned");
        let llm = ScriptedCompletion::new(vec![Ok(refined.clone())]);

        let result = refine_document(&llm, &current, "say seasoned", "", RATIO).await;
        assert_eq!(result, refined);
    }

    #[tokio::test]
    async fn test_short_result_triggers_data_loss_guard() {
        let current = long_document();
        // Well-formed envelope, but ~30% of the original length.
        let truncated = format!(
            "\\documentclass{{article}}\n\\begin{{document}}\n{}\n\\end{{document}}",
            "Experienced engineer. ".repeat(10)
        );
        assert!(truncated.len() < current.len() / 2);
        let llm = ScriptedCompletion::new(vec![Ok(truncated)]);

        let result = refine_document(&llm, &current, "trim it", "", RATIO).await;
        assert_eq!(result, current);
    }

    #[tokio::test]
    async fn test_rejected_envelope_returns_original() {
        let current = long_document();
        let llm = ScriptedCompletion::new(vec![Ok(
            "Here are the changes you asked for: ...".to_string()
        )]);

        let result = refine_document(&llm, &current, "fix wording", "", RATIO).await;
        assert_eq!(result, current);
    }

    #[tokio::test]
    async fn test_adapter_failure_returns_original() {
        let current = long_document();
        let llm = ScriptedCompletion::always_failing();

        let result = refine_document(&llm, &current, "fix wording", "", RATIO).await;
        assert_eq!(result, current);
    }

    #[tokio::test]
    async fn test_threshold_is_tunable() {
        let current = long_document();
        let half = format!(
            "\\documentclass{{article}}\n\\begin{{document}}\n{}\n\\end{{document}}",
            "Experienced engineer. ".repeat(14)
        );
        let llm = ScriptedCompletion::new(vec![Ok(half.clone())]);

        // With the guard disabled the shorter document is accepted.
        let result = refine_document(&llm, &current, "shorten", "", 0.0).await;
        assert_eq!(result, half);
    }
}
