//! Initial document generation. Model output is sanitizer-gated; an adapter
//! failure or a rejected envelope falls back to literal template substitution,
//! so generation never errors.

use std::time::Duration;

use tracing::warn;

use crate::extract::ParsedResume;
use crate::generation::prompts::{
    GENERATION_PROMPT_TEMPLATE, GENERATION_SYSTEM, JD_CAP, RESUME_TEXT_CAP,
};
use crate::generation::truncate;
use crate::latex::sanitize::sanitize;
use crate::latex::DOC_END;
use crate::llm_client::{CompletionAdapter, SamplingParams};

const GENERATION_PARAMS: SamplingParams = SamplingParams {
    temperature: 0.3,
    max_tokens: 4096,
    timeout: Duration::from_secs(60),
};

pub const DEFAULT_NAME: &str = "Professional Candidate";
const DEFAULT_EMAIL: &str = "email@example.com";
const DEFAULT_PHONE: &str = "(555) 123-4567";

/// Produces the initial tailored document candidate.
pub async fn generate_document(
    llm: &dyn CompletionAdapter,
    template: &str,
    resume: &ParsedResume,
    job_description: &str,
    applicant_name: &str,
) -> String {
    let prompt = GENERATION_PROMPT_TEMPLATE
        .replace("{template}", template)
        .replace("{applicant_name}", applicant_name)
        .replace(
            "{email}",
            resume.contact.email.as_deref().unwrap_or(DEFAULT_EMAIL),
        )
        .replace(
            "{phone}",
            resume.contact.phone.as_deref().unwrap_or(DEFAULT_PHONE),
        )
        .replace("{resume_text}", truncate(&resume.raw_text, RESUME_TEXT_CAP))
        .replace("{jd_text}", truncate(job_description, JD_CAP));

    match llm.complete(GENERATION_SYSTEM, &prompt, GENERATION_PARAMS).await {
        Ok(completion) => match sanitize(&completion) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!("Generated document failed envelope validation: {e}");
                fallback_document(template, resume, applicant_name)
            }
        },
        Err(e) => {
            warn!("Generation LLM call failed: {e}");
            fallback_document(template, resume, applicant_name)
        }
    }
}

/// Terminal safety net: the fixed template with contact placeholders
/// substituted literally. Never fails.
pub fn fallback_document(template: &str, resume: &ParsedResume, applicant_name: &str) -> String {
    let email = resume.contact.email.as_deref().unwrap_or(DEFAULT_EMAIL);
    let phone = resume.contact.phone.as_deref().unwrap_or(DEFAULT_PHONE);

    // Double-brace spellings must go first so "{{NAME}}" is not mangled by
    // the single-brace pass.
    let replacements: [(&str, &str); 8] = [
        ("{{FULL_NAME}}", applicant_name),
        ("{{NAME}}", applicant_name),
        ("{{EMAIL}}", email),
        ("{{PHONE}}", phone),
        ("{FULL_NAME}", applicant_name),
        ("{NAME}", applicant_name),
        ("{EMAIL}", email),
        ("{PHONE}", phone),
    ];

    let mut document = template.to_string();
    for (placeholder, value) in replacements {
        document = document.replace(placeholder, value);
    }

    if !document.trim_end().ends_with(DOC_END) {
        document = format!("{}\n{DOC_END}\n", document.trim_end());
    }
    document
}
