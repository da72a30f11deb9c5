//! Bounded validate → correct → retry: the compile-and-repair loop.
//!
//! `RepairLoop` is generic over its validator and corrector so the control
//! logic can be tested with scripted fakes and reused for any cycle where an
//! external tool is the ground truth. The LaTeX bindings (`CompileValidator`,
//! `RepairCorrector`) live at the bottom of this module.
//!
//! Guarantees:
//! - terminates after at most `max_attempts + 1` validations;
//! - a rejected correction never replaces the current candidate, so the next
//!   validation sees a byte-identical document;
//! - the outcome is exactly one of `Success` or `Exhausted`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::generation::prompts::{LOG_CAP, REPAIR_PROMPT_TEMPLATE, REPAIR_SYSTEM};
use crate::generation::truncate;
use crate::latex::compiler::{CompileOutcome, Compiler};
use crate::latex::sanitize::sanitize;
use crate::llm_client::{CompletionAdapter, SamplingParams};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Verdict of one validation pass.
pub enum Verdict<A> {
    Pass(A),
    Fail { diagnostic: String },
}

#[async_trait]
pub trait Validate: Send + Sync {
    /// Artifact produced by a passing validation (e.g. the rendered PDF path).
    type Artifact: Send;

    async fn validate(&self, candidate: &str, attempt: u32) -> Verdict<Self::Artifact>;
}

#[async_trait]
pub trait Correct: Send + Sync {
    /// Produces a corrected candidate from the failing one plus its
    /// diagnostic, or `None` when no usable correction was obtained.
    async fn correct(&self, candidate: &str, diagnostic: &str, attempt: u32) -> Option<String>;
}

#[derive(Debug)]
pub enum RepairOutcome<A> {
    /// Validation passed. `attempts` is the attempt index at which it passed;
    /// 0 means the initial candidate was already valid.
    Success {
        artifact: A,
        candidate: String,
        attempts: u32,
    },
    /// The budget is spent. Carries the final candidate and last diagnostic.
    Exhausted {
        candidate: String,
        diagnostic: String,
        attempts: u32,
    },
}

pub struct RepairLoop {
    max_attempts: u32,
}

impl RepairLoop {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    /// Drives the loop to a terminal state. The only mutable state is the
    /// current candidate and the attempt counter.
    pub async fn run<V, C>(
        &self,
        initial: String,
        validator: &V,
        corrector: &C,
    ) -> RepairOutcome<V::Artifact>
    where
        V: Validate,
        C: Correct,
    {
        let mut candidate = initial;
        let mut attempt = 0u32;

        loop {
            match validator.validate(&candidate, attempt).await {
                Verdict::Pass(artifact) => {
                    info!("Validation passed on attempt {attempt}/{}", self.max_attempts);
                    return RepairOutcome::Success {
                        artifact,
                        candidate,
                        attempts: attempt,
                    };
                }
                Verdict::Fail { diagnostic } => {
                    if attempt >= self.max_attempts {
                        warn!("Repair budget exhausted after attempt {attempt}");
                        return RepairOutcome::Exhausted {
                            candidate,
                            diagnostic,
                            attempts: attempt,
                        };
                    }

                    match corrector.correct(&candidate, &diagnostic, attempt).await {
                        Some(corrected) => candidate = corrected,
                        // A malformed correction must not replace a
                        // working-but-uncompilable draft.
                        None => {
                            warn!("Correction rejected on attempt {attempt}; keeping previous candidate")
                        }
                    }
                    attempt += 1;
                }
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LaTeX bindings
// ────────────────────────────────────────────────────────────────────────────

/// Validator that treats the pdflatex exit signal as ground truth. Each
/// attempt compiles under `{prefix}_attempt{n}` so artifacts never collide.
pub struct CompileValidator {
    compiler: Arc<dyn Compiler>,
    prefix: String,
}

impl CompileValidator {
    pub fn new(compiler: Arc<dyn Compiler>, prefix: impl Into<String>) -> Self {
        Self {
            compiler,
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl Validate for CompileValidator {
    type Artifact = PathBuf;

    async fn validate(&self, candidate: &str, attempt: u32) -> Verdict<PathBuf> {
        let prefix = format!("{}_attempt{attempt}", self.prefix);
        match self.compiler.compile(candidate, &prefix).await {
            CompileOutcome::Success { pdf_path, log } => {
                debug!("Compilation log: {} bytes", log.len());
                Verdict::Pass(pdf_path)
            }
            CompileOutcome::Failure { error, log } => Verdict::Fail {
                diagnostic: log.unwrap_or(error),
            },
        }
    }
}

const REPAIR_PARAMS: SamplingParams = SamplingParams {
    temperature: 0.1,
    max_tokens: 4096,
    timeout: Duration::from_secs(60),
};

/// Corrector that feeds the failing document and a bounded slice of its
/// diagnostic log back to the model for a surgical fix. Output is
/// sanitizer-gated; a rejected fix yields `None`.
pub struct RepairCorrector {
    llm: Arc<dyn CompletionAdapter>,
}

impl RepairCorrector {
    pub fn new(llm: Arc<dyn CompletionAdapter>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Correct for RepairCorrector {
    async fn correct(&self, candidate: &str, diagnostic: &str, attempt: u32) -> Option<String> {
        let prompt = REPAIR_PROMPT_TEMPLATE
            .replace("{error_log}", truncate(diagnostic, LOG_CAP))
            .replace("{latex_code}", candidate);

        info!("Attempt {attempt}: requesting LaTeX repair from the model");

        match self.llm.complete(REPAIR_SYSTEM, &prompt, REPAIR_PARAMS).await {
            Ok(completion) => match sanitize(&completion) {
                Ok(fixed) => Some(fixed),
                Err(e) => {
                    warn!("Repair output failed envelope validation: {e}");
                    None
                }
            },
            Err(e) => {
                warn!("Repair LLM call failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::latex::compiler::testing::ScriptedCompiler;
    use crate::llm_client::testing::ScriptedCompletion;

    /// Validator fake: pops one scripted verdict per call and records every
    /// candidate it sees.
    struct ScriptedValidator {
        verdicts: Mutex<VecDeque<Result<(), String>>>,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedValidator {
        fn new(verdicts: Vec<Result<(), String>>) -> Self {
            Self {
                verdicts: Mutex::new(verdicts.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(times: usize) -> Self {
            Self::new(vec![Err("boom".to_string()); times])
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Validate for ScriptedValidator {
        type Artifact = ();

        async fn validate(&self, candidate: &str, _attempt: u32) -> Verdict<()> {
            self.seen.lock().unwrap().push(candidate.to_string());
            match self.verdicts.lock().unwrap().pop_front() {
                Some(Ok(())) | None => Verdict::Pass(()),
                Some(Err(diagnostic)) => Verdict::Fail { diagnostic },
            }
        }
    }

    /// Corrector fake: pops one scripted correction per call.
    struct ScriptedCorrector {
        corrections: Mutex<VecDeque<Option<String>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedCorrector {
        fn new(corrections: Vec<Option<String>>) -> Self {
            Self {
                corrections: Mutex::new(corrections.into()),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Correct for ScriptedCorrector {
        async fn correct(&self, _candidate: &str, _diagnostic: &str, _attempt: u32) -> Option<String> {
            *self.calls.lock().unwrap() += 1;
            self.corrections.lock().unwrap().pop_front().flatten()
        }
    }

    #[tokio::test]
    async fn test_valid_initial_candidate_succeeds_with_zero_repairs() {
        let validator = ScriptedValidator::new(vec![Ok(())]);
        let corrector = ScriptedCorrector::new(vec![]);

        let outcome = RepairLoop::new(DEFAULT_MAX_ATTEMPTS)
            .run("draft".to_string(), &validator, &corrector)
            .await;

        match outcome {
            RepairOutcome::Success { attempts, candidate, .. } => {
                assert_eq!(attempts, 0);
                assert_eq!(candidate, "draft");
            }
            RepairOutcome::Exhausted { .. } => panic!("must succeed at attempt 0"),
        }
        assert_eq!(corrector.call_count(), 0);
        assert_eq!(validator.calls(), 1);
    }

    #[tokio::test]
    async fn test_success_at_attempt_four_makes_exactly_four_repair_calls() {
        let validator = ScriptedValidator::new(vec![
            Err("e0".to_string()),
            Err("e1".to_string()),
            Err("e2".to_string()),
            Err("e3".to_string()),
            Ok(()),
        ]);
        let corrector = ScriptedCorrector::new(vec![
            Some("v1".to_string()),
            Some("v2".to_string()),
            Some("v3".to_string()),
            Some("v4".to_string()),
        ]);

        let outcome = RepairLoop::new(5)
            .run("v0".to_string(), &validator, &corrector)
            .await;

        match outcome {
            RepairOutcome::Success { attempts, candidate, .. } => {
                assert_eq!(attempts, 4);
                assert_eq!(candidate, "v4");
            }
            RepairOutcome::Exhausted { .. } => panic!("must succeed at attempt 4"),
        }
        assert_eq!(corrector.call_count(), 4);
        assert_eq!(validator.calls(), 5);
    }

    #[tokio::test]
    async fn test_exhaustion_after_budget_plus_one_validations() {
        let validator = ScriptedValidator::failing(10);
        let corrector = ScriptedCorrector::new(vec![Some("fix".to_string()); 10]);

        let outcome = RepairLoop::new(5)
            .run("v0".to_string(), &validator, &corrector)
            .await;

        match outcome {
            RepairOutcome::Exhausted { attempts, diagnostic, .. } => {
                assert_eq!(attempts, 5);
                assert_eq!(diagnostic, "boom");
            }
            RepairOutcome::Success { .. } => panic!("must exhaust"),
        }
        // Budget of 5 means at most 6 validations and 5 corrections.
        assert_eq!(validator.calls(), 6);
        assert_eq!(corrector.call_count(), 5);
    }

    #[tokio::test]
    async fn test_rejected_correction_keeps_candidate_byte_identical() {
        let validator = ScriptedValidator::new(vec![
            Err("e0".to_string()),
            Err("e1".to_string()),
            Ok(()),
        ]);
        let corrector = ScriptedCorrector::new(vec![None, Some("fixed".to_string())]);

        let outcome = RepairLoop::new(5)
            .run("original".to_string(), &validator, &corrector)
            .await;

        let seen = validator.seen.lock().unwrap();
        assert_eq!(seen[0], "original");
        assert_eq!(seen[1], "original"); // rejected fix must not replace it
        assert_eq!(seen[2], "fixed");
        drop(seen);

        assert!(matches!(outcome, RepairOutcome::Success { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn test_compile_validator_namespaces_attempts_and_maps_outcomes() {
        let compiler = Arc::new(ScriptedCompiler::failing_with("! Missing } inserted.", 1));
        let validator = CompileValidator::new(compiler.clone(), "resume_abc");

        match validator.validate("\\documentclass{article}", 3).await {
            Verdict::Fail { diagnostic } => assert_eq!(diagnostic, "! Missing } inserted."),
            Verdict::Pass(_) => panic!("scripted failure expected"),
        }
        assert_eq!(compiler.sources.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_repair_corrector_rejects_snippets() {
        let llm = Arc::new(ScriptedCompletion::new(vec![Ok(
            "I think the problem is a missing brace.".to_string(),
        )]));
        let corrector = RepairCorrector::new(llm);

        let fixed = corrector.correct("\\documentclass{article}", "! error", 0).await;
        assert!(fixed.is_none());
    }

    #[tokio::test]
    async fn test_repair_corrector_sanitizes_valid_fixes_and_bounds_the_log() {
        let fixed_doc = "\\documentclass{article}\n\\begin{document}\nok\n\\end{document}";
        let llm = Arc::new(ScriptedCompletion::new(vec![Ok(format!(
            "```latex\n{fixed_doc}\n```"
        ))]));
        let corrector = RepairCorrector::new(llm.clone());

        let huge_log = "e".repeat(10_000);
        let fixed = corrector.correct("\\documentclass{bad}", &huge_log, 1).await;

        assert_eq!(fixed.as_deref(), Some(fixed_doc));
        let prompts = llm.prompts.lock().unwrap();
        assert!(!prompts[0].contains(&"e".repeat(LOG_CAP + 1)));
    }
}
