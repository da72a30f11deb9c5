//! Axum handlers for the resume pipeline: enhance (upload + generate +
//! compile-repair), refine (edit + compile-repair), suggestions, and PDF
//! download.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{AppError, ExhaustedReport};
use crate::generation::generator::{generate_document, DEFAULT_NAME};
use crate::generation::refiner::refine_document;
use crate::generation::repair::{CompileValidator, RepairCorrector, RepairLoop, RepairOutcome};
use crate::generation::suggestions::improvement_suggestions;
use crate::latex::triage;
use crate::state::AppState;
use crate::storage;

const PREVIEW_LEN: usize = 500;
const EXHAUSTED_PREVIEW_LEN: usize = 1000;
const MAX_ERROR_LINES: usize = 10;

#[derive(Debug, Deserialize)]
pub struct RefineRequest {
    pub latex_code: String,
    pub feedback: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsRequest {
    pub latex_code: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    pub success: bool,
    pub message: String,
    pub latex_code: String,
    pub latex_preview: String,
    pub pdf_filename: String,
    pub download_url: String,
    pub suggestions: Vec<String>,
    pub compilation_attempts: u32,
    pub applicant_name: String,
}

#[derive(Debug, Serialize)]
pub struct RefineResponse {
    pub success: bool,
    pub message: String,
    pub latex_code: String,
    pub pdf_filename: String,
    pub download_url: String,
    pub suggestions: Vec<String>,
    pub compilation_attempts: u32,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub success: bool,
    pub suggestions: Vec<String>,
}

/// POST /api/enhance-resume
///
/// Multipart: `file` (PDF or DOCX resume) and `job_description` (text).
/// Runs the full pipeline: extract, generate, compile-and-repair.
pub async fn handle_enhance_resume(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<EnhanceResponse>, AppError> {
    ensure_llm_configured(&state)?;
    ensure_compiler_available(&state).await?;

    let upload = read_enhance_multipart(multipart).await?;
    if upload.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description must not be empty".to_string(),
        ));
    }

    let uid = storage::request_id();
    storage::ensure_dir(&state.config.uploads_dir).await?;

    let upload_path = state
        .config
        .uploads_dir
        .join(format!("{uid}_{}", upload.filename));
    tokio::fs::write(&upload_path, &upload.bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let resume = parse_resume_upload(upload_path.clone()).await?;
    info!(
        "Parsed {} ({} chars of text)",
        resume.filename, resume.text_length
    );

    let applicant_name = resume
        .contact
        .name
        .clone()
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    let candidate = generate_document(
        state.llm.as_ref(),
        &state.template,
        &resume,
        &upload.job_description,
        &applicant_name,
    )
    .await;

    storage::save_latex_file(&state.config.uploads_dir, &candidate, &format!("resume_{uid}"))
        .await?;

    let outcome = run_compile_loop(&state, candidate, &format!("resume_{uid}")).await;

    match outcome {
        RepairOutcome::Success {
            artifact,
            candidate,
            attempts,
        } => {
            // The document that actually compiled may differ from the initial
            // save after repairs; persist it under a final name.
            storage::save_latex_file(
                &state.config.uploads_dir,
                &candidate,
                &format!("resume_{uid}_final"),
            )
            .await?;

            let pdf_filename = filename_of(&artifact);
            let suggestions =
                improvement_suggestions(state.llm.as_ref(), &candidate, &upload.job_description)
                    .await;
            info!("Resume {uid} compiled on attempt {attempts}");
            Ok(Json(EnhanceResponse {
                success: true,
                message: format!(
                    "Resume generated successfully (compiled on attempt {attempts}/{})",
                    state.config.max_compile_attempts
                ),
                latex_preview: preview(&candidate, PREVIEW_LEN),
                latex_code: candidate,
                download_url: download_url(&pdf_filename),
                pdf_filename,
                suggestions,
                compilation_attempts: attempts,
                applicant_name,
            }))
        }
        RepairOutcome::Exhausted {
            candidate,
            diagnostic,
            attempts,
        } => Err(exhausted_error(&candidate, &diagnostic, attempts)),
    }
}

/// POST /api/refine-resume
///
/// Applies one user-requested edit to an existing document, then re-runs the
/// compile-and-repair loop on the result.
pub async fn handle_refine_resume(
    State(state): State<AppState>,
    Json(request): Json<RefineRequest>,
) -> Result<Json<RefineResponse>, AppError> {
    ensure_llm_configured(&state)?;
    ensure_compiler_available(&state).await?;

    if request.latex_code.trim().is_empty() {
        return Err(AppError::Validation(
            "latex_code must not be empty".to_string(),
        ));
    }
    if request.feedback.trim().is_empty() {
        return Err(AppError::Validation(
            "feedback must not be empty".to_string(),
        ));
    }

    let uid = storage::request_id();
    storage::ensure_dir(&state.config.uploads_dir).await?;

    let refined = refine_document(
        state.llm.as_ref(),
        &request.latex_code,
        &request.feedback,
        &request.job_description,
        state.config.refine_min_length_ratio,
    )
    .await;

    storage::save_latex_file(&state.config.uploads_dir, &refined, &format!("refined_{uid}"))
        .await?;

    let outcome = run_compile_loop(&state, refined, &format!("refined_{uid}")).await;

    match outcome {
        RepairOutcome::Success {
            artifact,
            candidate,
            attempts,
        } => {
            storage::save_latex_file(
                &state.config.uploads_dir,
                &candidate,
                &format!("refined_{uid}_final"),
            )
            .await?;

            let pdf_filename = filename_of(&artifact);
            let suggestions = improvement_suggestions(
                state.llm.as_ref(),
                &candidate,
                &request.job_description,
            )
            .await;
            Ok(Json(RefineResponse {
                success: true,
                message: format!(
                    "Resume refined successfully (compiled on attempt {attempts}/{})",
                    state.config.max_compile_attempts
                ),
                latex_code: candidate,
                download_url: download_url(&pdf_filename),
                pdf_filename,
                suggestions,
                compilation_attempts: attempts,
            }))
        }
        RepairOutcome::Exhausted {
            candidate,
            diagnostic,
            attempts,
        } => Err(exhausted_error(&candidate, &diagnostic, attempts)),
    }
}

/// POST /api/get-suggestions
pub async fn handle_get_suggestions(
    State(state): State<AppState>,
    Json(request): Json<SuggestionsRequest>,
) -> Result<Json<SuggestionsResponse>, AppError> {
    ensure_llm_configured(&state)?;

    if request.latex_code.trim().is_empty() {
        return Err(AppError::Validation(
            "latex_code must not be empty".to_string(),
        ));
    }

    let suggestions = improvement_suggestions(
        state.llm.as_ref(),
        &request.latex_code,
        &request.job_description,
    )
    .await;

    Ok(Json(SuggestionsResponse {
        success: true,
        suggestions,
    }))
}

/// GET /api/download-pdf/:filename
///
/// Serves a previously compiled PDF from the uploads directory. The filename
/// is validated so the handler cannot read outside that directory.
pub async fn handle_download_pdf(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<(HeaderMap, Vec<u8>), AppError> {
    let filename = sanitize_filename(&filename)?;
    if !filename.ends_with(".pdf") {
        return Err(AppError::Validation(
            "Only .pdf files can be downloaded".to_string(),
        ));
    }

    let path = state.config.uploads_dir.join(&filename);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError::NotFound(format!("PDF not found: {filename}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, "application/pdf".parse().map_err(|e| {
        AppError::Internal(anyhow::anyhow!("invalid header value: {e}"))
    })?);
    headers.insert(
        CONTENT_DISPOSITION,
        format!("attachment; filename=\"enhanced_resume_{filename}\"")
            .parse()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("invalid header value: {e}")))?,
    );

    Ok((headers, bytes))
}

struct EnhanceUpload {
    filename: String,
    bytes: bytes::Bytes,
    job_description: String,
}

/// Pulls the resume file and job description out of the multipart body.
async fn read_enhance_multipart(mut multipart: Multipart) -> Result<EnhanceUpload, AppError> {
    let mut file: Option<(String, bytes::Bytes)> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        // Capture metadata before the field is consumed.
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match name.as_str() {
            "file" => {
                let filename = file_name
                    .ok_or_else(|| AppError::Validation("file field needs a filename".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
                file = Some((filename, bytes));
            }
            "job_description" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read field: {e}")))?;
                job_description = Some(text);
            }
            other => warn!("Ignoring unexpected multipart field '{other}'"),
        }
    }

    let (filename, bytes) =
        file.ok_or_else(|| AppError::Validation("Missing 'file' field".to_string()))?;
    let job_description = job_description
        .ok_or_else(|| AppError::Validation("Missing 'job_description' field".to_string()))?;

    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty".to_string()));
    }

    Ok(EnhanceUpload {
        filename: sanitize_filename(&filename_only(&filename))?,
        bytes,
        job_description,
    })
}

/// Extraction is synchronous and CPU-bound (PDF parsing), so it runs on the
/// blocking pool instead of stalling an executor thread.
async fn parse_resume_upload(
    path: std::path::PathBuf,
) -> Result<crate::extract::ParsedResume, AppError> {
    tokio::task::spawn_blocking(move || crate::extract::parse_resume_file(&path))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("extraction task panicked: {e}")))?
        .map_err(|e| AppError::Parse(e.to_string()))
}

fn download_url(pdf_filename: &str) -> String {
    format!("/api/download-pdf/{pdf_filename}")
}

fn ensure_llm_configured(state: &AppState) -> Result<(), AppError> {
    if !state.config.llm_configured() {
        return Err(AppError::Config(
            "ANTHROPIC_API_KEY is not configured".to_string(),
        ));
    }
    Ok(())
}

async fn ensure_compiler_available(state: &AppState) -> Result<(), AppError> {
    let availability = state.compiler.availability().await;
    if !availability.installed {
        return Err(AppError::Config(format!(
            "LaTeX is not installed: {}",
            availability.detail
        )));
    }
    Ok(())
}

async fn run_compile_loop(
    state: &AppState,
    candidate: String,
    prefix: &str,
) -> RepairOutcome<std::path::PathBuf> {
    let validator = CompileValidator::new(Arc::clone(&state.compiler), prefix);
    let corrector = RepairCorrector::new(Arc::clone(&state.llm));
    RepairLoop::new(state.config.max_compile_attempts)
        .run(candidate, &validator, &corrector)
        .await
}

fn exhausted_error(candidate: &str, diagnostic: &str, attempts: u32) -> AppError {
    let class = triage::classify(diagnostic);
    AppError::CompileExhausted(Box::new(ExhaustedReport {
        attempts,
        error_class: class,
        error_description: class.description().to_string(),
        suggestions: triage::remediation(diagnostic),
        error_lines: triage::error_lines(diagnostic, MAX_ERROR_LINES),
        latex_preview: preview(candidate, EXHAUSTED_PREVIEW_LEN),
    }))
}

fn preview(text: &str, max: usize) -> String {
    crate::generation::truncate(text, max).to_string()
}

/// Strips any path components a browser might include in the filename.
fn filename_only(raw: &str) -> String {
    raw.rsplit(['/', '\\']).next().unwrap_or(raw).to_string()
}

/// Rejects filenames that could escape the uploads directory.
fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(AppError::Validation(format!(
            "Invalid filename: {filename}"
        )));
    }
    Ok(filename.to_string())
}

fn filename_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::config::Config;
    use crate::latex::compiler::testing::ScriptedCompiler;
    use crate::llm_client::testing::ScriptedCompletion;

    fn test_state(api_key: Option<&str>) -> AppState {
        test_state_with(
            api_key,
            Arc::new(ScriptedCompletion::always_failing()),
            Arc::new(ScriptedCompiler::failing_with("! error", 0)),
            PathBuf::from("uploads"),
        )
    }

    fn test_state_with(
        api_key: Option<&str>,
        llm: Arc<ScriptedCompletion>,
        compiler: Arc<ScriptedCompiler>,
        uploads_dir: PathBuf,
    ) -> AppState {
        AppState {
            llm,
            compiler,
            config: Config {
                anthropic_api_key: api_key.map(String::from),
                port: 0,
                uploads_dir,
                template_path: None,
                max_compile_attempts: 5,
                refine_min_length_ratio: 0.5,
                rust_log: "info".to_string(),
            },
            template: Arc::new("\\documentclass{article}".to_string()),
        }
    }

    #[test]
    fn test_sanitize_filename_rejects_traversal() {
        assert!(sanitize_filename("../etc/passwd").is_err());
        assert!(sanitize_filename("a/b.pdf").is_err());
        assert!(sanitize_filename("a\\b.pdf").is_err());
        assert!(sanitize_filename("").is_err());
        assert_eq!(sanitize_filename("resume.pdf").unwrap(), "resume.pdf");
    }

    #[test]
    fn test_filename_only_strips_paths() {
        assert_eq!(filename_only("C:\\Users\\me\\resume.pdf"), "resume.pdf");
        assert_eq!(filename_only("/tmp/resume.pdf"), "resume.pdf");
        assert_eq!(filename_only("resume.pdf"), "resume.pdf");
    }

    #[test]
    fn test_unconfigured_llm_is_a_config_error() {
        let state = test_state(None);
        assert!(matches!(
            ensure_llm_configured(&state),
            Err(AppError::Config(_))
        ));

        let state = test_state(Some("sk-ant-test"));
        assert!(ensure_llm_configured(&state).is_ok());
    }

    #[tokio::test]
    async fn test_download_rejects_traversal_paths() {
        let state = test_state(Some("sk-ant-test"));
        let result = handle_download_pdf(State(state), Path("../evil.pdf".to_string())).await;
        assert!(result.is_err());

        let state = test_state(Some("sk-ant-test"));
        let result = handle_download_pdf(State(state), Path("resume_ERROR.log".to_string())).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_refine_request_defaults_job_description() {
        let request: RefineRequest =
            serde_json::from_str(r#"{"latex_code": "x", "feedback": "y"}"#).unwrap();
        assert_eq!(request.job_description, "");
    }

    #[test]
    fn test_enhance_response_serializes_download_url_and_suggestions() {
        let response = EnhanceResponse {
            success: true,
            message: "ok".to_string(),
            latex_code: "\\documentclass{article}".to_string(),
            latex_preview: "\\documentclass{article}".to_string(),
            pdf_filename: "resume_abc_attempt0_12345678.pdf".to_string(),
            download_url: download_url("resume_abc_attempt0_12345678.pdf"),
            suggestions: vec!["Add metrics".to_string()],
            compilation_attempts: 0,
            applicant_name: "Jane Doe".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json["download_url"],
            "/api/download-pdf/resume_abc_attempt0_12345678.pdf"
        );
        assert_eq!(json["suggestions"][0], "Add metrics");
    }

    #[tokio::test]
    async fn test_refine_success_returns_download_url_and_persists_final_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let original =
            "\\documentclass{article}\n\\begin{document}\nold summary line\n\\end{document}";
        let refined = original.replace("old", "new");
        let fixed = original.replace("old", "repaired");

        // Call order: refine, then one repair, then suggestions.
        let llm = Arc::new(ScriptedCompletion::new(vec![
            Ok(refined),
            Ok(fixed.clone()),
            Ok("1. Tighten the summary".to_string()),
        ]));
        let compiler = Arc::new(ScriptedCompiler::new(vec![
            crate::latex::compiler::CompileOutcome::Failure {
                error: "PDF not generated".to_string(),
                log: Some("! Missing } inserted.".to_string()),
            },
            crate::latex::compiler::CompileOutcome::Success {
                pdf_path: dir.path().join("refined_out.pdf"),
                log: "ok".to_string(),
            },
        ]));
        let state = test_state_with(
            Some("sk-ant-test"),
            llm,
            compiler,
            dir.path().to_path_buf(),
        );

        let response = handle_refine_resume(
            State(state),
            Json(RefineRequest {
                latex_code: original.to_string(),
                feedback: "reword the summary".to_string(),
                job_description: String::new(),
            }),
        )
        .await
        .unwrap();

        assert!(response.success);
        assert_eq!(response.compilation_attempts, 1);
        assert_eq!(response.pdf_filename, "refined_out.pdf");
        assert_eq!(response.download_url, "/api/download-pdf/refined_out.pdf");
        assert_eq!(response.suggestions, vec!["Tighten the summary"]);

        // The repaired document that compiled is saved under a final name.
        let final_file = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .find(|e| e.file_name().to_string_lossy().contains("_final_"))
            .expect("final candidate must be persisted");
        assert_eq!(std::fs::read_to_string(final_file.path()).unwrap(), fixed);
    }

    #[tokio::test]
    async fn test_parse_resume_upload_maps_extract_failures() {
        let result = parse_resume_upload(PathBuf::from("/nonexistent/resume.pdf")).await;
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_exhausted_error_carries_triage() {
        let err = exhausted_error(
            "\\documentclass{article}",
            "! Undefined control sequence.\nl.12 \\resumeItm",
            5,
        );
        match err {
            AppError::CompileExhausted(report) => {
                assert_eq!(report.attempts, 5);
                assert!(!report.suggestions.is_empty());
                assert_eq!(report.error_lines.len(), 1);
                assert!(report.latex_preview.starts_with("\\documentclass"));
            }
            other => panic!("expected CompileExhausted, got {other:?}"),
        }
    }
}
