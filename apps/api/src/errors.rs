use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::latex::triage::ErrorClass;

/// Everything the client needs to act on an unrecoverable compile failure:
/// the diagnostic class, remediation hints, the offending log lines, and a
/// preview of the document that refused to compile.
#[derive(Debug, Serialize)]
pub struct ExhaustedReport {
    pub attempts: u32,
    pub error_class: ErrorClass,
    pub error_description: String,
    pub suggestions: Vec<String>,
    pub error_lines: Vec<String>,
    pub latex_preview: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse resume: {0}")]
    Parse(String),

    #[error("LaTeX compilation failed after {} attempts", .0.attempts)]
    CompileExhausted(Box<ExhaustedReport>),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "error": msg }),
            ),
            AppError::Validation(msg) | AppError::Config(msg) | AppError::Parse(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": msg }),
            ),
            AppError::CompileExhausted(report) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "success": false,
                    "error": format!(
                        "LaTeX compilation failed after {} attempts",
                        report.attempts
                    ),
                    "error_analysis": {
                        "type": report.error_class,
                        "description": report.error_description,
                    },
                    "suggestions": report.suggestions,
                    "error_lines": report.error_lines,
                    "latex_preview": report.latex_preview,
                    "compilation_attempts": report.attempts,
                }),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
