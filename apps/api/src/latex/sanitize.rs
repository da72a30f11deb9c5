//! Markup Sanitizer — strips incidental wrapping from model output and
//! validates the document envelope.
//!
//! The compiler remains the ground-truth validator; this module only checks
//! that a completion is shaped like a document at all. A candidate missing
//! the end marker is repaired by appending it. A candidate missing the start
//! marker is rejected outright — structural rewrites are never attempted here,
//! the caller decides the fallback.

use thiserror::Error;

use super::{DOC_END, DOC_START};

#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("completion does not start with \\documentclass (got: {preview:?})")]
    MissingStartMarker { preview: String },
}

/// Cleans a raw completion into a document candidate.
///
/// Strips a single leading/trailing code fence (with an optional `latex`
/// language tag), trims whitespace, rejects on a missing start marker, and
/// appends the end marker when absent.
pub fn sanitize(raw: &str) -> Result<String, SanitizeError> {
    let text = strip_fences(raw).trim();

    if !text.starts_with(DOC_START) {
        return Err(SanitizeError::MissingStartMarker {
            preview: text.chars().take(100).collect(),
        });
    }

    if text.contains(DOC_END) {
        Ok(text.to_string())
    } else {
        Ok(format!("{text}\n{DOC_END}"))
    }
}

/// Strips ```latex ... ``` or ``` ... ``` fences the model sometimes wraps
/// documents in despite instructions.
fn strip_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest.strip_prefix("latex").unwrap_or(rest).trim_start();
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest.trim_end();
    }
    text
}
