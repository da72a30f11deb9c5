//! Diagnostic-log triage for failed compilations.
//!
//! Classification picks which canned remediation hints are surfaced to the
//! caller after the repair budget is spent; it never alters loop behavior.

use serde::Serialize;

/// Coarse classification of a pdflatex failure log. First match wins,
/// case-insensitive substring search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    UndefinedCommand,
    SyntaxError,
    PackageError,
    FontError,
    GeneralError,
}

impl ErrorClass {
    pub fn description(&self) -> &'static str {
        match self {
            ErrorClass::UndefinedCommand => "LaTeX command not recognized",
            ErrorClass::SyntaxError => "LaTeX syntax error (missing delimiters)",
            ErrorClass::PackageError => "LaTeX package error",
            ErrorClass::FontError => "Font not found",
            ErrorClass::GeneralError => "LaTeX compilation error",
        }
    }
}

pub fn classify(log: &str) -> ErrorClass {
    let log = log.to_lowercase();
    if log.contains("undefined control sequence") {
        ErrorClass::UndefinedCommand
    } else if log.contains("missing") {
        ErrorClass::SyntaxError
    } else if log.contains("package") {
        ErrorClass::PackageError
    } else if log.contains("font") && (log.contains("not found") || log.contains("error")) {
        ErrorClass::FontError
    } else {
        ErrorClass::GeneralError
    }
}

/// Canned remediation hints for a failing diagnostic. Always non-empty.
pub fn remediation(diagnostic: &str) -> Vec<String> {
    let lower = diagnostic.to_lowercase();
    let mut suggestions = Vec::new();

    if lower.contains("pdflatex not found") || lower.contains("not installed") {
        suggestions.push("Install a LaTeX distribution (e.g. TeX Live or BasicTeX)".to_string());
        suggestions.push("Restart the backend server after installation".to_string());
    } else if lower.contains("undefined control sequence") {
        suggestions.push("Check LaTeX command syntax".to_string());
        suggestions.push("Verify all packages are included in the template preamble".to_string());
    } else {
        suggestions.push("Check LaTeX syntax and spacing".to_string());
        suggestions.push("Verify the template is valid".to_string());
        suggestions.push("Try a simpler LaTeX template first".to_string());
    }

    suggestions
}

/// First `max` lines of the log that look like errors.
pub fn error_lines(log: &str, max: usize) -> Vec<String> {
    log.lines()
        .filter(|line| line.starts_with('!') || line.to_lowercase().contains("error"))
        .take(max)
        .map(str::to_string)
        .collect()
}
