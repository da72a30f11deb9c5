//! Extraction adapter: uploaded resume file → raw text + best-effort contact
//! fields. The model does all intelligent parsing downstream, so this stays a
//! dumb text extractor. An extraction failure is terminal for the request.

use std::path::Path;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Failed to extract text from {file}: {detail}")]
    Extraction { file: String, detail: String },

    #[error("No text could be extracted from {0}")]
    EmptyText(String),
}

/// Best-effort contact fields. No field is guaranteed present.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Produced once per request; immutable input to the generator.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedResume {
    pub raw_text: String,
    pub contact: ContactInfo,
    pub file_type: String,
    pub filename: String,
    pub text_length: usize,
}

pub fn parse_resume_file(path: &Path) -> Result<ParsedResume, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::NotFound(path.display().to_string()));
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("resume")
        .to_string();

    let text = match extension.as_str() {
        "pdf" => extract_pdf(path)?,
        "docx" | "doc" => extract_docx(path)?,
        other => return Err(ExtractError::UnsupportedType(format!(".{other}"))),
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ExtractError::EmptyText(filename));
    }

    let contact = extract_contact_info(&text);

    Ok(ParsedResume {
        text_length: text.len(),
        contact,
        file_type: format!(".{extension}"),
        filename,
        raw_text: text,
    })
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    pdf_extract::extract_text(path).map_err(|e| ExtractError::Extraction {
        file: path.display().to_string(),
        detail: e.to_string(),
    })
}

fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let fail = |detail: String| ExtractError::Extraction {
        file: path.display().to_string(),
        detail,
    };

    let buf = std::fs::read(path).map_err(|e| fail(e.to_string()))?;
    let docx = docx_rs::read_docx(&buf).map_err(|e| fail(format!("{e:?}")))?;

    let mut text = String::new();
    for child in &docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for para_child in &paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = para_child {
                    for run_child in &run.children {
                        if let docx_rs::RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

/// Pulls email, phone, and a plausible name out of the raw text.
fn extract_contact_info(text: &str) -> ContactInfo {
    let mut contact = ContactInfo::default();

    if let Ok(re) = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b") {
        if let Some(m) = re.find(text) {
            contact.email = Some(m.as_str().to_string());
        }
    }

    const PHONE_PATTERNS: &[&str] = &[
        r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b",
        r"\(\d{3}\)\s*\d{3}[-.]?\d{4}",
        r"\+1[-.]?\d{3}[-.]?\d{3}[-.]?\d{4}",
    ];
    for pattern in PHONE_PATTERNS {
        if let Ok(re) = Regex::new(pattern) {
            if let Some(m) = re.find(text) {
                contact.phone = Some(m.as_str().to_string());
                break;
            }
        }
    }

    // Name heuristic: first non-empty line, punctuation stripped, at most
    // four words. Longer lines are headers or addresses, not names.
    if let Some(first_line) = text.lines().map(str::trim).find(|l| !l.is_empty()) {
        let cleaned: String = first_line
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        if !cleaned.is_empty() && cleaned.split_whitespace().count() <= 4 {
            contact.name = Some(cleaned);
        }
    }

    contact
}
