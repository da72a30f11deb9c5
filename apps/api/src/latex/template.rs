//! The fixed resume template. An on-disk override can be configured via
//! `TEMPLATE_PATH`; otherwise the embedded default is used.

use std::path::Path;

use anyhow::{Context, Result};

pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/resume_template.tex");

pub fn load_template(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read template file {}", p.display())),
        None => Ok(DEFAULT_TEMPLATE.to_string()),
    }
}
