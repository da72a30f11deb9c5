//! Compiler adapter — invokes pdflatex on candidate documents.
//!
//! Each invocation writes its source into the uploads directory under a fresh
//! unique name, so concurrent requests never collide and every attempt's
//! `.tex`/`.log` pair survives for post-hoc debugging. pdflatex runs twice
//! per invocation so cross-references resolve before the output is trusted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{info, warn};

use crate::storage;

const COMPILE_TIMEOUT: Duration = Duration::from_secs(60);
const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of one compiler invocation.
#[derive(Debug, Clone)]
pub enum CompileOutcome {
    Success { pdf_path: PathBuf, log: String },
    Failure { error: String, log: Option<String> },
}

/// Result of the toolchain-availability probe.
#[derive(Debug, Clone)]
pub struct Availability {
    pub installed: bool,
    pub detail: String,
}

#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, source: &str, filename_prefix: &str) -> CompileOutcome;
    async fn availability(&self) -> Availability;
}

pub struct PdflatexCompiler {
    binary: Option<PathBuf>,
    workdir: PathBuf,
}

impl PdflatexCompiler {
    /// Locates pdflatex at startup. A missing binary is not fatal here — it
    /// is reported per request and via the status endpoint.
    pub fn discover(workdir: PathBuf) -> Self {
        let binary = find_pdflatex();
        match &binary {
            Some(path) => info!("pdflatex found at {}", path.display()),
            None => warn!("pdflatex not found; compilation requests will be rejected"),
        }
        Self::new(binary, workdir)
    }

    fn new(binary: Option<PathBuf>, workdir: PathBuf) -> Self {
        Self { binary, workdir }
    }
}

fn find_pdflatex() -> Option<PathBuf> {
    const CANDIDATES: &[&str] = &[
        "/usr/local/texlive/2025/bin/x86_64-linux/pdflatex",
        "/usr/local/texlive/2024/bin/x86_64-linux/pdflatex",
        "/usr/local/texlive/2025basic/bin/universal-darwin/pdflatex",
        "/usr/local/texlive/2024basic/bin/universal-darwin/pdflatex",
        "/usr/local/bin/pdflatex",
        "/opt/local/bin/pdflatex",
        "/usr/bin/pdflatex",
    ];

    for candidate in CANDIDATES {
        let path = Path::new(candidate);
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    let output = std::process::Command::new("which")
        .arg("pdflatex")
        .output()
        .ok()?;
    if output.status.success() {
        let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    None
}

#[async_trait]
impl Compiler for PdflatexCompiler {
    async fn compile(&self, source: &str, filename_prefix: &str) -> CompileOutcome {
        let Some(binary) = &self.binary else {
            return CompileOutcome::Failure {
                error: "pdflatex not found".to_string(),
                log: None,
            };
        };

        let stem = format!("{filename_prefix}_{}", storage::short_id());
        let tex_path = self.workdir.join(format!("{stem}.tex"));
        let pdf_path = self.workdir.join(format!("{stem}.pdf"));
        let log_path = self.workdir.join(format!("{stem}.log"));

        if let Err(e) = tokio::fs::write(&tex_path, source).await {
            return CompileOutcome::Failure {
                error: format!("Failed to write source file: {e}"),
                log: None,
            };
        }

        info!("Compiling {stem}.tex");

        // Two passes so \pageref and friends settle.
        let mut final_run = None;
        for _pass in 0..2 {
            let run = tokio::time::timeout(
                COMPILE_TIMEOUT,
                Command::new(binary)
                    .arg("-interaction=nonstopmode")
                    .arg("-output-directory")
                    .arg(&self.workdir)
                    .arg(&tex_path)
                    .current_dir(&self.workdir)
                    .output(),
            )
            .await;

            match run {
                Ok(Ok(output)) => final_run = Some(output),
                Ok(Err(e)) => {
                    return CompileOutcome::Failure {
                        error: format!("Failed to execute pdflatex: {e}"),
                        log: None,
                    }
                }
                Err(_) => {
                    return CompileOutcome::Failure {
                        error: "Compilation timeout (60s exceeded)".to_string(),
                        log: None,
                    }
                }
            }
        }

        let Some(run) = final_run else {
            return CompileOutcome::Failure {
                error: "pdflatex produced no output".to_string(),
                log: None,
            };
        };

        let log = match tokio::fs::read_to_string(&log_path).await {
            Ok(contents) => contents,
            Err(_) => String::from_utf8_lossy(&run.stdout).into_owned(),
        };

        let pdf_exists = tokio::fs::metadata(&pdf_path)
            .await
            .map(|m| m.len() > 0)
            .unwrap_or(false);

        if pdf_exists {
            info!("PDF generated: {}", pdf_path.display());
            CompileOutcome::Success { pdf_path, log }
        } else {
            let error = format!("PDF not generated (exit status: {})", run.status);
            storage::write_error_log(&self.workdir, filename_prefix, &run, &log).await;
            CompileOutcome::Failure {
                error,
                log: Some(log),
            }
        }
    }

    async fn availability(&self) -> Availability {
        let Some(binary) = &self.binary else {
            return Availability {
                installed: false,
                detail: "pdflatex not found - LaTeX not installed".to_string(),
            };
        };

        let probe = tokio::time::timeout(
            VERSION_TIMEOUT,
            Command::new(binary).arg("--version").output(),
        )
        .await;

        match probe {
            Ok(Ok(output)) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                Availability {
                    installed: true,
                    detail: stdout.lines().next().unwrap_or("pdflatex").to_string(),
                }
            }
            Ok(Ok(_)) => Availability {
                installed: false,
                detail: "pdflatex version check failed".to_string(),
            },
            Ok(Err(e)) => Availability {
                installed: false,
                detail: format!("Error checking pdflatex: {e}"),
            },
            Err(_) => Availability {
                installed: false,
                detail: "pdflatex version check timed out".to_string(),
            },
        }
    }
}
