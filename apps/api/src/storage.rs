//! Artifact persistence. Every generation, repair, and refinement attempt
//! leaves a uniquely named file in the uploads directory so a failed request
//! can be debugged after the fact. Unique ids also namespace concurrent
//! requests — no locking is needed anywhere in the pipeline.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::{Context, Result};
use tracing::warn;
use uuid::Uuid;

/// Full-length id namespacing one request's artifacts.
pub fn request_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Short id for individual compiler files within a request.
pub fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create directory {}", dir.display()))
}

/// Persists one candidate document under a unique name; returns the path.
pub async fn save_latex_file(dir: &Path, content: &str, prefix: &str) -> Result<PathBuf> {
    let path = dir.join(format!("{prefix}_{}.tex", short_id()));
    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Writes `{prefix}_ERROR.log` capturing exit status, both streams, and the
/// compiler log. Best-effort: failures are logged, never propagated.
pub async fn write_error_log(dir: &Path, prefix: &str, run: &Output, log: &str) {
    let path = dir.join(format!("{prefix}_ERROR.log"));
    let body = format!(
        "=== COMPILATION ERROR at {} ===\nExit status: {}\n\n=== STDOUT ===\n{}\n\n=== STDERR ===\n{}\n\n=== LOG FILE ===\n{}\n",
        chrono::Utc::now().to_rfc3339(),
        run.status,
        String::from_utf8_lossy(&run.stdout),
        String::from_utf8_lossy(&run.stderr),
        log,
    );
    if let Err(e) = tokio::fs::write(&path, body).await {
        warn!("Failed to write error log {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_sized() {
        assert_ne!(request_id(), request_id());
        assert_eq!(short_id().len(), 8);
    }

    #[tokio::test]
    async fn test_save_latex_file_writes_unique_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = save_latex_file(dir.path(), "\\documentclass{article}", "resume_x")
            .await
            .unwrap();
        let b = save_latex_file(dir.path(), "\\documentclass{article}", "resume_x")
            .await
            .unwrap();
        assert_ne!(a, b);
        assert!(a.file_name().unwrap().to_str().unwrap().starts_with("resume_x_"));
        assert_eq!(
            std::fs::read_to_string(&a).unwrap(),
            "\\documentclass{article}"
        );
    }
}
