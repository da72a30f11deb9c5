use std::env;
use std::path::PathBuf;

/// Runtime configuration, read once at startup from the environment
/// (a `.env` file is honored via dotenvy in `main`).
#[derive(Debug, Clone)]
pub struct Config {
    /// Anthropic API key. Absent is allowed so status endpoints can report
    /// the gap instead of the process refusing to boot; generation endpoints
    /// reject requests until it is set.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    /// Directory for uploads and all compile artifacts.
    pub uploads_dir: PathBuf,
    /// Optional override for the bundled LaTeX resume template.
    pub template_path: Option<PathBuf>,
    /// Repair budget: maximum number of LLM fix attempts per request.
    pub max_compile_attempts: u32,
    /// A refined document shorter than this fraction of the original is
    /// discarded as a truncated rewrite.
    pub refine_min_length_ratio: f64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        let anthropic_api_key = env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(8080);

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let template_path = env::var("TEMPLATE_PATH").ok().map(PathBuf::from);

        let max_compile_attempts = env::var("MAX_COMPILE_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(crate::generation::repair::DEFAULT_MAX_ATTEMPTS);

        let refine_min_length_ratio = env::var("REFINE_MIN_LENGTH_RATIO")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.5);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            anthropic_api_key,
            port,
            uploads_dir,
            template_path,
            max_compile_attempts,
            refine_min_length_ratio,
            rust_log,
        }
    }

    pub fn llm_configured(&self) -> bool {
        self.anthropic_api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_config() -> Config {
        Config {
            anthropic_api_key: None,
            port: 8080,
            uploads_dir: PathBuf::from("uploads"),
            template_path: None,
            max_compile_attempts: 5,
            refine_min_length_ratio: 0.5,
            rust_log: "info".to_string(),
        }
    }

    #[test]
    fn test_llm_configured_requires_key() {
        let mut config = blank_config();
        assert!(!config.llm_configured());

        config.anthropic_api_key = Some("sk-ant-test".to_string());
        assert!(config.llm_configured());
    }
}
