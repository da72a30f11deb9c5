use std::sync::Arc;

use crate::config::Config;
use crate::latex::compiler::Compiler;
use crate::llm_client::CompletionAdapter;

/// Shared application state. Both external effects sit behind trait objects
/// so handlers are testable against scripted fakes.
#[derive(Clone)]
pub struct AppState {
    pub llm: Arc<dyn CompletionAdapter>,
    pub compiler: Arc<dyn Compiler>,
    pub config: Config,
    pub template: Arc<String>,
}
