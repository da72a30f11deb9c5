use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/status
pub async fn status_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "tailor-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/latex-status
///
/// Reports whether the two external dependencies of the pipeline are ready:
/// the LaTeX toolchain and the model API key.
pub async fn latex_status_handler(State(state): State<AppState>) -> Json<Value> {
    let availability = state.compiler.availability().await;
    Json(json!({
        "latex_installed": availability.installed,
        "latex_info": availability.detail,
        "llm_configured": state.config.llm_configured(),
    }))
}
