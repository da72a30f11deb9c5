pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::generation::handlers::{
    handle_download_pdf, handle_enhance_resume, handle_get_suggestions, handle_refine_resume,
};
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(health::status_handler))
        .route("/api/latex-status", get(health::latex_status_handler))
        .route("/api/enhance-resume", post(handle_enhance_resume))
        .route("/api/refine-resume", post(handle_refine_resume))
        .route("/api/get-suggestions", post(handle_get_suggestions))
        .route("/api/download-pdf/:filename", get(handle_download_pdf))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
