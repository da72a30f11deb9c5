mod config;
mod errors;
mod extract;
mod generation;
mod latex;
mod llm_client;
mod routes;
mod state;
mod storage;

use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::latex::compiler::{Compiler, PdflatexCompiler};
use crate::latex::template::load_template;
use crate::llm_client::{CompletionAdapter, LlmClient};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if !config.llm_configured() {
        warn!("ANTHROPIC_API_KEY is not set; generation endpoints will reject requests");
    }

    storage::ensure_dir(&config.uploads_dir).await?;
    let template = load_template(config.template_path.as_deref())?;

    let llm: Arc<dyn CompletionAdapter> = Arc::new(LlmClient::new(
        config.anthropic_api_key.clone().unwrap_or_default(),
    ));
    info!("Completion model: {}", llm_client::MODEL);

    let compiler: Arc<dyn Compiler> = Arc::new(PdflatexCompiler::discover(
        config.uploads_dir.clone(),
    ));

    let state = AppState {
        llm,
        compiler,
        config: config.clone(),
        template: Arc::new(template),
    };

    let app = routes::build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
