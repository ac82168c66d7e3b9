//! mailsage-api server binary.
//!
//! Wiring: the OpenAI-compatible generation backend and optional OCR
//! backend come from the environment; the mailbox provider and memory
//! store are deployment-specific collaborators, stubbed here with the
//! in-process implementations.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use mailsage_api::{app, AppState};
use mailsage_core::{defaults, InMemoryStore, OcrBackend};
use mailsage_inference::{OpenAiBackend, VisionOcrBackend};
use mailsage_mail::FixtureMailbox;
use mailsage_pipeline::AskPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let session_token = std::env::var("MAILSAGE_SESSION_TOKEN")
        .ok()
        .filter(|token| !token.is_empty());
    if session_token.is_none() {
        warn!("MAILSAGE_SESSION_TOKEN not set; every /ask request will be rejected with 401");
    }

    let pipeline = match OpenAiBackend::from_env() {
        Some(generation) => {
            let mut pipeline = AskPipeline::new(
                Arc::new(FixtureMailbox::new()),
                Arc::new(generation),
                Arc::new(InMemoryStore::new()),
            );
            if let Some(ocr) = VisionOcrBackend::from_env() {
                info!(model = ocr.model_name(), "OCR backend configured");
                pipeline = pipeline.with_ocr(Arc::new(ocr));
            }
            Some(Arc::new(pipeline))
        }
        None => {
            warn!("MAILSAGE_LLM_API_KEY not set; /ask will answer 500 until configured");
            None
        }
    };

    let state = AppState {
        pipeline,
        session_token,
        user_id: std::env::var("MAILSAGE_USER_ID").unwrap_or_else(|_| "default".to_string()),
    };

    let port = std::env::var("MAILSAGE_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(defaults::SERVER_PORT);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "mailsage-api listening");

    axum::serve(listener, app(state)).await?;
    Ok(())
}
