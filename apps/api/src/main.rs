mod analysis;
mod config;
mod errors;
mod feedback;
mod llm_client;
mod otp;
mod routes;
mod session;
mod state;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::similarity::{Model2VecEncoder, SimilarityScorer};
use crate::config::Config;
use crate::feedback::ChatFeedbackService;
use crate::llm_client::LlmClient;
use crate::otp::gate::OtpGate;
use crate::otp::HttpOtpService;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Matcher v{}", env!("CARGO_PKG_VERSION"));

    // Load the embedding model (may download from the Hugging Face Hub)
    let model_name = config.embedding_model.clone();
    let encoder = tokio::task::spawn_blocking(move || Model2VecEncoder::load(&model_name))
        .await
        .context("embedding model loader panicked")??;
    let scorer = SimilarityScorer::new(Arc::new(encoder));

    // Initialize OTP gate
    let otp_service = HttpOtpService::new(config.send_otp_url.clone(), config.verify_otp_url.clone())
        .context("Failed to build OTP HTTP client")?;
    let otp_gate = OtpGate::new(Arc::new(otp_service), config.allowed_email_domain.clone());
    info!("OTP gate initialized (domain: {})", config.allowed_email_domain);

    // Initialize LLM client
    let llm = LlmClient::new(
        config.openai_api_url.clone(),
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    )
    .context("Failed to build LLM HTTP client")?;
    info!("LLM client initialized (model: {})", llm.model());
    let feedback = Arc::new(ChatFeedbackService::new(llm));

    // Build app state
    let state = AppState {
        sessions: SessionStore::new(config.session_idle_ttl_secs),
        otp_gate,
        scorer,
        feedback,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the page is served from a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
