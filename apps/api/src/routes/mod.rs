pub mod health;
pub mod page;
pub mod session;

use axum::{
    extract::DefaultBodyLimit,
    http::Uri,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::errors::AppError;
use crate::otp::handlers as otp;
use crate::state::AppState;

/// Resumes larger than this are rejected before parsing.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {uri}"))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page::index_handler))
        .route("/health", get(health::health_handler))
        // Session + OTP gate
        .route(
            "/api/v1/session",
            post(session::handle_create_session)
                .get(session::handle_get_session)
                .delete(session::handle_end_session),
        )
        .route("/api/v1/otp/send", post(otp::handle_send_otp))
        .route("/api/v1/otp/verify", post(otp::handle_verify_otp))
        // Analyzer (verified sessions only)
        .route("/api/v1/analyze", post(analysis::handle_analyze))
        .route("/api/v1/wordcloud", post(analysis::handle_word_cloud))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
