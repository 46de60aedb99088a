use std::sync::Arc;

use crate::analysis::similarity::SimilarityScorer;
use crate::config::Config;
use crate::feedback::FeedbackService;
use crate::otp::gate::OtpGate;
use crate::session::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub otp_gate: OtpGate,
    /// Embedding-based scorer. The model is loaded once at startup.
    pub scorer: SimilarityScorer,
    /// Pluggable feedback backend. Default: `ChatFeedbackService`.
    pub feedback: Arc<dyn FeedbackService>,
}
