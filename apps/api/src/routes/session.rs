use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::errors::AppError;
use crate::session::{SessionId, SessionView};
use crate::state::AppState;

/// POST /api/v1/session
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let (id, session) = state.sessions.create().await;
    info!("Session opened");
    (StatusCode::CREATED, Json(session.view(id)))
}

/// GET /api/v1/session
pub async fn handle_get_session(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> Result<Json<SessionView>, AppError> {
    let session = state.sessions.get(id).await.ok_or(AppError::Unauthorized)?;
    Ok(Json(session.view(id)))
}

/// DELETE /api/v1/session
pub async fn handle_end_session(
    State(state): State<AppState>,
    SessionId(id): SessionId,
) -> StatusCode {
    if state.sessions.remove(id).await {
        info!("Session ended");
    }
    StatusCode::NO_CONTENT
}
