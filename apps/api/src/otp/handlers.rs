use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::session::{SessionId, SessionView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

/// POST /api/v1/otp/send
pub async fn handle_send_otp(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.sessions.get(id).await.ok_or(AppError::Unauthorized)?;
    state.otp_gate.send(&mut session, &req.email).await?;

    // The send call may have overlapped other requests on this session.
    let sent_to = session.email;
    let updated = state
        .sessions
        .update(id, |s| {
            s.otp_sent = true;
            s.email = sent_to;
        })
        .await
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(updated.view(id)))
}

/// POST /api/v1/otp/verify
pub async fn handle_verify_otp(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<SessionView>, AppError> {
    let mut session = state.sessions.get(id).await.ok_or(AppError::Unauthorized)?;
    state
        .otp_gate
        .verify(&mut session, &req.email, &req.otp)
        .await?;

    let updated = state
        .sessions
        .update(id, |s| s.otp_verified = true)
        .await
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(updated.view(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp::{OtpError, OtpService, OtpVerdict};
    use crate::session::GateState;
    use crate::test_support::{test_state, RecordingFeedback};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::time::Duration;

    /// Send endpoint that answers after a delay; verify accepts any code.
    struct SlowSendOtp {
        delay: Duration,
    }

    #[async_trait]
    impl OtpService for SlowSendOtp {
        async fn send_otp(&self, _email: &str) -> Result<(), OtpError> {
            tokio::time::sleep(self.delay).await;
            Ok(())
        }

        async fn verify_otp(&self, _email: &str, _otp: &str) -> Result<OtpVerdict, OtpError> {
            Ok(OtpVerdict::Verified)
        }
    }

    fn slow_state() -> AppState {
        test_state(
            Arc::new(SlowSendOtp {
                delay: Duration::from_millis(200),
            }),
            Arc::new(RecordingFeedback::new("ok")),
        )
    }

    #[tokio::test]
    async fn test_resend_overlapping_verify_keeps_session_verified() {
        let state = slow_state();
        let (id, _) = state.sessions.create().await;
        state
            .sessions
            .update(id, |s| {
                s.otp_sent = true;
                s.email = Some("x@iu.edu".to_string());
            })
            .await;

        let resend = tokio::spawn(handle_send_otp(
            State(state.clone()),
            SessionId(id),
            Json(SendOtpRequest {
                email: "x@iu.edu".to_string(),
            }),
        ));
        // Let the resend read its snapshot and block on the slow endpoint.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let Json(view) = handle_verify_otp(
            State(state.clone()),
            SessionId(id),
            Json(VerifyOtpRequest {
                email: "x@iu.edu".to_string(),
                otp: "123456".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(view.gate, GateState::Verified);

        let Json(after_resend) = resend.await.unwrap().unwrap();
        assert!(after_resend.otp_verified);
        assert!(state.sessions.get(id).await.unwrap().otp_verified);
    }

    #[tokio::test]
    async fn test_send_on_ended_session_is_unauthorized() {
        let state = slow_state();
        let (id, _) = state.sessions.create().await;

        let pending = tokio::spawn(handle_send_otp(
            State(state.clone()),
            SessionId(id),
            Json(SendOtpRequest {
                email: "x@iu.edu".to_string(),
            }),
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        state.sessions.remove(id).await;

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
