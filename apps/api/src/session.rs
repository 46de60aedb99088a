//! Per-session gate state.
//!
//! A session is created by the browser page on load and identified by a random
//! UUID carried in the `x-session-id` header. The only state it holds is the
//! OTP gate: whether a code was sent, and whether it was verified. Sessions are
//! independent of each other; a session ends when the client deletes it or when
//! it has been idle longer than the configured TTL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;

pub const SESSION_HEADER: &str = "x-session-id";

/// Position of a session in the OTP state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Unverified,
    OtpSent,
    Verified,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub otp_sent: bool,
    pub otp_verified: bool,
    /// Address the most recent OTP was sent to.
    pub email: Option<String>,
    pub last_seen: DateTime<Utc>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            otp_sent: false,
            otp_verified: false,
            email: None,
            last_seen: Utc::now(),
        }
    }

    pub fn gate(&self) -> GateState {
        if self.otp_verified {
            GateState::Verified
        } else if self.otp_sent {
            GateState::OtpSent
        } else {
            GateState::Unverified
        }
    }

    pub fn view(&self, session_id: Uuid) -> SessionView {
        SessionView {
            session_id,
            otp_sent: self.otp_sent,
            otp_verified: self.otp_verified,
            gate: self.gate(),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Session flags as returned to the browser.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub otp_sent: bool,
    pub otp_verified: bool,
    pub gate: GateState,
}

/// In-memory session registry shared by all handlers.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionState>>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl_secs: u64) -> Self {
        let secs = i64::try_from(idle_ttl_secs).unwrap_or(i64::MAX).min(i64::MAX / 1_000);
        let idle_ttl = Duration::seconds(secs);
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    /// Opens a fresh session with both flags cleared. Expired sessions are
    /// pruned on the way.
    pub async fn create(&self) -> (Uuid, SessionState) {
        let id = Uuid::new_v4();
        let session = SessionState::new();
        let now = Utc::now();

        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !self.is_expired(s, now));
        let pruned = before - sessions.len();
        if pruned > 0 {
            debug!("Pruned {pruned} idle sessions");
        }
        sessions.insert(id, session.clone());

        (id, session)
    }

    /// Returns a snapshot of the session and refreshes its idle timer.
    /// An expired session is removed and reported as absent.
    pub async fn get(&self, id: Uuid) -> Option<SessionState> {
        let now = Utc::now();
        let mut sessions = self.inner.write().await;

        let expired = sessions.get(&id).map(|s| self.is_expired(s, now))?;
        if expired {
            sessions.remove(&id);
            return None;
        }

        let session = sessions.get_mut(&id)?;
        session.last_seen = now;
        Some(session.clone())
    }

    /// Applies `change` to the live session under the write lock and returns
    /// the result. Callers set individual fields; snapshots taken before an
    /// await are never written back. `None` if the session ended meanwhile.
    pub async fn update<F>(&self, id: Uuid, change: F) -> Option<SessionState>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut sessions = self.inner.write().await;
        let session = sessions.get_mut(&id)?;
        change(session);
        session.last_seen = Utc::now();
        Some(session.clone())
    }

    /// Gate check for analyzer routes: unknown sessions are unauthorized,
    /// unverified ones forbidden.
    pub async fn require_verified(&self, id: Uuid) -> Result<SessionState, AppError> {
        let session = self.get(id).await.ok_or(AppError::Unauthorized)?;
        if !session.otp_verified {
            return Err(AppError::Forbidden);
        }
        Ok(session)
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.inner.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    fn is_expired(&self, session: &SessionState, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(session.last_seen) > self.idle_ttl
    }
}

/// Extracts the session id from the `x-session-id` header.
#[derive(Debug, Clone, Copy)]
pub struct SessionId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uuid::parse_str(v.trim()).ok())
            .map(SessionId)
            .ok_or(AppError::Unauthorized)
    }
}
