//! OTP Gate: the session state machine in front of the analyzer.
//!
//! `Unverified --send(valid email)--> OtpSent --verify(correct code)--> Verified`
//!
//! `Verified` is terminal for the session. There is no expiry, resend
//! throttling, or attempt limit.

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::otp::{OtpService, OtpVerdict};
use crate::session::SessionState;

#[derive(Clone)]
pub struct OtpGate {
    service: Arc<dyn OtpService>,
    allowed_domain: String,
}

impl OtpGate {
    pub fn new(service: Arc<dyn OtpService>, allowed_domain: String) -> Self {
        Self {
            service,
            allowed_domain,
        }
    }

    /// Requests a code for `email`. On success the session moves to `OtpSent`.
    /// An address outside the allowed domain is rejected before any network call.
    pub async fn send(&self, session: &mut SessionState, email: &str) -> Result<(), AppError> {
        let email = validate_email(email, &self.allowed_domain)?;

        self.service.send_otp(&email).await.map_err(|e| {
            warn!("OTP send failed: {e}");
            AppError::OtpSend(e.to_string())
        })?;

        info!("OTP sent for session");
        session.otp_sent = true;
        session.email = Some(email);
        Ok(())
    }

    /// Checks `code` for the address the OTP was sent to. On success the
    /// session moves to `Verified`; on any failure it stays where it was.
    pub async fn verify(
        &self,
        session: &mut SessionState,
        email: &str,
        code: &str,
    ) -> Result<(), AppError> {
        if session.otp_verified {
            return Ok(());
        }
        if !session.otp_sent {
            return Err(AppError::Validation(
                "Request an OTP before verifying".to_string(),
            ));
        }

        let email = email.trim();
        let code = code.trim();
        if email.is_empty() || code.is_empty() {
            return Err(AppError::Validation(
                "Both email and OTP are required".to_string(),
            ));
        }
        let sent_to = session.email.as_deref().unwrap_or_default();
        if !email.eq_ignore_ascii_case(sent_to) {
            return Err(AppError::Validation(
                "Enter the email address the OTP was sent to.".to_string(),
            ));
        }

        match self.service.verify_otp(email, code).await {
            Ok(OtpVerdict::Verified) => {
                info!("OTP verified for session");
                session.otp_verified = true;
                Ok(())
            }
            Ok(OtpVerdict::Rejected) => Err(AppError::OtpIncorrect),
            Err(e) => {
                warn!("OTP verification could not complete: {e}");
                Err(AppError::OtpUnavailable(e.to_string()))
            }
        }
    }
}

/// Trims the address and checks it ends with the organisation's suffix.
pub fn validate_email(email: &str, allowed_domain: &str) -> Result<String, AppError> {
    let email = email.trim();
    if email.is_empty() || !email.ends_with(allowed_domain) || email.len() == allowed_domain.len() {
        return Err(AppError::Validation(format!(
            "Please enter a valid {allowed_domain} email address."
        )));
    }
    Ok(email.to_string())
}
