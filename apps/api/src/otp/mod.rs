//! OTP service: the capability the gate uses to issue and check one-time
//! passcodes. Production calls two external serverless endpoints over HTTP.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub mod gate;
pub mod handlers;

/// Body text the verify endpoint returns when the code matched.
pub const CONFIRMATION_PHRASE: &str = "OTP verification successful.";

#[derive(Debug, Error)]
pub enum OtpError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OTP endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Outcome of a verify call that reached the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpVerdict {
    Verified,
    Rejected,
}

#[async_trait]
pub trait OtpService: Send + Sync {
    /// Asks the endpoint to email a code. Only HTTP 200 counts as success.
    async fn send_otp(&self, email: &str) -> Result<(), OtpError>;

    /// Checks a code. `Err` means the endpoint could not be reached;
    /// every response that did arrive maps to a verdict.
    async fn verify_otp(&self, email: &str, otp: &str) -> Result<OtpVerdict, OtpError>;
}

#[derive(Debug, Serialize)]
struct SendOtpRequest<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct VerifyOtpRequest<'a> {
    email: &'a str,
    otp: &'a str,
}

#[derive(Clone)]
pub struct HttpOtpService {
    client: Client,
    send_url: String,
    verify_url: String,
}

impl HttpOtpService {
    pub fn new(send_url: String, verify_url: String) -> Result<Self, OtpError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            send_url,
            verify_url,
        })
    }
}

#[async_trait]
impl OtpService for HttpOtpService {
    async fn send_otp(&self, email: &str) -> Result<(), OtpError> {
        let response = self
            .client
            .post(&self.send_url)
            .json(&SendOtpRequest { email })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(OtpError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!("OTP sent");
        Ok(())
    }

    async fn verify_otp(&self, email: &str, otp: &str) -> Result<OtpVerdict, OtpError> {
        let response = self
            .client
            .post(&self.verify_url)
            .json(&VerifyOtpRequest { email, otp })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            warn!("Failed to verify OTP. Status code: {status}, Response: {body}");
            return Ok(OtpVerdict::Rejected);
        }

        Ok(verdict_from_body(&body))
    }
}

fn verdict_from_body(body: &str) -> OtpVerdict {
    if body.contains(CONFIRMATION_PHRASE) {
        OtpVerdict::Verified
    } else {
        OtpVerdict::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_mock;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::Value;

    #[test]
    fn test_verdict_requires_exact_phrase() {
        assert_eq!(
            verdict_from_body("\"OTP verification successful.\""),
            OtpVerdict::Verified
        );
        assert_eq!(
            verdict_from_body("OTP verification failed."),
            OtpVerdict::Rejected
        );
        assert_eq!(
            verdict_from_body("otp verification successful."),
            OtpVerdict::Rejected
        );
    }

    #[tokio::test]
    async fn test_send_succeeds_on_200_and_posts_email() {
        let app = Router::new().route(
            "/send",
            post(|Json(body): Json<Value>| async move {
                if body["email"] == "x@iu.edu" {
                    AxumStatus::OK
                } else {
                    AxumStatus::BAD_REQUEST
                }
            }),
        );
        let base = spawn_mock(app).await;
        let service =
            HttpOtpService::new(format!("{base}/send"), format!("{base}/verify")).unwrap();

        assert!(service.send_otp("x@iu.edu").await.is_ok());
        let err = service.send_otp("y@iu.edu").await.unwrap_err();
        assert!(matches!(err, OtpError::Status { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_send_treats_other_2xx_as_failure() {
        let app = Router::new().route("/send", post(|| async { AxumStatus::ACCEPTED }));
        let base = spawn_mock(app).await;
        let service =
            HttpOtpService::new(format!("{base}/send"), format!("{base}/verify")).unwrap();

        assert!(matches!(
            service.send_otp("x@iu.edu").await,
            Err(OtpError::Status { status: 202, .. })
        ));
    }

    #[tokio::test]
    async fn test_verify_checks_status_and_body() {
        let app = Router::new().route(
            "/verify",
            post(|Json(body): Json<Value>| async move {
                match body["otp"].as_str() {
                    Some("123456") => (AxumStatus::OK, "OTP verification successful."),
                    Some("000000") => (AxumStatus::OK, "OTP verification failed."),
                    _ => (AxumStatus::INTERNAL_SERVER_ERROR, "OTP verification successful."),
                }
            }),
        );
        let base = spawn_mock(app).await;
        let service =
            HttpOtpService::new(format!("{base}/send"), format!("{base}/verify")).unwrap();

        assert_eq!(
            service.verify_otp("x@iu.edu", "123456").await.unwrap(),
            OtpVerdict::Verified
        );
        assert_eq!(
            service.verify_otp("x@iu.edu", "000000").await.unwrap(),
            OtpVerdict::Rejected
        );
        // Confirmation phrase on a non-200 status still fails.
        assert_eq!(
            service.verify_otp("x@iu.edu", "999999").await.unwrap(),
            OtpVerdict::Rejected
        );
    }

    #[tokio::test]
    async fn test_verify_transport_fault_is_error() {
        let service = HttpOtpService::new(
            "http://127.0.0.1:9/send".to_string(),
            "http://127.0.0.1:9/verify".to_string(),
        )
        .unwrap();

        assert!(matches!(
            service.verify_otp("x@iu.edu", "123456").await,
            Err(OtpError::Http(_))
        ));
    }
}
