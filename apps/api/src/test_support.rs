//! Shared fixtures for unit and router tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use crate::analysis::keywords::tokenize;
use crate::analysis::similarity::{SimilarityScorer, TextEncoder};
use crate::config::Config;
use crate::errors::AppError;
use crate::feedback::FeedbackService;
use crate::otp::gate::OtpGate;
use crate::otp::OtpService;
use crate::session::SessionStore;
use crate::state::AppState;

/// Serves `app` on an ephemeral loopback port and returns its base URL.
pub async fn spawn_mock(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Single-page PDF with one Helvetica text line per entry.
/// Lines must not contain parentheses or backslashes.
pub fn minimal_pdf(lines: &[&str]) -> Vec<u8> {
    let mut content = String::from("BT /F1 12 Tf 72 720 Td 14 TL\n");
    for line in lines {
        content.push_str(&format!("({line}) Tj T*\n"));
    }
    content.push_str("ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    pdf.push_str("0000000000 65535 f \n");
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    ));
    pdf.into_bytes()
}

/// Deterministic bag-of-words encoder: each token is hashed (FNV-1a) into a
/// fixed number of buckets.
pub struct HashingEncoder {
    dims: usize,
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self { dims: 256 }
    }
}

impl TextEncoder for HashingEncoder {
    fn encode(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.dims];
        for token in tokenize(text) {
            let mut hash: u64 = 0xcbf29ce484222325;
            for b in token.bytes() {
                hash ^= u64::from(b);
                hash = hash.wrapping_mul(0x100000001b3);
            }
            v[(hash % self.dims as u64) as usize] += 1.0;
        }
        v
    }

    fn model_name(&self) -> &str {
        "hashing-test-encoder"
    }
}

/// Feedback stub that records the missing keywords of every call.
pub struct RecordingFeedback {
    reply: Option<String>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingFeedback {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackService for RecordingFeedback {
    async fn generate_feedback(
        &self,
        _job_description: &str,
        _resume_text: &str,
        missing_keywords: &[String],
    ) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(missing_keywords.to_vec());
        self.reply
            .clone()
            .ok_or_else(|| AppError::Llm("quota exceeded".to_string()))
    }
}

pub fn test_state(otp: Arc<dyn OtpService>, feedback: Arc<dyn FeedbackService>) -> AppState {
    let config = Config::for_tests();
    AppState {
        sessions: SessionStore::new(config.session_idle_ttl_secs),
        otp_gate: OtpGate::new(otp, config.allowed_email_domain.clone()),
        scorer: SimilarityScorer::new(Arc::new(HashingEncoder::default())),
        feedback,
        config,
    }
}
