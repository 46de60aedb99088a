//! Feedback Generator: asks the hosted chat model how the resume could better
//! match the job description.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::llm_client::{LlmClient, SamplingParams};

pub mod prompts;

use prompts::{build_feedback_prompt, FEEDBACK_SYSTEM};

/// Returned when the model answers without any completion.
pub const FALLBACK_FEEDBACK: &str = "Sorry, I couldn't generate feedback at this time.";

pub const FEEDBACK_SAMPLING: SamplingParams = SamplingParams {
    temperature: 0.5,
    max_tokens: 500,
    top_p: 1.0,
    frequency_penalty: 0.0,
    presence_penalty: 0.0,
};

#[async_trait]
pub trait FeedbackService: Send + Sync {
    async fn generate_feedback(
        &self,
        job_description: &str,
        resume_text: &str,
        missing_keywords: &[String],
    ) -> Result<String, AppError>;
}

/// Feedback backed by the chat-completion endpoint.
pub struct ChatFeedbackService {
    llm: LlmClient,
}

impl ChatFeedbackService {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FeedbackService for ChatFeedbackService {
    async fn generate_feedback(
        &self,
        job_description: &str,
        resume_text: &str,
        missing_keywords: &[String],
    ) -> Result<String, AppError> {
        let prompt = build_feedback_prompt(job_description, resume_text, missing_keywords);
        let response = self
            .llm
            .call(FEEDBACK_SYSTEM, &prompt, FEEDBACK_SAMPLING)
            .await
            .map_err(|e| AppError::Llm(format!("Feedback generation failed: {e}")))?;

        match response.text() {
            Some(text) => {
                info!("Feedback generated ({} chars)", text.len());
                Ok(text.trim().to_string())
            }
            None => {
                warn!("Chat model returned no completion; using fallback feedback");
                Ok(FALLBACK_FEEDBACK.to_string())
            }
        }
    }
}
