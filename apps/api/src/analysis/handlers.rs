//! Axum route handlers for the analyzer. Both routes require a verified session.

use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::analysis::extraction::extract_pdf_text_blocking;
use crate::analysis::report::AnalysisReport;
use crate::analysis::wordcloud::render_svg;
use crate::analysis::{clamp_keyword_count, Analyzer};
use crate::errors::AppError;
use crate::session::SessionId;
use crate::state::AppState;

const MISSING_INPUT: &str = "Please upload a resume and paste a job description.";

/// Uploaded resume file, before extraction.
#[derive(Debug)]
pub struct ResumeUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ResumeUpload {
    /// Accepts `.pdf` files, or `application/pdf` when no file name was sent.
    pub fn is_pdf(&self) -> bool {
        match &self.file_name {
            Some(name) => name.to_ascii_lowercase().ends_with(".pdf"),
            None => self
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf")),
        }
    }
}

#[derive(Debug, Default)]
pub struct AnalyzeForm {
    pub job_description: Option<String>,
    pub resume: Option<ResumeUpload>,
    pub num_keywords: Option<usize>,
}

impl AnalyzeForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = AnalyzeForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed form data: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "job_description" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Unreadable job description: {e}")))?;
                    form.job_description = Some(text);
                }
                "resume" => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Unreadable resume upload: {e}")))?;
                    form.resume = Some(ResumeUpload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                "num_keywords" => {
                    let raw = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Unreadable num_keywords: {e}")))?;
                    let parsed = raw.trim().parse::<usize>().map_err(|_| {
                        AppError::Validation(format!("num_keywords must be a number, got '{raw}'"))
                    })?;
                    form.num_keywords = Some(parsed);
                }
                other => debug!("Ignoring unknown form field '{other}'"),
            }
        }

        Ok(form)
    }
}

/// POST /api/v1/analyze
///
/// Multipart form: `job_description`, `resume` (PDF), optional `num_keywords`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    multipart: Multipart,
) -> Result<Json<AnalysisReport>, AppError> {
    state.sessions.require_verified(id).await?;

    let form = AnalyzeForm::from_multipart(multipart).await?;

    let job_description = form
        .job_description
        .filter(|jd| !jd.trim().is_empty())
        .ok_or_else(|| AppError::Validation(MISSING_INPUT.to_string()))?;
    let resume = form
        .resume
        .filter(|r| !r.bytes.is_empty())
        .ok_or_else(|| AppError::Validation(MISSING_INPUT.to_string()))?;
    if !resume.is_pdf() {
        return Err(AppError::UnprocessableEntity(
            "Resume must be a PDF file".to_string(),
        ));
    }
    let num_keywords = clamp_keyword_count(form.num_keywords);

    if state.config.analysis_delay_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(
            state.config.analysis_delay_ms,
        ))
        .await;
    }

    let resume_text = extract_pdf_text_blocking(resume.bytes).await?;

    let analyzer = Analyzer {
        scorer: &state.scorer,
        feedback: state.feedback.as_ref(),
    };
    let report = analyzer
        .analyze(&job_description, &resume_text, num_keywords)
        .await?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct WordCloudRequest {
    pub text: String,
}

/// POST /api/v1/wordcloud
///
/// Returns the SVG word cloud for `text`, or 204 when it has no countable words.
pub async fn handle_word_cloud(
    State(state): State<AppState>,
    SessionId(id): SessionId,
    Json(req): Json<WordCloudRequest>,
) -> Result<Response, AppError> {
    state.sessions.require_verified(id).await?;

    let svg = tokio::task::spawn_blocking(move || render_svg(&req.text))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("word cloud task failed: {e}")))?;

    match svg {
        Some(svg) => Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
