//! Presentation layer: turns computed analysis values into the payload the
//! browser renders.

use pulldown_cmark::{html, Event, Options, Parser, Tag};
use serde::Serialize;

use crate::analysis::keywords::KeywordOverlap;
use crate::analysis::wordcloud::{render_svg, svg_data_uri};
use crate::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct WordCloudImage {
    pub caption: String,
    /// `data:image/svg+xml;base64,...`
    pub data_uri: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub similarity_score: f32,
    /// Score with two decimals, e.g. `0.83`.
    pub similarity_display: String,
    pub job_keywords: Vec<String>,
    pub resume_keywords: Vec<String>,
    pub matching_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub matching_display: String,
    pub missing_display: String,
    pub feedback_markdown: String,
    pub feedback_html: String,
    pub word_clouds: Vec<WordCloudImage>,
}

pub struct ReportInputs {
    pub similarity: f32,
    pub job_keywords: Vec<String>,
    pub resume_keywords: Vec<String>,
    pub overlap: KeywordOverlap,
    pub feedback: String,
    pub word_clouds: Vec<WordCloudImage>,
}

pub fn build_report(inputs: ReportInputs) -> AnalysisReport {
    AnalysisReport {
        similarity_score: inputs.similarity,
        similarity_display: format_score(inputs.similarity),
        matching_display: inputs.overlap.matching.join(", "),
        missing_display: inputs.overlap.missing.join(", "),
        job_keywords: inputs.job_keywords,
        resume_keywords: inputs.resume_keywords,
        matching_keywords: inputs.overlap.matching,
        missing_keywords: inputs.overlap.missing,
        feedback_html: render_markdown(&inputs.feedback),
        feedback_markdown: inputs.feedback,
        word_clouds: inputs.word_clouds,
    }
}

pub fn format_score(score: f32) -> String {
    format!("{score:.2}")
}

/// One cloud per non-empty input, job description first.
pub fn word_clouds(job_description: &str, resume_text: &str) -> Vec<WordCloudImage> {
    [
        (job_description, "Job Description Word Cloud"),
        (resume_text, "Resume Word Cloud"),
    ]
    .into_iter()
    .filter_map(|(text, caption)| word_cloud_image(text, caption))
    .collect()
}

/// [`word_clouds`] on the blocking pool; the spiral layout is CPU-bound.
pub async fn word_clouds_blocking(
    job_description: String,
    resume_text: String,
) -> Result<Vec<WordCloudImage>, AppError> {
    tokio::task::spawn_blocking(move || word_clouds(&job_description, &resume_text))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("word cloud task failed: {e}")))
}

pub fn word_cloud_image(text: &str, caption: &str) -> Option<WordCloudImage> {
    if text.trim().is_empty() {
        return None;
    }
    render_svg(text).map(|svg| WordCloudImage {
        caption: caption.to_string(),
        data_uri: svg_data_uri(&svg),
    })
}

/// Renders model output as HTML. Raw HTML in the markdown is escaped, not
/// passed through. Links and images whose destination is not `http`,
/// `https` or `mailto` lose their tag and keep only their text.
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options).filter_map(|event| match event {
        Event::Html(raw) => Some(Event::Text(raw)),
        Event::Start(Tag::Link(_, ref dest, _) | Tag::Image(_, ref dest, _))
        | Event::End(Tag::Link(_, ref dest, _) | Tag::Image(_, ref dest, _))
            if !is_safe_url(dest) =>
        {
            None
        }
        other => Some(other),
    });

    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

const SAFE_URL_PREFIXES: &[&str] = &["http://", "https://", "mailto:"];

fn is_safe_url(dest: &str) -> bool {
    let dest = dest.trim().to_ascii_lowercase();
    SAFE_URL_PREFIXES.iter().any(|p| dest.starts_with(p))
}
