//! Resume analysis pipeline.
//!
//! Extraction → keywords (job description and resume) → similarity →
//! feedback on the missing keywords → report.

use tracing::info;

use crate::errors::AppError;
use crate::feedback::FeedbackService;

pub mod extraction;
pub mod handlers;
pub mod keywords;
pub mod report;
pub mod similarity;
pub mod stopwords;
pub mod wordcloud;

use keywords::{extract_keywords, keyword_overlap};
use report::{build_report, word_clouds_blocking, AnalysisReport, ReportInputs};
use similarity::SimilarityScorer;

pub const MIN_KEYWORDS: usize = 5;
pub const MAX_KEYWORDS: usize = 30;
pub const DEFAULT_KEYWORDS: usize = 20;

/// Bounds a requested keyword count to the slider range.
pub fn clamp_keyword_count(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_KEYWORDS)
        .clamp(MIN_KEYWORDS, MAX_KEYWORDS)
}

pub struct Analyzer<'a> {
    pub scorer: &'a SimilarityScorer,
    pub feedback: &'a dyn FeedbackService,
}

impl Analyzer<'_> {
    /// Runs every analysis step on already-extracted resume text.
    pub async fn analyze(
        &self,
        job_description: &str,
        resume_text: &str,
        num_keywords: usize,
    ) -> Result<AnalysisReport, AppError> {
        let job_keywords = extract_keywords(job_description, num_keywords);
        let resume_keywords = extract_keywords(resume_text, num_keywords);

        let similarity = self
            .scorer
            .similarity_blocking(job_description.to_string(), resume_text.to_string())
            .await?;

        let overlap = keyword_overlap(&job_keywords, &resume_keywords);
        info!(
            "Analysis: similarity={similarity:.3}, matching={}, missing={}",
            overlap.matching.len(),
            overlap.missing.len()
        );

        let feedback = self
            .feedback
            .generate_feedback(job_description, resume_text, &overlap.missing)
            .await?;

        let word_clouds =
            word_clouds_blocking(job_description.to_string(), resume_text.to_string()).await?;

        Ok(build_report(ReportInputs {
            similarity,
            job_keywords,
            resume_keywords,
            overlap,
            feedback,
            word_clouds,
        }))
    }
}
