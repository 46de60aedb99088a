// Prompt constants for resume feedback.

pub const FEEDBACK_SYSTEM: &str = "You are a helpful assistant.";

/// Feedback prompt template. Replace `{job_description}`, `{resume_text}` and
/// `{missing_keywords}` before sending.
pub const FEEDBACK_PROMPT_TEMPLATE: &str = "Given a job description: '{job_description}' \
    and a resume text: '{resume_text}', with missing keywords: {missing_keywords}, \
    provide detailed feedback on how the resume can be improved to match the job description better.";

/// Fills the template with the three inputs verbatim.
pub fn build_feedback_prompt(
    job_description: &str,
    resume_text: &str,
    missing_keywords: &[String],
) -> String {
    // Missing keywords first: the other two are user text and may contain placeholders.
    FEEDBACK_PROMPT_TEMPLATE
        .replacen("{missing_keywords}", &missing_keywords.join(", "), 1)
        .replacen("{resume_text}", resume_text, 1)
        .replacen("{job_description}", job_description, 1)
}
