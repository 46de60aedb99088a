//! Text Extraction: uploaded PDF bytes to plain text.

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("uploaded file is empty")]
    Empty,

    #[error("uploaded file is not a PDF")]
    NotPdf,

    #[error("failed to extract text from PDF: {0}")]
    Pdf(String),
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        AppError::UnprocessableEntity(e.to_string())
    }
}

/// Extracts plain text from an in-memory PDF.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    if bytes.is_empty() {
        return Err(ExtractionError::Empty);
    }
    if !looks_like_pdf(bytes) {
        return Err(ExtractionError::NotPdf);
    }

    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))?;
    debug!("Extracted {} chars from {} byte PDF", text.len(), bytes.len());
    Ok(text)
}

/// Runs extraction on the blocking pool. A panic inside the PDF parser is
/// reported as an unreadable file.
pub async fn extract_pdf_text_blocking(bytes: Bytes) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
        .await
        .map_err(|e| ExtractionError::Pdf(format!("extraction task failed: {e}")))?
        .map_err(AppError::from)
}

/// PDF headers may be preceded by up to 1024 bytes of junk.
fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(1024 + PDF_MAGIC.len())];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::minimal_pdf;

    #[test]
    fn test_empty_upload_is_rejected() {
        assert!(matches!(extract_pdf_text(b""), Err(ExtractionError::Empty)));
    }

    #[test]
    fn test_non_pdf_upload_is_rejected() {
        assert!(matches!(
            extract_pdf_text(b"Experienced Python developer"),
            Err(ExtractionError::NotPdf)
        ));
    }

    #[test]
    fn test_truncated_pdf_is_an_error_not_a_panic() {
        let result = std::panic::catch_unwind(|| extract_pdf_text(b"%PDF-1.4\n1 0 obj <<"));
        if let Ok(result) = result {
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_extracts_text_from_pdf() {
        let pdf = minimal_pdf(&["Experienced Python developer"]);
        let text = extract_pdf_text(&pdf).unwrap();
        assert!(text.contains("Python"), "extracted: {text:?}");
    }

    #[tokio::test]
    async fn test_blocking_wrapper_maps_errors_to_unprocessable() {
        let err = extract_pdf_text_blocking(Bytes::from_static(b"not a pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
    }
}
