//! Resume review support — upload limits, PDF text extraction, and the
//! structured review payload returned by the LLM.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Maximum accepted resume upload size (5 MB).
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

/// Structured review produced by the LLM and persisted as Creation content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeReview {
    pub score: u8,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

pub fn ensure_resume_size(len: usize) -> Result<(), AppError> {
    if len > MAX_RESUME_BYTES {
        return Err(AppError::Validation(
            "Resume file size exceeds allowed size (5MB)".to_string(),
        ));
    }
    Ok(())
}

/// Extracts plain text from an uploaded PDF. Unreadable or empty PDFs are a
/// caller error, not an internal one.
pub fn extract_resume_text(pdf: &[u8]) -> Result<String, AppError> {
    let text = pdf_extract::extract_text_from_mem(pdf)
        .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation(
            "Resume PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_size_boundary() {
        assert!(ensure_resume_size(MAX_RESUME_BYTES).is_ok());
        assert!(ensure_resume_size(MAX_RESUME_BYTES + 1).is_err());
        assert!(ensure_resume_size(0).is_ok());
    }

    #[test]
    fn test_review_parses_llm_json() {
        let review: ResumeReview = serde_json::from_str(
            r#"{
                "score": 72,
                "strengths": ["Clear impact metrics"],
                "weaknesses": ["No summary section"],
                "suggestions": ["Add a skills section", "Quantify the second role"]
            }"#,
        )
        .unwrap();
        assert_eq!(review.score, 72);
        assert_eq!(review.strengths.len(), 1);
        assert_eq!(review.suggestions.len(), 2);
    }

    #[test]
    fn test_extract_rejects_non_pdf_bytes() {
        assert!(extract_resume_text(b"plain text, not a pdf").is_err());
    }
}
