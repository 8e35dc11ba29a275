//! Axum route handlers for the paid AI actions.
//!
//! Every handler follows the same skeleton: gate check → external generation
//! call → S3 upload where the artifact is binary → ledger append →
//! best-effort usage increment → response. A failed generation never appends;
//! a failed append is a 500 even though generation succeeded.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ai::resume::{ensure_resume_size, extract_resume_text, ResumeReview};
use crate::auth::AuthContext;
use crate::entitlement::record_usage;
use crate::errors::AppError;
use crate::ledger::{self, CreationKind};
use crate::llm_client::prompts::resume_review_prompt;
use crate::state::AppState;
use crate::storage;

/// Upper bound on caller-requested article length.
const MAX_ARTICLE_TOKENS: u32 = 4096;
/// Response token cap for the structured resume review.
const REVIEW_MAX_TOKENS: u32 = 2048;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateArticleRequest {
    pub prompt: String,
    pub length: u32,
}

#[derive(Debug, Serialize)]
pub struct GenerateArticleResponse {
    pub message: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub success: bool,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeReviewResponse {
    pub success: bool,
    pub data: ResumeReview,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/ai/generate-article
///
/// Generates an article from a prompt; `length` caps the response tokens.
pub async fn handle_generate_article(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<GenerateArticleRequest>,
) -> Result<Json<GenerateArticleResponse>, AppError> {
    ctx.entitlement.ensure_within_quota()?;

    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }
    if request.length == 0 {
        return Err(AppError::Validation(
            "length must be greater than zero".to_string(),
        ));
    }

    let max_tokens = request.length.min(MAX_ARTICLE_TOKENS);
    let content = state
        .llm
        .call(&request.prompt, max_tokens)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    ledger::append(
        &state.db,
        &ctx.user_id,
        &request.prompt,
        &content,
        CreationKind::Article,
    )
    .await?;
    record_usage(state.entitlements.as_ref(), &ctx.user_id, ctx.entitlement.plan).await;

    Ok(Json(GenerateArticleResponse {
        message: "Article generated successfully".to_string(),
        content,
    }))
}

/// POST /api/ai/generate-image
///
/// Generates an image from a prompt, stores it, and records the URL.
pub async fn handle_generate_image(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<GenerateImageRequest>,
) -> Result<Json<ImageResponse>, AppError> {
    ctx.entitlement.ensure_within_quota()?;

    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt cannot be empty".to_string()));
    }

    let image = state
        .media
        .text_to_image(&request.prompt)
        .await
        .map_err(|e| AppError::Media(e.to_string()))?;

    let image_url = storage::upload_image(
        &state.s3,
        &state.config.s3_bucket,
        &state.config.s3_endpoint,
        image,
    )
    .await?;

    ledger::append(
        &state.db,
        &ctx.user_id,
        &request.prompt,
        &image_url,
        CreationKind::Image,
    )
    .await?;
    record_usage(state.entitlements.as_ref(), &ctx.user_id, ctx.entitlement.plan).await;

    Ok(Json(ImageResponse {
        success: true,
        image_url,
    }))
}

/// POST /api/ai/remove-background
///
/// Multipart field `image`. Returns the URL of the processed image.
pub async fn handle_remove_background(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<Json<ImageResponse>, AppError> {
    ctx.entitlement.ensure_within_quota()?;

    let (file, _) = collect_upload(multipart, "image").await?;

    let processed = state
        .media
        .remove_background(file.bytes, &file.filename)
        .await
        .map_err(|e| AppError::Media(e.to_string()))?;

    let image_url = storage::upload_image(
        &state.s3,
        &state.config.s3_bucket,
        &state.config.s3_endpoint,
        processed,
    )
    .await?;

    ledger::append(
        &state.db,
        &ctx.user_id,
        "Remove background from image",
        &image_url,
        CreationKind::Image,
    )
    .await?;
    record_usage(state.entitlements.as_ref(), &ctx.user_id, ctx.entitlement.plan).await;

    Ok(Json(ImageResponse {
        success: true,
        image_url,
    }))
}

/// POST /api/ai/remove-object
///
/// Multipart fields `image` and `object` (name of the object to erase).
pub async fn handle_remove_object(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<Json<ImageResponse>, AppError> {
    ctx.entitlement.ensure_within_quota()?;

    let (file, fields) = collect_upload(multipart, "image").await?;
    let object = fields
        .get("object")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("object cannot be empty".to_string()))?
        .to_string();

    let processed = state
        .media
        .remove_object(file.bytes, &file.filename, &object)
        .await
        .map_err(|e| AppError::Media(e.to_string()))?;

    let image_url = storage::upload_image(
        &state.s3,
        &state.config.s3_bucket,
        &state.config.s3_endpoint,
        processed,
    )
    .await?;

    let prompt = format!("Removed {object} from image");
    ledger::append(
        &state.db,
        &ctx.user_id,
        &prompt,
        &image_url,
        CreationKind::Image,
    )
    .await?;
    record_usage(state.entitlements.as_ref(), &ctx.user_id, ctx.entitlement.plan).await;

    Ok(Json(ImageResponse {
        success: true,
        image_url,
    }))
}

/// POST /api/ai/resume-review
///
/// Multipart field `resume` (PDF, max 5 MB). Returns a structured review.
pub async fn handle_resume_review(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<Json<ResumeReviewResponse>, AppError> {
    ctx.entitlement.ensure_within_quota()?;

    let (file, _) = collect_upload(multipart, "resume").await?;
    ensure_resume_size(file.bytes.len())?;

    let resume_text = extract_resume_text(&file.bytes)?;
    let prompt = resume_review_prompt(&resume_text);
    let review: ResumeReview = state
        .llm
        .call_json(&prompt, REVIEW_MAX_TOKENS)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    let content = serde_json::to_string(&review).map_err(|e| AppError::Internal(e.into()))?;
    ledger::append(
        &state.db,
        &ctx.user_id,
        "Review the uploaded resume",
        &content,
        CreationKind::Resume,
    )
    .await?;
    record_usage(state.entitlements.as_ref(), &ctx.user_id, ctx.entitlement.plan).await;

    Ok(Json(ResumeReviewResponse {
        success: true,
        data: review,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart plumbing
// ────────────────────────────────────────────────────────────────────────────

struct UploadedFile {
    filename: String,
    bytes: Bytes,
}

/// Drains a multipart body, returning the named file field plus any text
/// fields that accompanied it.
async fn collect_upload(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(UploadedFile, HashMap<String, String>), AppError> {
    let mut file = None;
    let mut texts = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read `{name}`: {e}")))?;
            file = Some(UploadedFile { filename, bytes });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read `{name}`: {e}")))?;
            texts.insert(name, value);
        }
    }

    let file = file.ok_or_else(|| {
        AppError::Validation(format!("Missing `{file_field}` file upload"))
    })?;
    Ok((file, texts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_request_parses_body() {
        let request: GenerateArticleRequest =
            serde_json::from_str(r#"{"prompt": "write about cats", "length": 800}"#).unwrap();
        assert_eq!(request.prompt, "write about cats");
        assert_eq!(request.length, 800);
    }

    #[test]
    fn test_image_response_uses_camel_case_url() {
        let response = ImageResponse {
            success: true,
            image_url: "http://cdn/creations/a.png".to_string(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["imageUrl"], "http://cdn/creations/a.png");
        assert_eq!(json["success"], true);
    }

    #[test]
    fn test_article_length_is_capped() {
        assert_eq!(10_000u32.min(MAX_ARTICLE_TOKENS), MAX_ARTICLE_TOKENS);
        assert_eq!(800u32.min(MAX_ARTICLE_TOKENS), 800);
    }
}
