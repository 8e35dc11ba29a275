//! Axum route handlers for the creation feeds.

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::auth::AuthContext;
use crate::errors::AppError;
use crate::ledger;
use crate::models::creation::CreationRow;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreationListResponse {
    pub success: bool,
    pub data: Vec<CreationRow>,
}

/// GET /api/user/get-user-creation
///
/// All creations owned by the caller, newest first.
pub async fn handle_get_user_creation(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<CreationListResponse>, AppError> {
    let data = ledger::list_by_owner(&state.db, &ctx.user_id).await?;
    Ok(Json(CreationListResponse {
        success: true,
        data,
    }))
}

/// GET /api/user/get-published-creation
///
/// The global published feed, newest first. Auth is still required; the feed
/// itself is not owner-scoped.
pub async fn handle_get_published_creation(
    State(state): State<AppState>,
) -> Result<Json<CreationListResponse>, AppError> {
    let data = ledger::list_published(&state.db).await?;
    Ok(Json(CreationListResponse {
        success: true,
        data,
    }))
}
