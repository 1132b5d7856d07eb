//! Keyword CRUD endpoints
//!
//! Keywords are inbound SMS trigger labels owned by the caller's
//! account: uppercase, whitespace-free, unique per account.

use axum::{
    Router,
    extract::{Path, State},
    response::Json,
    routing::{delete, get, post},
};
use serde::Deserialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::Keyword;
use crate::error::AppError;

pub fn keywords_router() -> Router<AppState> {
    Router::new()
        .route("/keywords", get(list_keywords))
        .route("/keywords", post(add_keyword))
        .route("/keywords/:id", delete(delete_keyword))
}

/// GET /api/keywords
///
/// Lists the caller's keywords, newest first.
async fn list_keywords(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Vec<Keyword>>, AppError> {
    let account = state.db.ensure_account_for_user(&session.user_id).await?;
    let keywords = state.db.list_keywords(&account.id).await?;

    Ok(Json(keywords))
}

#[derive(Debug, Deserialize)]
struct AddKeywordRequest {
    label: String,
}

/// POST /api/keywords
///
/// Validates and inserts a keyword; duplicates answer 400 with a
/// friendly message.
async fn add_keyword(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<AddKeywordRequest>,
) -> Result<Json<Keyword>, AppError> {
    let label = normalize_keyword_label(&request.label)?;

    let account = state.db.ensure_account_for_user(&session.user_id).await?;
    let keyword = state.db.insert_keyword(&account.id, &label).await?;

    tracing::info!(account_id = %account.id, label = %label, "Keyword added");

    Ok(Json(keyword))
}

/// DELETE /api/keywords/:id
///
/// Deletes a keyword scoped to the caller's account; 404 when absent.
async fn delete_keyword(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Path(keyword_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let account = state.db.ensure_account_for_user(&session.user_id).await?;

    if !state.db.delete_keyword(&account.id, &keyword_id).await? {
        return Err(AppError::NotFound);
    }

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Normalize a keyword label: trimmed, non-empty, no inner whitespace,
/// stored uppercase.
fn normalize_keyword_label(raw: &str) -> Result<String, AppError> {
    let label = raw.trim();
    if label.is_empty() {
        return Err(AppError::Validation("Please enter a label.".to_string()));
    }
    if label.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "Labels cannot contain spaces.".to_string(),
        ));
    }

    Ok(label.to_uppercase())
}
