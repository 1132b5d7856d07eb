//! Account settings endpoints

use axum::{
    Router,
    extract::State,
    response::Json,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;

pub fn settings_router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", put(update_settings))
}

#[derive(Debug, Serialize)]
struct SettingsResponse {
    name: String,
    kit_api_key: Option<String>,
    kit_tag_label: String,
}

/// GET /api/settings
///
/// Returns the caller's account settings, creating the account lazily.
async fn get_settings(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<SettingsResponse>, AppError> {
    let account = state.db.ensure_account_for_user(&session.user_id).await?;

    Ok(Json(SettingsResponse {
        name: account.name,
        kit_api_key: account.kit_api_key,
        kit_tag_label: account.kit_tag_label,
    }))
}

#[derive(Debug, Deserialize)]
struct UpdateSettingsRequest {
    name: String,
    kit_api_key: Option<String>,
    kit_tag_label: Option<String>,
}

/// PUT /api/settings
///
/// Updates the account. An empty API key clears the credential; an empty
/// tag label falls back to the default.
async fn update_settings(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<SettingsResponse>, AppError> {
    state.db.ensure_account_for_user(&session.user_id).await?;

    let api_key = request
        .kit_api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    let account = state
        .db
        .update_account_settings(
            &session.user_id,
            request.name.trim(),
            api_key,
            request.kit_tag_label.as_deref().unwrap_or(""),
        )
        .await?;

    tracing::info!(account_id = %account.id, "Settings saved");

    Ok(Json(SettingsResponse {
        name: account.name,
        kit_api_key: account.kit_api_key,
        kit_tag_label: account.kit_tag_label,
    }))
}
