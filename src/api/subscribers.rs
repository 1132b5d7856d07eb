//! Subscriber sync endpoints
//!
//! The boundary in front of the Kit adapter. Failures answer with the
//! `{ok, status, error}` body shape and the mapped HTTP status; the
//! short message goes to the caller while full diagnostics stay in the
//! logs.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::Account;
use crate::error::AppError;
use crate::kit::{self, SyncError};

pub fn subscribers_router() -> Router<AppState> {
    Router::new()
        .route("/subscribers", post(create_subscriber))
        .route("/subscribers/tag", get(get_default_tag))
}

#[derive(Debug, Deserialize)]
struct SubscribeRequest {
    email: String,
    phone: Option<String>,
    /// Optional tag label override; defaults to the account's label
    tag: Option<String>,
}

#[derive(Debug, Serialize)]
struct SubscribeResponse {
    ok: bool,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// POST /api/subscribers
///
/// Resolves the caller's account and runs the sync orchestration.
async fn create_subscriber(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
    Json(request): Json<SubscribeRequest>,
) -> Result<Response, AppError> {
    let account = state.db.ensure_account_for_user(&session.user_id).await?;

    let api_key = account.kit_api_key.clone().unwrap_or_default();
    let tag_label = request
        .tag
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(&account.kit_tag_label);

    let result = kit::subscribe(
        &state.kit,
        &request.email,
        tag_label,
        &api_key,
        request.phone.as_deref(),
    )
    .await;

    match result {
        Ok(outcome) => Ok(Json(SubscribeResponse {
            ok: true,
            status: outcome.status,
            error: None,
        })
        .into_response()),
        Err(error) => {
            tracing::error!(
                user_id = %session.user_id,
                tag = %tag_label,
                error = %error,
                "Subscriber sync failed"
            );
            Ok(sync_failure_response(error))
        }
    }
}

#[derive(Debug, Serialize)]
struct TagInfoResponse {
    ok: bool,
    status: u16,
    id: String,
    name: String,
}

/// GET /api/subscribers/tag
///
/// Resolves the account's default tag id/name for display.
async fn get_default_tag(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Response, AppError> {
    let account: Account = state.db.ensure_account_for_user(&session.user_id).await?;
    let api_key = account.kit_api_key.clone().unwrap_or_default();

    match kit::resolve_default_tag(&state.kit, &account.kit_tag_label, &api_key).await {
        Ok(tag) => Ok(Json(TagInfoResponse {
            ok: true,
            status: 200,
            id: tag.id.0,
            name: tag.name,
        })
        .into_response()),
        Err(error) => {
            tracing::error!(user_id = %session.user_id, error = %error, "Tag resolution failed");
            Ok(sync_failure_response(error))
        }
    }
}

/// Map a sync error to the `{ok:false,status,error}` response.
fn sync_failure_response(error: SyncError) -> Response {
    let status = error.http_status();
    let http_status =
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        http_status,
        Json(SubscribeResponse {
            ok: false,
            status,
            error: Some(error.to_string()),
        }),
    )
        .into_response()
}
