//! Session introspection

use axum::{Router, extract::State, response::Json, routing::get};
use serde::Serialize;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;

pub fn me_router() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[derive(Debug, Serialize)]
struct MeResponse {
    user_id: String,
    email: String,
    account_name: String,
}

/// GET /api/me
///
/// Returns the current session's identity for the UI header.
async fn get_me(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<MeResponse>, AppError> {
    let account = state.db.ensure_account_for_user(&session.user_id).await?;

    Ok(Json(MeResponse {
        user_id: session.user_id,
        email: session.email,
        account_name: account.name,
    }))
}
