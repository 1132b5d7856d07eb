//! Magic-link login flow
//!
//! A user posts their email, receives a short-lived signed link, and the
//! callback exchanges the link for a session cookie. User and account
//! rows are created lazily on the first successful callback.

use axum::{
    Router,
    extract::{Query, State},
    response::{IntoResponse, Json, Redirect},
    routing::{get, post},
};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use serde::Deserialize;

use super::session::{
    LoginTicket, Session, create_login_token, create_session_token, verify_login_token,
};
use crate::AppState;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "session";

/// Create authentication router
///
/// Routes:
/// - POST /auth/login - Request a magic link
/// - GET /auth/callback - Exchange the link for a session cookie
/// - POST /logout - Logout
pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(request_login_link))
        .route("/auth/callback", get(login_callback))
        .route("/logout", post(logout))
}

// =============================================================================
// Magic link request
// =============================================================================

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
}

/// POST /auth/login
///
/// Mints a login ticket for the address and emits the callback link to the
/// mail relay (the structured log, in this deployment). The response does
/// not reveal whether the address is already registered.
async fn request_login_link(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let email = normalize_email(&request.email)
        .ok_or_else(|| AppError::Validation("A valid email is required.".to_string()))?;

    let ticket = LoginTicket::new(email.clone(), state.config.auth.login_token_max_age);
    let token = create_login_token(&ticket, &state.config.auth.session_secret)?;

    let link = format!("{}/auth/callback?token={}", state.config.server.base_url(), token);
    tracing::info!(email = %email, link = %link, "Magic link issued");

    Ok(Json(serde_json::json!({ "ok": true })))
}

// =============================================================================
// Callback
// =============================================================================

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    token: String,
}

/// GET /auth/callback?token=...
///
/// # Steps
/// 1. Verify the login token (signature + expiry)
/// 2. Upsert the user row for the email
/// 3. Ensure the user's account exists
/// 4. Mint a session token and set it as a cookie
/// 5. Redirect to the dashboard
async fn login_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let ticket = verify_login_token(&query.token, &state.config.auth.session_secret)?;

    let user = state.db.upsert_user_by_email(&ticket.email).await?;
    state.db.ensure_account_for_user(&user.id).await?;

    let session = Session::new(
        user.id.clone(),
        user.email.clone(),
        state.config.auth.session_max_age,
    );
    let token = create_session_token(&session, &state.config.auth.session_secret)?;

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(state.config.should_use_secure_cookies())
        .build();

    tracing::info!(user_id = %user.id, email = %user.email, "User logged in");

    Ok((jar.add(cookie), Redirect::to("/dashboard")))
}

// =============================================================================
// Logout
// =============================================================================

/// POST /logout
///
/// Clears the session cookie and redirects to login.
async fn logout(jar: CookieJar) -> impl IntoResponse {
    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    (jar.remove(removal), Redirect::to("/login"))
}

// =============================================================================
// Helpers
// =============================================================================

/// Normalize an email for storage: trim, lowercase, require an "@".
fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return None;
    }
    Some(email)
}

#[cfg(test)]
mod tests {
    use super::normalize_email;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(
            normalize_email("  Creator@Example.COM "),
            Some("creator@example.com".to_string())
        );
    }

    #[test]
    fn normalize_email_rejects_missing_at() {
        assert_eq!(normalize_email("not-an-email"), None);
        assert_eq!(normalize_email("   "), None);
    }
}
