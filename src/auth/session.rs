//! Session and login token management
//!
//! Uses HMAC-signed tokens stored in cookies (sessions) or embedded in
//! magic links (login tickets). No server-side token storage needed.
//! The two token kinds are domain-separated: the signature covers the
//! purpose string, so a login ticket can never be replayed as a session.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::error::AppError;

const SESSION_PURPOSE: &str = "session";
const LOGIN_PURPOSE: &str = "login";

/// User session data
///
/// Stored in a signed cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// User id (ULID)
    pub user_id: String,
    /// Lowercased email address
    pub email: String,
    /// When session was created
    pub created_at: DateTime<Utc>,
    /// When session expires
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session for a user, valid for `max_age_seconds`.
    pub fn new(user_id: String, email: String, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            email,
            created_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if session is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Login ticket carried inside a magic link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginTicket {
    /// Lowercased email address the link was issued for
    pub email: String,
    /// When the ticket was issued
    pub issued_at: DateTime<Utc>,
    /// When the ticket expires
    pub expires_at: DateTime<Utc>,
}

impl LoginTicket {
    /// Create a ticket for an email, valid for `max_age_seconds`.
    pub fn new(email: String, max_age_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            email,
            issued_at: now,
            expires_at: now + Duration::seconds(max_age_seconds),
        }
    }

    /// Check if ticket is expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

/// Sign a payload under a purpose string.
///
/// Token format: base64(payload).base64(hmac_sha256("{purpose}.{payload_b64}"))
fn sign_token<T: Serialize>(purpose: &str, payload: &T, secret: &str) -> Result<String, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Serialize payload to JSON
    let payload = serde_json::to_string(payload).map_err(|e| AppError::Internal(e.into()))?;

    // 2. Base64 encode the payload
    let payload_b64 = general_purpose::URL_SAFE_NO_PAD.encode(payload.as_bytes());

    // 3. Create HMAC-SHA256 signature over purpose + payload
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Token(e.to_string()))?;
    mac.update(purpose.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    let signature = mac.finalize().into_bytes();
    let signature_b64 = general_purpose::URL_SAFE_NO_PAD.encode(signature);

    // 4. Return "{payload}.{signature}"
    Ok(format!("{}.{}", payload_b64, signature_b64))
}

/// Verify and decode a token signed under a purpose string.
///
/// # Errors
/// Returns `Unauthorized` if the signature is invalid, the token is
/// malformed, or it was signed for a different purpose.
fn verify_token<T: DeserializeOwned>(
    purpose: &str,
    token: &str,
    secret: &str,
) -> Result<T, AppError> {
    use base64::{Engine as _, engine::general_purpose};
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // 1. Split token into payload and signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return Err(AppError::Unauthorized);
    }

    let payload_b64 = parts[0];
    let signature_b64 = parts[1];

    // 2. Verify HMAC signature
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Token(e.to_string()))?;
    mac.update(purpose.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());

    let expected_signature = general_purpose::URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AppError::Unauthorized)?;

    mac.verify_slice(&expected_signature)
        .map_err(|_| AppError::Unauthorized)?;

    // 3. Decode and deserialize payload
    let payload_bytes = general_purpose::URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AppError::Unauthorized)?;

    let payload_str = String::from_utf8(payload_bytes).map_err(|_| AppError::Unauthorized)?;

    serde_json::from_str(&payload_str).map_err(|_| AppError::Unauthorized)
}

/// Create a signed session token
pub fn create_session_token(session: &Session, secret: &str) -> Result<String, AppError> {
    sign_token(SESSION_PURPOSE, session, secret)
}

/// Verify and decode a session token
///
/// # Errors
/// Returns error if the signature is invalid or the session is expired
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    let session: Session = verify_token(SESSION_PURPOSE, token, secret)?;

    if session.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(session)
}

/// Create a signed login (magic link) token
pub fn create_login_token(ticket: &LoginTicket, secret: &str) -> Result<String, AppError> {
    sign_token(LOGIN_PURPOSE, ticket, secret)
}

/// Verify and decode a login token
///
/// # Errors
/// Returns error if the signature is invalid or the ticket is expired
pub fn verify_login_token(token: &str, secret: &str) -> Result<LoginTicket, AppError> {
    let ticket: LoginTicket = verify_token(LOGIN_PURPOSE, token, secret)?;

    if ticket.is_expired() {
        return Err(AppError::Unauthorized);
    }

    Ok(ticket)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-32-bytes-long!!!";

    #[test]
    fn session_token_round_trip() {
        let session = Session::new("01ABC".to_string(), "a@b.com".to_string(), 3600);
        let token = create_session_token(&session, SECRET).unwrap();

        let decoded = verify_session_token(&token, SECRET).unwrap();
        assert_eq!(decoded.user_id, "01ABC");
        assert_eq!(decoded.email, "a@b.com");
    }

    #[test]
    fn tampered_session_token_is_rejected() {
        let session = Session::new("01ABC".to_string(), "a@b.com".to_string(), 3600);
        let token = create_session_token(&session, SECRET).unwrap();

        let mut tampered = token.clone();
        tampered.push('x');
        assert!(verify_session_token(&tampered, SECRET).is_err());
        assert!(verify_session_token(&token, "another-secret-32-bytes-long!!!!").is_err());
    }

    #[test]
    fn expired_session_is_rejected() {
        let session = Session::new("01ABC".to_string(), "a@b.com".to_string(), -1);
        let token = create_session_token(&session, SECRET).unwrap();
        assert!(verify_session_token(&token, SECRET).is_err());
    }

    #[test]
    fn login_ticket_round_trip_and_expiry() {
        let ticket = LoginTicket::new("a@b.com".to_string(), 900);
        let token = create_login_token(&ticket, SECRET).unwrap();
        assert_eq!(verify_login_token(&token, SECRET).unwrap().email, "a@b.com");

        let stale = LoginTicket::new("a@b.com".to_string(), -1);
        let stale_token = create_login_token(&stale, SECRET).unwrap();
        assert!(verify_login_token(&stale_token, SECRET).is_err());
    }

    #[test]
    fn login_token_cannot_be_used_as_session() {
        let ticket = LoginTicket::new("a@b.com".to_string(), 900);
        let token = create_login_token(&ticket, SECRET).unwrap();
        assert!(verify_session_token(&token, SECRET).is_err());
    }
}
