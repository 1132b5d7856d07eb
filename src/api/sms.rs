//! Inbound SMS webhook (stub)
//!
//! Receives provider webhooks for inbound messages. Processing against
//! account keywords is not implemented yet; the payload is logged and
//! acknowledged so the provider does not retry.

use axum::{Router, response::Json, routing::post};

use crate::AppState;

pub fn sms_router() -> Router<AppState> {
    Router::new().route("/inbound-sms", post(receive_inbound_sms))
}

/// POST /api/inbound-sms
///
/// Unauthenticated webhook endpoint.
async fn receive_inbound_sms(body: String) -> Json<serde_json::Value> {
    tracing::info!(body = %body, "Inbound SMS webhook received");

    Json(serde_json::json!({ "status": "received" }))
}
