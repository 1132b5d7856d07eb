//! API layer
//!
//! HTTP handlers for:
//! - Subscriber sync (the Kit adapter boundary)
//! - Keyword CRUD
//! - Account settings
//! - Inbound SMS webhook (stub)
//! - Metrics (Prometheus)

mod keywords;
mod me;
pub mod metrics;
mod settings;
mod sms;
mod subscribers;

use axum::Router;

use crate::AppState;

pub use metrics::metrics_router;

/// Create the `/api` router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(subscribers::subscribers_router())
        .merge(keywords::keywords_router())
        .merge(settings::settings_router())
        .merge(sms::sms_router())
        .merge(me::me_router())
}
