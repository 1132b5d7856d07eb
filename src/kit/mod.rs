//! Kit adapter
//!
//! Integration with the external mailing-list provider. This is the one
//! piece of the application with multi-call orchestration and
//! partial-failure handling:
//!
//! - `client`: typed endpoint calls over the shared reqwest client
//! - `tags`: tag resolution (list-then-create)
//! - `fields`: custom-field resolution and key derivation
//! - `subscribers`: subscriber resolution, phone updates, tag application
//! - `sync`: the orchestrator sequencing the above
//!
//! Nothing from the provider is cached across requests; every call
//! re-resolves what it needs.

mod client;
mod error;
mod fields;
mod subscribers;
mod sync;
mod tags;

pub use client::{KitClient, KitId};
pub use error::SyncError;
pub use fields::{KitField, resolve_field};
pub use subscribers::{
    PHONE_FIELD_NAME, PhoneField, apply_tag, resolve_subscriber, update_phone, validate_email,
};
pub use sync::{SyncOutcome, resolve_default_tag, subscribe};
pub use tags::{KitTag, resolve_tag};
