//! Sync orchestration
//!
//! Sequences tag resolution, subscriber resolution, the optional phone
//! update, and tag application. Each stage is one awaited round trip;
//! failure in an earlier stage short-circuits later stages, with two
//! exceptions: custom-field resolution failure skips the phone path, and
//! a phone-update failure defers behind tag application.

use super::client::KitClient;
use super::error::SyncError;
use super::fields::resolve_field;
use super::subscribers::{
    PHONE_FIELD_NAME, PhoneField, apply_tag, resolve_subscriber, update_phone, validate_email,
};
use super::tags::{KitTag, resolve_tag};
use crate::data::DEFAULT_TAG_LABEL;
use crate::metrics::observe_sync;

/// Successful sync result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Status reported to the caller (200 on the happy path)
    pub status: u16,
}

/// Resolve the tag an account syncs under, for display purposes.
///
/// # Errors
/// `MissingCredential` when the API key is empty; otherwise as
/// [`resolve_tag`].
pub async fn resolve_default_tag(
    client: &KitClient,
    tag_label: &str,
    api_key: &str,
) -> Result<KitTag, SyncError> {
    if api_key.trim().is_empty() {
        return Err(SyncError::MissingCredential);
    }

    let label = effective_tag_label(tag_label);
    resolve_tag(client, label, api_key).await
}

/// Subscribe an email under an account's tag, optionally recording a
/// phone number.
///
/// Stages: resolve tag → resolve phone field (non-fatal) → resolve
/// subscriber → update phone → apply tag. The credential precondition is
/// checked before any network call.
pub async fn subscribe(
    client: &KitClient,
    email: &str,
    tag_label: &str,
    api_key: &str,
    phone: Option<&str>,
) -> Result<SyncOutcome, SyncError> {
    let result = run_subscribe(client, email, tag_label, api_key, phone).await;

    match &result {
        Ok(_) => observe_sync("success"),
        Err(SyncError::InvalidInput(_)) => observe_sync("invalid_input"),
        Err(SyncError::MissingCredential) => observe_sync("missing_credential"),
        Err(SyncError::Upstream { .. }) => observe_sync("upstream_error"),
        Err(SyncError::Network(_)) => observe_sync("network_error"),
        Err(SyncError::Timeout) => observe_sync("timeout"),
    }

    result
}

async fn run_subscribe(
    client: &KitClient,
    email: &str,
    tag_label: &str,
    api_key: &str,
    phone: Option<&str>,
) -> Result<SyncOutcome, SyncError> {
    if api_key.trim().is_empty() {
        return Err(SyncError::MissingCredential);
    }
    // Input preconditions are checked before any network call.
    let email = validate_email(email)?;

    let phone = phone.map(str::trim).filter(|p| !p.is_empty());

    // 1. Resolve the tag; fatal on failure.
    let tag = resolve_tag(client, effective_tag_label(tag_label), api_key).await?;

    // 2. Resolve the phone field when a phone was supplied. Failure here
    //    skips the phone path but never aborts the subscription.
    let phone_field = match phone {
        Some(value) => match resolve_field(client, PHONE_FIELD_NAME, api_key).await {
            Ok(field) => Some(PhoneField {
                field,
                phone: value.to_string(),
            }),
            Err(error) => {
                tracing::warn!(
                    error = %error,
                    "Custom field resolution failed; skipping phone update"
                );
                None
            }
        },
        None => None,
    };

    // 3. Resolve the subscriber; fatal on failure.
    let subscriber_id = resolve_subscriber(client, email, api_key, phone_field.as_ref()).await?;

    // 4. Update the phone field. A failure is deferred: tagging still
    //    runs, and the phone error only surfaces if tagging succeeds
    //    (a tagging failure is the more authoritative one).
    let deferred_phone_error = match (&phone, &phone_field) {
        (Some(value), Some(_)) => match update_phone(client, &subscriber_id, value, api_key).await
        {
            Ok(()) => None,
            Err(error) => {
                tracing::warn!(
                    subscriber = %subscriber_id,
                    error = %error,
                    "Phone update failed; proceeding to tag"
                );
                Some(error)
            }
        },
        _ => None,
    };

    // 5. Apply the tag; the final authoritative failure point.
    apply_tag(client, &subscriber_id, &tag.id, api_key).await?;

    if let Some(error) = deferred_phone_error {
        return Err(error);
    }

    tracing::info!(
        subscriber = %subscriber_id,
        tag = %tag.name,
        "Subscriber synced"
    );

    Ok(SyncOutcome { status: 200 })
}

fn effective_tag_label(label: &str) -> &str {
    let label = label.trim();
    if label.is_empty() { DEFAULT_TAG_LABEL } else { label }
}
