//! Subscriber resolution, phone updates, and tag application
//!
//! The provider overloads 400/409/422 for "already exists"; those codes
//! trigger a lookup-by-email fallback and carry no further semantic
//! meaning here. A creation that answers exactly 200 matched an existing
//! subscriber, and Kit silently drops `fields` on that path, so a
//! compensating lookup-and-update runs best-effort.

use super::client::{KitClient, KitId, KitResponse};
use super::error::SyncError;
use super::fields::{KitField, resolve_field};

/// Name of the custom field holding the phone number.
pub const PHONE_FIELD_NAME: &str = "Phone";

/// Status codes the provider uses interchangeably for "already exists"
/// or validation conflicts; all retried via lookup.
const LOOKUP_FALLBACK_STATUSES: [u16; 3] = [400, 409, 422];

/// A resolved phone field paired with the value to write.
#[derive(Debug, Clone)]
pub struct PhoneField {
    pub field: KitField,
    pub phone: String,
}

/// Validate a subscriber email: trimmed, non-empty, must contain "@".
///
/// Checked before any network call is issued.
pub fn validate_email(raw: &str) -> Result<&str, SyncError> {
    let email = raw.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(SyncError::InvalidInput(
            "A valid email is required.".to_string(),
        ));
    }
    Ok(email)
}

/// Resolve a subscriber id for an email, creating the subscriber if
/// needed and reusing the existing record on provider conflicts.
///
/// `phone` carries the pre-resolved field and value to include at
/// creation; pass `None` when no phone was supplied or field resolution
/// failed.
pub async fn resolve_subscriber(
    client: &KitClient,
    email: &str,
    api_key: &str,
    phone: Option<&PhoneField>,
) -> Result<KitId, SyncError> {
    let email = validate_email(email)?;

    let create = client
        .create_subscriber(
            api_key,
            email,
            phone.map(|p| (p.field.creation_key(), p.phone.as_str())),
        )
        .await?;

    match create {
        KitResponse::Success { status, body } => {
            // Exactly 200 means an existing subscriber matched; Kit drops
            // `fields` on that path, so write the phone explicitly.
            if status == 200 {
                if let Some(phone) = phone {
                    backfill_phone(client, email, api_key, phone).await;
                }
            }

            match body.subscriber {
                Some(subscriber) => Ok(subscriber.id),
                None => Err(SyncError::upstream(
                    500,
                    "Unexpected create subscriber response",
                )),
            }
        }
        KitResponse::Failure { status, message } => {
            if LOOKUP_FALLBACK_STATUSES.contains(&status) {
                if let KitResponse::Success { body, .. } =
                    client.lookup_subscriber_by_email(api_key, email).await?
                {
                    if let Some(subscriber) = body.subscribers.into_iter().next() {
                        tracing::debug!(
                            email = %email,
                            id = %subscriber.id,
                            create_status = status,
                            "Reusing existing subscriber"
                        );
                        return Ok(subscriber.id);
                    }
                }
            }

            Err(SyncError::upstream(status, message))
        }
    }
}

/// Best-effort phone write after a 200-path creation.
///
/// Failures are logged and swallowed; they never fail resolution.
async fn backfill_phone(client: &KitClient, email: &str, api_key: &str, phone: &PhoneField) {
    let subscriber_id = match client.lookup_subscriber_by_email(api_key, email).await {
        Ok(KitResponse::Success { body, .. }) => body.subscribers.into_iter().next().map(|s| s.id),
        Ok(KitResponse::Failure { status, .. }) => {
            tracing::warn!(email = %email, status, "Phone backfill lookup failed");
            None
        }
        Err(error) => {
            tracing::warn!(email = %email, error = %error, "Phone backfill lookup failed");
            None
        }
    };

    let Some(subscriber_id) = subscriber_id else {
        return;
    };

    if let Err(error) = client
        .update_subscriber_fields(
            api_key,
            &subscriber_id,
            phone.field.creation_key(),
            &phone.phone,
        )
        .await
    {
        tracing::warn!(id = %subscriber_id, error = %error, "Phone backfill update failed");
    }
}

/// Apply a phone value to a resolved subscriber's custom field.
///
/// No-op success for an empty phone. The field is re-resolved immediately
/// before the update so the key is never stale across calls; if that
/// resolution fails, the update proceeds with the field name as the key.
pub async fn update_phone(
    client: &KitClient,
    subscriber_id: &KitId,
    phone: &str,
    api_key: &str,
) -> Result<(), SyncError> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Ok(());
    }

    let field_key = match resolve_field(client, PHONE_FIELD_NAME, api_key).await {
        Ok(field) => field.update_key().to_string(),
        Err(error) => {
            tracing::warn!(error = %error, "Phone field re-resolution failed; using field name");
            PHONE_FIELD_NAME.to_string()
        }
    };

    match client
        .update_subscriber_fields(api_key, subscriber_id, &field_key, phone)
        .await?
    {
        KitResponse::Success { .. } => Ok(()),
        KitResponse::Failure { status, message } => Err(SyncError::upstream(status, message)),
    }
}

/// Associate a subscriber with a tag.
///
/// Re-applying an existing association is accepted by the provider;
/// no local deduplication happens here.
pub async fn apply_tag(
    client: &KitClient,
    subscriber_id: &KitId,
    tag_id: &KitId,
    api_key: &str,
) -> Result<(), SyncError> {
    match client.tag_subscriber(api_key, tag_id, subscriber_id).await? {
        KitResponse::Success { .. } => {
            tracing::debug!(subscriber = %subscriber_id, tag = %tag_id, "Subscriber tagged");
            Ok(())
        }
        KitResponse::Failure { status, message } => Err(SyncError::upstream(status, message)),
    }
}
