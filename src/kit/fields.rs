//! Custom field resolution
//!
//! Same list-then-create shape as tag resolution. On creation, a
//! machine-readable key is derived from the human name. Field creation
//! always requests the "text" field type.

use super::client::{KitClient, KitId, KitResponse};
use super::error::SyncError;

/// A resolved provider custom field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitField {
    pub id: KitId,
    /// Display label
    pub name: String,
    /// Account-defined internal key, when the provider surfaces one
    pub key: Option<String>,
}

impl KitField {
    /// Key to use when setting the field at subscriber creation.
    ///
    /// Kit expects the display label in creation `fields` maps, though
    /// some accounts surface an internal key instead.
    pub fn creation_key(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else {
            self.key.as_deref().unwrap_or(&self.name)
        }
    }

    /// Key to use when updating the field on an existing subscriber.
    ///
    /// Updates address the account-defined key, falling back to the label.
    pub fn update_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }
}

/// Derive a machine-readable key from a human field name.
///
/// Lowercases, collapses runs of non-alphanumerics into a single
/// underscore, and trims leading/trailing underscores.
pub fn field_key_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for ch in name.trim().to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(ch);
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Resolve a custom field by name, creating it if it does not exist.
///
/// Existing fields are matched case-insensitively on `name` or `label`.
pub async fn resolve_field(
    client: &KitClient,
    name: &str,
    api_key: &str,
) -> Result<KitField, SyncError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SyncError::InvalidInput(
            "Field name is required".to_string(),
        ));
    }

    // 1) List fields and match by name or label (case-insensitive)
    if let KitResponse::Success { body, .. } = client.list_fields(api_key).await? {
        let wanted = name.to_lowercase();
        if let Some(found) = body.custom_fields.into_iter().find(|field| {
            let field_name = field
                .name
                .as_deref()
                .or(field.label.as_deref())
                .unwrap_or("");
            field_name.to_lowercase() == wanted
        }) {
            return Ok(KitField {
                id: found.id,
                name: found
                    .label
                    .or(found.name)
                    .unwrap_or_else(|| name.to_string()),
                key: found.key,
            });
        }
    }

    // 2) Create if not found
    match client
        .create_field(api_key, name, &field_key_slug(name))
        .await?
    {
        KitResponse::Success { body, .. } => match body.custom_field {
            Some(created) => {
                let resolved = KitField {
                    id: created.id,
                    name: created
                        .label
                        .or(created.name)
                        .unwrap_or_else(|| name.to_string()),
                    key: created.key,
                };
                tracing::info!(field = %resolved.name, id = %resolved.id, "Custom field created");
                Ok(resolved)
            }
            None => Err(SyncError::upstream(
                500,
                "Unexpected create custom field response",
            )),
        },
        KitResponse::Failure { status, message } => Err(SyncError::upstream(status, message)),
    }
}
