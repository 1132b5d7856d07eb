//! Tag resolution
//!
//! Resolves a tag name to a stable provider id, creating the tag
//! upstream if absent. List-then-create keeps re-resolution idempotent;
//! two concurrent first-time resolutions of the same name can still race
//! and create a duplicate upstream (single attempt, no retries, no
//! cross-request coordination).

use super::client::{KitClient, KitId, KitResponse};
use super::error::SyncError;

/// A resolved provider tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KitTag {
    pub id: KitId,
    pub name: String,
}

/// Resolve a tag by name, creating it if it does not exist.
///
/// Matching against existing tags is case-insensitive. A failed listing
/// falls through to creation rather than aborting.
pub async fn resolve_tag(
    client: &KitClient,
    name: &str,
    api_key: &str,
) -> Result<KitTag, SyncError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(SyncError::InvalidInput("Tag name is required".to_string()));
    }

    // 1) List tags and match by name (case-insensitive)
    if let KitResponse::Success { body, .. } = client.list_tags(api_key).await? {
        let wanted = name.to_lowercase();
        if let Some(found) = body
            .tags
            .into_iter()
            .find(|tag| tag.name.as_deref().unwrap_or("").to_lowercase() == wanted)
        {
            let resolved = KitTag {
                id: found.id,
                name: found.name.unwrap_or_else(|| name.to_string()),
            };
            tracing::debug!(tag = %resolved.name, id = %resolved.id, "Tag already exists");
            return Ok(resolved);
        }
    }

    // 2) Create if not found
    match client.create_tag(api_key, name).await? {
        KitResponse::Success { body, .. } => match body.tag {
            Some(created) => {
                let resolved = KitTag {
                    id: created.id,
                    name: created.name.unwrap_or_else(|| name.to_string()),
                };
                tracing::info!(tag = %resolved.name, id = %resolved.id, "Tag created");
                Ok(resolved)
            }
            None => Err(SyncError::upstream(500, "Unexpected create tag response")),
        },
        KitResponse::Failure { status, message } => Err(SyncError::upstream(status, message)),
    }
}
