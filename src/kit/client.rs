//! Typed Kit API calls
//!
//! One method per endpoint, each returning a tagged success/failure
//! result instead of an untyped JSON tree. Transport failures and
//! timeouts are mapped to [`SyncError`] before any body parsing.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::error::SyncError;
use crate::metrics::KIT_REQUESTS_TOTAL;

/// Header carrying the per-account API key on every call.
const API_KEY_HEADER: &str = "X-Kit-Api-Key";

/// Provider-assigned opaque identifier.
///
/// Kit serializes ids as numbers or strings depending on endpoint;
/// both are accepted and normalized to a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(transparent)]
pub struct KitId(pub String);

impl<'de> Deserialize<'de> for KitId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(u64),
            Str(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Num(n) => KitId(n.to_string()),
            Raw::Str(s) => KitId(s),
        })
    }
}

impl std::fmt::Display for KitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Response shapes
// =============================================================================

/// Error payload shape shared by all endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub errors: Option<Vec<String>>,
    pub message: Option<String>,
}

impl ErrorBody {
    /// Best-effort message extraction: first entry of the `errors` array,
    /// else the `message` field, else the caller's fallback.
    pub fn error_message(&self, fallback: &str) -> String {
        if let Some(first) = self.errors.as_ref().and_then(|e| e.first()) {
            if !first.is_empty() {
                return first.clone();
            }
        }
        match &self.message {
            Some(message) if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TagEntry {
    pub id: KitId,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ListTagsBody {
    #[serde(default)]
    pub tags: Vec<TagEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CreateTagBody {
    pub tag: Option<TagEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FieldEntry {
    pub id: KitId,
    pub name: Option<String>,
    pub label: Option<String>,
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ListFieldsBody {
    #[serde(default)]
    pub custom_fields: Vec<FieldEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CreateFieldBody {
    pub custom_field: Option<FieldEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubscriberEntry {
    pub id: KitId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CreateSubscriberBody {
    pub subscriber: Option<SubscriberEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct LookupSubscribersBody {
    #[serde(default)]
    pub subscribers: Vec<SubscriberEntry>,
}

/// One endpoint call: the provider responded, either usefully or not.
///
/// Transport failures never reach this type; they surface as `SyncError`.
#[derive(Debug, Clone)]
pub(crate) enum KitResponse<T> {
    Success { status: u16, body: T },
    Failure { status: u16, message: String },
}

// =============================================================================
// Client
// =============================================================================

/// Kit API client over the shared reqwest client.
///
/// The API key is per-account and passed on every call rather than held
/// by the client.
#[derive(Clone)]
pub struct KitClient {
    http: Arc<reqwest::Client>,
    base_url: String,
}

impl KitClient {
    /// Create a new client against a base URL (no trailing slash needed).
    pub fn new(http: Arc<reqwest::Client>, base_url: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and parse the tagged response for one endpoint.
    async fn execute<T>(
        &self,
        endpoint: &'static str,
        failure_fallback: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<KitResponse<T>, SyncError>
    where
        T: DeserializeOwned + Default,
    {
        let response = request.send().await.map_err(SyncError::from_transport)?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(SyncError::from_transport)?;

        KIT_REQUESTS_TOTAL
            .with_label_values(&[endpoint, &status.to_string()])
            .inc();

        if (200..300).contains(&status) {
            // Tolerate empty or unexpected success bodies; callers decide
            // whether a missing payload is fatal.
            let body = serde_json::from_slice(&bytes).unwrap_or_default();
            tracing::debug!(endpoint, status, "Kit call succeeded");
            Ok(KitResponse::Success { status, body })
        } else {
            let error_body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
            let message = error_body.error_message(failure_fallback);
            tracing::warn!(
                endpoint,
                status,
                body = %String::from_utf8_lossy(&bytes),
                "Kit call failed"
            );
            Ok(KitResponse::Failure { status, message })
        }
    }

    pub(crate) async fn list_tags(
        &self,
        api_key: &str,
    ) -> Result<KitResponse<ListTagsBody>, SyncError> {
        self.execute(
            "list_tags",
            "Failed to list tags",
            self.http.get(self.url("/tags")).header(API_KEY_HEADER, api_key),
        )
        .await
    }

    pub(crate) async fn create_tag(
        &self,
        api_key: &str,
        name: &str,
    ) -> Result<KitResponse<CreateTagBody>, SyncError> {
        self.execute(
            "create_tag",
            "Failed to create tag",
            self.http
                .post(self.url("/tags"))
                .header(API_KEY_HEADER, api_key)
                .json(&serde_json::json!({ "name": name })),
        )
        .await
    }

    pub(crate) async fn list_fields(
        &self,
        api_key: &str,
    ) -> Result<KitResponse<ListFieldsBody>, SyncError> {
        self.execute(
            "list_fields",
            "Failed to list custom fields",
            self.http
                .get(self.url("/custom_fields"))
                .header(API_KEY_HEADER, api_key),
        )
        .await
    }

    pub(crate) async fn create_field(
        &self,
        api_key: &str,
        name: &str,
        key: &str,
    ) -> Result<KitResponse<CreateFieldBody>, SyncError> {
        // Kit requires an explicit type for new fields.
        self.execute(
            "create_field",
            "Failed to create custom field",
            self.http
                .post(self.url("/custom_fields"))
                .header(API_KEY_HEADER, api_key)
                .json(&serde_json::json!({
                    "name": name,
                    "label": name,
                    "key": key,
                    "field_type": "text",
                })),
        )
        .await
    }

    pub(crate) async fn create_subscriber(
        &self,
        api_key: &str,
        email: &str,
        field: Option<(&str, &str)>,
    ) -> Result<KitResponse<CreateSubscriberBody>, SyncError> {
        let mut payload = serde_json::json!({ "email_address": email });
        if let Some((key, value)) = field {
            payload["fields"] = serde_json::json!({ key: value });
        }

        self.execute(
            "create_subscriber",
            "Failed to create subscriber",
            self.http
                .post(self.url("/subscribers"))
                .header(API_KEY_HEADER, api_key)
                .json(&payload),
        )
        .await
    }

    pub(crate) async fn lookup_subscriber_by_email(
        &self,
        api_key: &str,
        email: &str,
    ) -> Result<KitResponse<LookupSubscribersBody>, SyncError> {
        self.execute(
            "lookup_subscriber",
            "Failed to look up subscriber",
            self.http
                .get(self.url("/subscribers"))
                .query(&[("email_address", email)])
                .header(API_KEY_HEADER, api_key),
        )
        .await
    }

    pub(crate) async fn update_subscriber_fields(
        &self,
        api_key: &str,
        subscriber_id: &KitId,
        field_key: &str,
        value: &str,
    ) -> Result<KitResponse<serde_json::Value>, SyncError> {
        self.execute(
            "update_subscriber_fields",
            "Failed to update phone",
            self.http
                .put(self.url(&format!("/subscribers/{}", subscriber_id)))
                .header(API_KEY_HEADER, api_key)
                .json(&serde_json::json!({ "fields": { field_key: value } })),
        )
        .await
    }

    pub(crate) async fn tag_subscriber(
        &self,
        api_key: &str,
        tag_id: &KitId,
        subscriber_id: &KitId,
    ) -> Result<KitResponse<serde_json::Value>, SyncError> {
        self.execute(
            "tag_subscriber",
            "Failed to tag subscriber",
            self.http
                .post(self.url(&format!("/tags/{}/subscribers/{}", tag_id, subscriber_id)))
                .header(API_KEY_HEADER, api_key),
        )
        .await
    }
}
