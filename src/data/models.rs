//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default tag label applied to an account when none is configured.
pub const DEFAULT_TAG_LABEL: &str = "source-howdy";

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// User
// =============================================================================

/// An authenticated user, identified by email.
///
/// Created lazily on the first successful magic-link callback.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    /// Lowercased email address (unique)
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Account
// =============================================================================

/// The tenant unit: exactly one per user.
///
/// Holds the Kit credential and the default tag label used when
/// syncing subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Kit API key (secret); absent until set in settings
    pub kit_api_key: Option<String>,
    /// Tag label applied to new subscribers
    pub kit_tag_label: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Keyword
// =============================================================================

/// An inbound SMS trigger label owned by an account.
///
/// Labels are stored uppercase with no whitespace and are unique
/// within an account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Keyword {
    pub id: String,
    pub account_id: String,
    pub label: String,
    pub created_at: DateTime<Utc>,
}
