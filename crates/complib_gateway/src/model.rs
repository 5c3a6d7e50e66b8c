//! Row and session shapes exchanged with the backend.

use chrono::{DateTime, Utc};
use complib_ids::{ComponentId, OwnerId};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::GatewayError;

/// Object-store prefix every uploaded preview image lives under.
pub const IMAGE_PREFIX: &str = "components";

/// A cataloged UI component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    #[serde(rename = "user_id")]
    pub owner_id: OwnerId,
    pub name: String,
    pub code: String,
    pub image_url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Component {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Fields supplied by the client when inserting a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComponent {
    pub name: String,
    pub code: String,
    pub image_url: String,
    pub tags: Vec<String>,
}

impl NewComponent {
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.name.trim().is_empty() {
            return Err(GatewayError::Validation("name is required".to_string()));
        }
        if self.code.trim().is_empty() {
            return Err(GatewayError::Validation("code is required".to_string()));
        }
        if self.image_url.trim().is_empty() {
            return Err(GatewayError::Validation("image_url is required".to_string()));
        }
        Ok(())
    }
}

/// Partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ComponentPatch {
    pub fn validate(&self) -> Result<(), GatewayError> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(GatewayError::Validation("name cannot be empty".to_string()));
        }
        if matches!(&self.code, Some(code) if code.trim().is_empty()) {
            return Err(GatewayError::Validation("code cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn apply_to(&self, component: &mut Component) {
        if let Some(name) = &self.name {
            component.name = name.clone();
        }
        if let Some(code) = &self.code {
            component.code = code.clone();
        }
        if let Some(tags) = &self.tags {
            component.tags = tags.clone();
        }
    }
}

/// An authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: OwnerId,
    pub email: String,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |expires| expires <= now)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Object key for an uploaded image: `components/<uuid>.<ext>`.
///
/// The extension is whatever follows the last dot of the original file
/// name; names without a dot get `bin`.
pub fn image_object_path(file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .unwrap_or("bin");
    format!("{}/{}.{}", IMAGE_PREFIX, uuid::Uuid::new_v4(), ext.to_ascii_lowercase())
}

/// Best-effort content type for an image file name.
pub fn image_content_type(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
