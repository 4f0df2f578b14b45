//! Core media records: logical placeholders, physical CDN assets, and the links between them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::placement::Area;
use crate::error::MediaError;

/// CDN resource class of an asset
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    #[default]
    Image,
    Video,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Image => "image",
            ResourceType::Video => "video",
        }
    }
}

impl FromStr for ResourceType {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(ResourceType::Image),
            "video" => Ok(ResourceType::Video),
            other => Err(MediaError::InvalidReference(format!(
                "unknown resource type '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size hint attached to a placeholder or a placement default
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

/// A stable, application-level media slot on a page (e.g. `home-hero-image`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalPlaceholder {
    pub id: String,
    pub area: Area,
    pub page: String,
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Free-form asset metadata. Well-known keys are typed, everything else lands in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AssetMetadata {
    #[cfg(test)]
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    /// Overlay `update` onto `self`: fields present in the update win, absent ones are kept.
    pub fn merge(&mut self, update: AssetMetadata) {
        if update.title.is_some() {
            self.title = update.title;
        }
        if update.alt_text.is_some() {
            self.alt_text = update.alt_text;
        }
        if !update.tags.is_empty() {
            self.tags = update.tags;
        }
        if update.width.is_some() {
            self.width = update.width;
        }
        if update.height.is_some() {
            self.height = update.height;
        }
        self.extra.extend(update.extra);
    }
}

/// An asset as the CDN knows it. `public_id` may embed a `/`-separated folder path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAsset {
    pub public_id: String,
    #[serde(default)]
    pub resource_type: ResourceType,
    #[serde(default)]
    pub metadata: AssetMetadata,
}

impl PhysicalAsset {
    /// Bare asset carrying only its identifier
    pub fn minimal(public_id: &str) -> Self {
        Self {
            public_id: public_id.to_string(),
            resource_type: ResourceType::Image,
            metadata: AssetMetadata::default(),
        }
    }
}

/// Canonical placeholder → asset association (single-valued per placeholder)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderAssetLink {
    pub placeholder_id: String,
    pub public_id: String,
}

impl PlaceholderAssetLink {
    pub fn new(placeholder_id: &str, public_id: &str) -> Self {
        Self {
            placeholder_id: placeholder_id.to_string(),
            public_id: public_id.to_string(),
        }
    }
}

/// Reject empty or whitespace-only identifiers.
pub fn validate_id(kind: &str, id: &str) -> Result<(), MediaError> {
    if id.trim().is_empty() {
        return Err(MediaError::InvalidReference(format!("{} must not be empty", kind)));
    }
    Ok(())
}
