//! Compatibility table for placeholder IDs that predate persisted links.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{MediaError, Result};

/// Built-in legacy mappings shipped with the site
const LEGACY_ENTRIES: &[(&str, &str)] = &[
    ("homepage-hero", "homepage/hero"),
    ("homepage-about", "homepage/about"),
    ("homepage-services-banner", "homepage/services-banner"),
    ("about-clinic-interior", "about/clinic-interior"),
    ("about-team-group", "team/group-photo"),
    ("services-injectables-hero", "services/injectables/hero"),
    ("services-laser-hero", "services/laser/hero"),
    ("services-skincare-hero", "services/skincare/hero"),
    ("gallery-hero", "gallery/hero"),
    ("contact-map-background", "website/backgrounds/contact-map"),
    ("site-logo", "website/brand/logo"),
    ("site-logo-white", "website/brand/logo-white"),
];

/// Immutable `placeholder_id → public_id` table consulted after a store miss.
///
/// Passed into the resolver explicitly so tests and deployments can supply
/// their own set.
#[derive(Clone, Debug, Default)]
pub struct FallbackTable {
    entries: HashMap<String, String>,
}

impl FallbackTable {
    pub fn new<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    #[cfg(test)]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The compatibility entries shipped with the site
    pub fn legacy() -> Self {
        Self::new(LEGACY_ENTRIES.iter().copied())
    }

    /// Load from a JSON object file: `{"placeholder-id": "public/id", ...}`
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let entries: HashMap<String, String> = serde_json::from_str(&raw).map_err(|e| {
            MediaError::Config(format!("fallback table {}: {}", path.display(), e))
        })?;
        if let Some((key, _)) = entries
            .iter()
            .find(|(k, v)| k.trim().is_empty() || v.trim().is_empty())
        {
            return Err(MediaError::Config(format!(
                "fallback table {}: empty identifier in entry '{}'",
                path.display(),
                key
            )));
        }
        Ok(Self { entries })
    }

    pub fn get(&self, placeholder_id: &str) -> Option<&str> {
        self.entries.get(placeholder_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
