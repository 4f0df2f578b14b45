//! Reference resolution: logical placeholder ID → physical asset.
//!
//! Resolution order, first match wins:
//! 1. An ID containing `/` is already a public ID and is returned as-is.
//! 2. The persisted link for the ID (asset row metadata attached when present).
//! 3. The compatibility table.
//! 4. `Resolution::NotFound`.
//!
//! A store failure is an error, never a miss.

use std::sync::Arc;

use serde::Serialize;

use super::fallback::FallbackTable;
use super::model::{validate_id, PhysicalAsset};
use crate::error::Result;
use crate::store::MediaStore;

/// Which step of the resolution order produced the asset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionSource {
    /// The caller passed a public ID directly
    Direct,
    /// A persisted placeholder link
    Linked,
    /// The compatibility table
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedAsset {
    pub asset: PhysicalAsset,
    pub source: ResolutionSource,
}

#[cfg(test)]
impl ResolvedAsset {
    pub fn is_fallback(&self) -> bool {
        self.source == ResolutionSource::Fallback
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Found(ResolvedAsset),
    NotFound,
}

#[cfg(test)]
impl Resolution {
    pub fn found(self) -> Option<ResolvedAsset> {
        match self {
            Resolution::Found(resolved) => Some(resolved),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

pub struct Resolver {
    store: Arc<dyn MediaStore>,
    fallback: Arc<FallbackTable>,
}

impl Resolver {
    pub fn new(store: Arc<dyn MediaStore>, fallback: Arc<FallbackTable>) -> Self {
        Self { store, fallback }
    }

    pub async fn resolve(&self, placeholder_id: &str) -> Result<Resolution> {
        validate_id("placeholder id", placeholder_id)?;

        if placeholder_id.contains('/') {
            return Ok(Resolution::Found(ResolvedAsset {
                asset: PhysicalAsset::minimal(placeholder_id),
                source: ResolutionSource::Direct,
            }));
        }

        let link = self.store.get_link(placeholder_id).await.map_err(|e| {
            tracing::error!("link lookup failed for {}: {}", placeholder_id, e);
            e
        })?;

        if let Some(link) = link {
            let asset = self
                .store
                .get_asset(&link.public_id)
                .await?
                .unwrap_or_else(|| PhysicalAsset::minimal(&link.public_id));
            tracing::debug!("resolved {} -> {} via link", placeholder_id, asset.public_id);
            return Ok(Resolution::Found(ResolvedAsset {
                asset,
                source: ResolutionSource::Linked,
            }));
        }

        if let Some(public_id) = self.fallback.get(placeholder_id) {
            tracing::info!(
                "resolved {} -> {} via compatibility table (no persisted link)",
                placeholder_id,
                public_id
            );
            return Ok(Resolution::Found(ResolvedAsset {
                asset: PhysicalAsset::minimal(public_id),
                source: ResolutionSource::Fallback,
            }));
        }

        tracing::debug!("no asset for placeholder {}", placeholder_id);
        Ok(Resolution::NotFound)
    }
}
