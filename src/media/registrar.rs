//! Write path for assets and links.
//!
//! Registering an asset and linking a placeholder to it are separate steps:
//! an asset can exist without any placeholder pointing at it.

use std::sync::Arc;

use serde::Serialize;

use super::model::{validate_id, AssetMetadata, PhysicalAsset, PlaceholderAssetLink, ResourceType};
use crate::error::{MediaError, Result};
use crate::store::MediaStore;

/// Outcome of deleting an asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeletedAsset {
    pub public_id: String,
    /// Placeholders whose links were removed along with the asset
    pub unlinked_placeholders: Vec<String>,
}

pub struct AssetRegistrar {
    store: Arc<dyn MediaStore>,
}

impl AssetRegistrar {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }

    /// Idempotent upsert keyed by `public_id`.
    ///
    /// Re-registering overlays the new metadata onto the stored record;
    /// the resource type always takes the latest value.
    pub async fn register(
        &self,
        public_id: &str,
        resource_type: ResourceType,
        metadata: AssetMetadata,
    ) -> Result<PhysicalAsset> {
        validate_id("public id", public_id)?;

        let asset = match self.store.get_asset(public_id).await? {
            Some(mut existing) => {
                existing.resource_type = resource_type;
                existing.metadata.merge(metadata);
                tracing::debug!("updating asset {}", public_id);
                existing
            }
            None => {
                tracing::info!("registering new {} asset {}", resource_type, public_id);
                PhysicalAsset {
                    public_id: public_id.to_string(),
                    resource_type,
                    metadata,
                }
            }
        };

        self.store.upsert_asset(&asset).await.map_err(|e| {
            tracing::error!("failed to persist asset {}: {}", public_id, e);
            e
        })?;
        Ok(asset)
    }

    /// Point `placeholder_id` at a registered asset, replacing any previous link.
    pub async fn link(&self, placeholder_id: &str, public_id: &str) -> Result<PlaceholderAssetLink> {
        validate_id("placeholder id", placeholder_id)?;
        validate_id("public id", public_id)?;
        if placeholder_id.contains('/') {
            return Err(MediaError::InvalidReference(format!(
                "placeholder id '{}' must not contain '/'",
                placeholder_id
            )));
        }

        let link = PlaceholderAssetLink::new(placeholder_id, public_id);
        if !self.store.link_asset(&link).await? {
            return Err(MediaError::NotFound(format!("asset {}", public_id)));
        }
        tracing::info!("linked {} -> {}", placeholder_id, public_id);
        Ok(link)
    }

    /// Remove a placeholder's link. Returns whether one existed.
    pub async fn unlink(&self, placeholder_id: &str) -> Result<bool> {
        validate_id("placeholder id", placeholder_id)?;
        let removed = self.store.delete_link(placeholder_id).await?;
        if removed {
            tracing::info!("unlinked {}", placeholder_id);
        }
        Ok(removed)
    }

    /// Delete an asset, cascading to every link that points at it.
    pub async fn delete_asset(&self, public_id: &str) -> Result<DeletedAsset> {
        validate_id("public id", public_id)?;

        let unlinked = self
            .store
            .delete_asset(public_id)
            .await?
            .ok_or_else(|| MediaError::NotFound(format!("asset {}", public_id)))?;

        if !unlinked.is_empty() {
            tracing::warn!(
                "deleted asset {} and unlinked {} placeholder(s): {}",
                public_id,
                unlinked.len(),
                unlinked.join(", ")
            );
        } else {
            tracing::info!("deleted asset {}", public_id);
        }

        Ok(DeletedAsset {
            public_id: public_id.to_string(),
            unlinked_placeholders: unlinked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{FallbackTable, Resolution, ResolutionSource, Resolver};
    use crate::store::testing::FlakyStore;
    use crate::store::MemoryStore;

    fn setup() -> (Arc<MemoryStore>, AssetRegistrar) {
        let store = Arc::new(MemoryStore::new());
        let registrar = AssetRegistrar::new(store.clone());
        (store, registrar)
    }

    #[tokio::test]
    async fn test_register_is_idempotent_upsert() {
        let (store, registrar) = setup();

        registrar
            .register("abc", ResourceType::Image, AssetMetadata::titled("A"))
            .await
            .unwrap();
        let updated = registrar
            .register("abc", ResourceType::Image, AssetMetadata::titled("B"))
            .await
            .unwrap();

        assert_eq!(updated.metadata.title.as_deref(), Some("B"));
        let all = store.list_assets().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].metadata.title.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_register_does_not_link() {
        let (store, registrar) = setup();
        registrar
            .register("gallery/lips/case-1/before", ResourceType::Image, AssetMetadata::default())
            .await
            .unwrap();
        assert!(store.list_links().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_rejects_empty_id() {
        let (_, registrar) = setup();
        let err = registrar
            .register("", ResourceType::Image, AssetMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_register_surfaces_store_failure() {
        let store = Arc::new(FlakyStore::new());
        store.fail_everything(true);
        let registrar = AssetRegistrar::new(store);
        let err = registrar
            .register("abc", ResourceType::Image, AssetMetadata::default())
            .await
            .unwrap_err();
        assert!(err.is_store_failure());
    }

    #[tokio::test]
    async fn test_link_requires_registered_asset() {
        let (_, registrar) = setup();
        assert!(matches!(
            registrar.link("home-hero", "missing/asset").await,
            Err(MediaError::NotFound(_))
        ));
        assert!(matches!(
            registrar.link("home/hero", "missing/asset").await,
            Err(MediaError::InvalidReference(_))
        ));

        registrar
            .register("homepage/hero-2024", ResourceType::Image, AssetMetadata::default())
            .await
            .unwrap();
        let link = registrar.link("home-hero", "homepage/hero-2024").await.unwrap();
        assert_eq!(link.public_id, "homepage/hero-2024");
    }

    #[tokio::test]
    async fn test_delete_asset_falls_back_after_cascade() {
        let (store, registrar) = setup();
        registrar
            .register("homepage/hero-2024", ResourceType::Image, AssetMetadata::default())
            .await
            .unwrap();
        registrar.link("homepage-hero", "homepage/hero-2024").await.unwrap();

        let deleted = registrar.delete_asset("homepage/hero-2024").await.unwrap();
        assert_eq!(deleted.unlinked_placeholders, vec!["homepage-hero".to_string()]);

        let resolver = Resolver::new(store, Arc::new(FallbackTable::legacy()));
        match resolver.resolve("homepage-hero").await.unwrap() {
            Resolution::Found(resolved) => {
                assert_eq!(resolved.source, ResolutionSource::Fallback);
                assert_eq!(resolved.asset.public_id, "homepage/hero");
            }
            Resolution::NotFound => panic!("expected the compatibility entry"),
        }

        assert!(matches!(
            registrar.delete_asset("homepage/hero-2024").await,
            Err(MediaError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_unlink() {
        let (_, registrar) = setup();
        registrar
            .register("a/b", ResourceType::Image, AssetMetadata::default())
            .await
            .unwrap();
        registrar.link("slot", "a/b").await.unwrap();
        assert!(registrar.unlink("slot").await.unwrap());
        assert!(!registrar.unlink("slot").await.unwrap());
    }
}
