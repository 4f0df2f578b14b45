//! SQLite store backend (sea-orm).

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use super::backend::{MediaStore, StoreError, StoreResult, StoredPlaceholder};
use crate::db::entities::{logical_placeholder, physical_asset, placeholder_link};
use crate::db::init_database;
use crate::media::{
    Area, AssetMetadata, Dimensions, LogicalPlaceholder, PhysicalAsset, PlaceholderAssetLink,
    ResourceType,
};

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Store backed by a SQLite file
pub struct SqliteStore {
    db: DatabaseConnection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path`
    pub async fn open(path: &Path) -> StoreResult<Self> {
        let db = init_database(path).await?;
        Ok(Self { db })
    }
}

fn asset_from_model(model: physical_asset::Model) -> StoreResult<PhysicalAsset> {
    let resource_type = model
        .resource_type
        .parse::<ResourceType>()
        .map_err(|e| StoreError::Corrupt(format!("asset {}: {}", model.public_id, e)))?;
    let metadata: AssetMetadata = serde_json::from_str(&model.metadata)?;
    Ok(PhysicalAsset {
        public_id: model.public_id,
        resource_type,
        metadata,
    })
}

fn placeholder_from_model(model: logical_placeholder::Model) -> StoreResult<StoredPlaceholder> {
    let area = model
        .area
        .parse::<Area>()
        .map_err(|e| StoreError::Corrupt(format!("placeholder row {}: {}", model.id, e)))?;
    let dimensions = model
        .dimensions
        .as_deref()
        .map(serde_json::from_str::<Dimensions>)
        .transpose()?;
    Ok(StoredPlaceholder {
        row_id: model.id,
        placeholder: LogicalPlaceholder {
            id: model.placeholder_id,
            area,
            page: model.page,
            section: model.section,
            dimensions,
            description: model.description,
        },
    })
}

fn encode_dimensions(dimensions: &Option<Dimensions>) -> StoreResult<Option<String>> {
    Ok(dimensions.as_ref().map(serde_json::to_string).transpose()?)
}

/// Copy `old_id`'s link onto `new_id` unless `new_id` is already linked.
async fn carry_link_with<C: ConnectionTrait>(conn: &C, old_id: &str, new_id: &str) -> StoreResult<bool> {
    if placeholder_link::Entity::find_by_id(new_id.to_string())
        .one(conn)
        .await?
        .is_some()
    {
        return Ok(false);
    }
    let source = match placeholder_link::Entity::find_by_id(old_id.to_string())
        .one(conn)
        .await?
    {
        Some(link) => link,
        None => return Ok(false),
    };

    placeholder_link::ActiveModel {
        placeholder_id: Set(new_id.to_string()),
        public_id: Set(source.public_id),
        updated_at: Set(now_secs()),
    }
    .insert(conn)
    .await?;
    Ok(true)
}

async fn put_link_with<C: ConnectionTrait>(conn: &C, link: &PlaceholderAssetLink) -> StoreResult<()> {
    let model = placeholder_link::ActiveModel {
        placeholder_id: Set(link.placeholder_id.clone()),
        public_id: Set(link.public_id.clone()),
        updated_at: Set(now_secs()),
    };
    placeholder_link::Entity::insert(model)
        .on_conflict(
            OnConflict::column(placeholder_link::Column::PlaceholderId)
                .update_columns([
                    placeholder_link::Column::PublicId,
                    placeholder_link::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(conn)
        .await?;
    Ok(())
}

#[async_trait]
impl MediaStore for SqliteStore {
    async fn get_link(&self, placeholder_id: &str) -> StoreResult<Option<PlaceholderAssetLink>> {
        let row = placeholder_link::Entity::find_by_id(placeholder_id.to_string())
            .one(&self.db)
            .await?;
        Ok(row.map(|r| PlaceholderAssetLink {
            placeholder_id: r.placeholder_id,
            public_id: r.public_id,
        }))
    }

    async fn put_link(&self, link: &PlaceholderAssetLink) -> StoreResult<()> {
        put_link_with(&self.db, link).await
    }

    async fn link_asset(&self, link: &PlaceholderAssetLink) -> StoreResult<bool> {
        let txn = self.db.begin().await?;
        if physical_asset::Entity::find_by_id(link.public_id.clone())
            .one(&txn)
            .await?
            .is_none()
        {
            return Ok(false);
        }
        put_link_with(&txn, link).await?;
        txn.commit().await?;
        Ok(true)
    }

    async fn delete_link(&self, placeholder_id: &str) -> StoreResult<bool> {
        let result = placeholder_link::Entity::delete_by_id(placeholder_id.to_string())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn list_links(&self) -> StoreResult<Vec<PlaceholderAssetLink>> {
        let rows = placeholder_link::Entity::find()
            .order_by_asc(placeholder_link::Column::PlaceholderId)
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| PlaceholderAssetLink {
                placeholder_id: r.placeholder_id,
                public_id: r.public_id,
            })
            .collect())
    }

    async fn carry_link(&self, old_id: &str, new_id: &str) -> StoreResult<bool> {
        let txn = self.db.begin().await?;
        let carried = carry_link_with(&txn, old_id, new_id).await?;
        txn.commit().await?;
        Ok(carried)
    }

    async fn get_asset(&self, public_id: &str) -> StoreResult<Option<PhysicalAsset>> {
        physical_asset::Entity::find_by_id(public_id.to_string())
            .one(&self.db)
            .await?
            .map(asset_from_model)
            .transpose()
    }

    async fn upsert_asset(&self, asset: &PhysicalAsset) -> StoreResult<()> {
        let now = now_secs();
        let model = physical_asset::ActiveModel {
            public_id: Set(asset.public_id.clone()),
            resource_type: Set(asset.resource_type.as_str().to_string()),
            metadata: Set(serde_json::to_string(&asset.metadata)?),
            created_at: Set(now),
            updated_at: Set(now),
        };
        physical_asset::Entity::insert(model)
            .on_conflict(
                OnConflict::column(physical_asset::Column::PublicId)
                    .update_columns([
                        physical_asset::Column::ResourceType,
                        physical_asset::Column::Metadata,
                        physical_asset::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn list_assets(&self) -> StoreResult<Vec<PhysicalAsset>> {
        physical_asset::Entity::find()
            .order_by_asc(physical_asset::Column::PublicId)
            .all(&self.db)
            .await?
            .into_iter()
            .map(asset_from_model)
            .collect()
    }

    async fn delete_asset(&self, public_id: &str) -> StoreResult<Option<Vec<String>>> {
        let txn = self.db.begin().await?;

        if physical_asset::Entity::find_by_id(public_id.to_string())
            .one(&txn)
            .await?
            .is_none()
        {
            return Ok(None);
        }

        let removed: Vec<String> = placeholder_link::Entity::find()
            .filter(placeholder_link::Column::PublicId.eq(public_id))
            .order_by_asc(placeholder_link::Column::PlaceholderId)
            .all(&txn)
            .await?
            .into_iter()
            .map(|r| r.placeholder_id)
            .collect();

        placeholder_link::Entity::delete_many()
            .filter(placeholder_link::Column::PublicId.eq(public_id))
            .exec(&txn)
            .await?;
        physical_asset::Entity::delete_by_id(public_id.to_string())
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(Some(removed))
    }

    async fn list_placeholders(&self) -> StoreResult<Vec<StoredPlaceholder>> {
        logical_placeholder::Entity::find()
            .order_by_asc(logical_placeholder::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(placeholder_from_model)
            .collect()
    }

    async fn upsert_placeholders(&self, placeholders: &[LogicalPlaceholder]) -> StoreResult<usize> {
        let txn = self.db.begin().await?;
        let mut inserted = 0;

        for placeholder in placeholders {
            let dimensions = encode_dimensions(&placeholder.dimensions)?;
            let existing = logical_placeholder::Entity::find()
                .filter(logical_placeholder::Column::PlaceholderId.eq(placeholder.id.as_str()))
                .filter(logical_placeholder::Column::Page.eq(placeholder.page.as_str()))
                .filter(logical_placeholder::Column::Section.eq(placeholder.section.as_str()))
                .one(&txn)
                .await?;

            match existing {
                Some(row) => {
                    let mut active: logical_placeholder::ActiveModel = row.into();
                    active.area = Set(placeholder.area.as_str().to_string());
                    active.dimensions = Set(dimensions);
                    active.description = Set(placeholder.description.clone());
                    active.update(&txn).await?;
                }
                None => {
                    logical_placeholder::ActiveModel {
                        placeholder_id: Set(placeholder.id.clone()),
                        area: Set(placeholder.area.as_str().to_string()),
                        page: Set(placeholder.page.clone()),
                        section: Set(placeholder.section.clone()),
                        dimensions: Set(dimensions),
                        description: Set(placeholder.description.clone()),
                        created_at: Set(now_secs()),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                    inserted += 1;
                }
            }
        }

        txn.commit().await?;
        Ok(inserted)
    }

    async fn rename_placeholder(&self, row_id: i64, old_id: &str, new_id: &str) -> StoreResult<()> {
        let txn = self.db.begin().await?;

        let row = logical_placeholder::Entity::find_by_id(row_id)
            .filter(logical_placeholder::Column::PlaceholderId.eq(old_id))
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::Missing(format!("placeholder row {} ({})", row_id, old_id)))?;

        let mut active: logical_placeholder::ActiveModel = row.into();
        active.placeholder_id = Set(new_id.to_string());
        active.update(&txn).await?;

        carry_link_with(&txn, old_id, new_id).await?;

        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> SqliteStore {
        SqliteStore::open(&dir.path().join("media.db")).await.unwrap()
    }

    fn placeholder(id: &str, page: &str, section: &str) -> LogicalPlaceholder {
        LogicalPlaceholder {
            id: id.to_string(),
            area: Area::Hero,
            page: page.to_string(),
            section: section.to_string(),
            dimensions: Some(Dimensions {
                width: Some(1920),
                height: Some(1080),
                aspect_ratio: Some("16:9".to_string()),
            }),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_sqlite_asset_upsert_is_single_row() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let mut asset = PhysicalAsset {
            metadata: AssetMetadata::titled("A"),
            ..PhysicalAsset::minimal("abc")
        };
        store.upsert_asset(&asset).await.unwrap();
        asset.metadata = AssetMetadata::titled("B");
        store.upsert_asset(&asset).await.unwrap();

        let all = store.list_assets().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].metadata.title.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_sqlite_links() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        store
            .put_link(&PlaceholderAssetLink::new("home-hero", "X"))
            .await
            .unwrap();
        store
            .put_link(&PlaceholderAssetLink::new("home-hero", "Y"))
            .await
            .unwrap();
        assert_eq!(store.get_link("home-hero").await.unwrap().unwrap().public_id, "Y");
        assert_eq!(store.list_links().await.unwrap().len(), 1);
        assert!(store.delete_link("home-hero").await.unwrap());
        assert!(store.get_link("home-hero").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sqlite_link_asset_checks_asset_in_same_transaction() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let link = PlaceholderAssetLink::new("home-hero", "img1");
        assert!(!store.link_asset(&link).await.unwrap());
        assert!(store.get_link("home-hero").await.unwrap().is_none());

        store.upsert_asset(&PhysicalAsset::minimal("img1")).await.unwrap();
        assert!(store.link_asset(&link).await.unwrap());
        assert_eq!(store.get_link("home-hero").await.unwrap().unwrap().public_id, "img1");

        // Deleted asset: the link is cascaded away and cannot be recreated
        store.delete_asset("img1").await.unwrap();
        assert!(!store.link_asset(&link).await.unwrap());
        assert!(store.list_links().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_delete_asset_cascades() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        store.upsert_asset(&PhysicalAsset::minimal("img1")).await.unwrap();
        store.put_link(&PlaceholderAssetLink::new("a", "img1")).await.unwrap();
        store.put_link(&PlaceholderAssetLink::new("b", "img2")).await.unwrap();

        let removed = store.delete_asset("img1").await.unwrap();
        assert_eq!(removed, Some(vec!["a".to_string()]));
        assert!(store.get_link("a").await.unwrap().is_none());
        assert!(store.get_link("b").await.unwrap().is_some());
        assert_eq!(store.delete_asset("img1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sqlite_placeholders_rename_and_carry() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let inserted = store
            .upsert_placeholders(&[placeholder("dup", "home", "hero"), placeholder("dup", "about", "hero")])
            .await
            .unwrap();
        assert_eq!(inserted, 2);
        store.put_link(&PlaceholderAssetLink::new("dup", "img1")).await.unwrap();

        let rows = store.list_placeholders().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].placeholder.page, "home");
        assert_eq!(rows[0].placeholder.dimensions, placeholder("dup", "home", "hero").dimensions);

        store
            .rename_placeholder(rows[1].row_id, "dup", "dup-about-hero-2")
            .await
            .unwrap();

        let rows = store.list_placeholders().await.unwrap();
        assert_eq!(rows[1].placeholder.id, "dup-about-hero-2");
        assert_eq!(
            store.get_link("dup-about-hero-2").await.unwrap().unwrap().public_id,
            "img1"
        );
        assert!(matches!(
            store.rename_placeholder(rows[1].row_id, "dup", "again").await,
            Err(StoreError::Missing(_))
        ));
    }

    #[tokio::test]
    async fn test_sqlite_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_store(&dir).await;
            store.put_link(&PlaceholderAssetLink::new("k", "v")).await.unwrap();
        }
        let store = open_store(&dir).await;
        assert_eq!(store.get_link("k").await.unwrap().unwrap().public_id, "v");
    }
}
