//! In-memory store backend.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};

use super::backend::{MediaStore, StoreError, StoreResult, StoredPlaceholder};
use crate::media::{LogicalPlaceholder, PhysicalAsset, PlaceholderAssetLink};

/// Process-local store.
///
/// Links and assets live in concurrent maps. Link writes and operations that
/// touch more than one map (`link_asset`, `delete_asset`, `rename_placeholder`,
/// `carry_link`) serialize on `write_lock` so each is observed all-or-nothing.
pub struct MemoryStore {
    links: DashMap<String, String>,
    assets: DashMap<String, PhysicalAsset>,
    placeholders: RwLock<Vec<StoredPlaceholder>>,
    next_row_id: Mutex<i64>,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            links: DashMap::new(),
            assets: DashMap::new(),
            placeholders: RwLock::new(Vec::new()),
            next_row_id: Mutex::new(1),
            write_lock: Mutex::new(()),
        }
    }

    fn allocate_row_id(&self) -> i64 {
        let mut next = self.next_row_id.lock();
        let id = *next;
        *next += 1;
        id
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaStore for MemoryStore {
    async fn get_link(&self, placeholder_id: &str) -> StoreResult<Option<PlaceholderAssetLink>> {
        Ok(self
            .links
            .get(placeholder_id)
            .map(|public_id| PlaceholderAssetLink::new(placeholder_id, public_id.value())))
    }

    async fn put_link(&self, link: &PlaceholderAssetLink) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        self.links
            .insert(link.placeholder_id.clone(), link.public_id.clone());
        Ok(())
    }

    async fn link_asset(&self, link: &PlaceholderAssetLink) -> StoreResult<bool> {
        let _guard = self.write_lock.lock();
        if !self.assets.contains_key(&link.public_id) {
            return Ok(false);
        }
        self.links
            .insert(link.placeholder_id.clone(), link.public_id.clone());
        Ok(true)
    }

    async fn delete_link(&self, placeholder_id: &str) -> StoreResult<bool> {
        Ok(self.links.remove(placeholder_id).is_some())
    }

    async fn list_links(&self) -> StoreResult<Vec<PlaceholderAssetLink>> {
        let mut links: Vec<_> = self
            .links
            .iter()
            .map(|r| PlaceholderAssetLink::new(r.key(), r.value()))
            .collect();
        links.sort_by(|a, b| a.placeholder_id.cmp(&b.placeholder_id));
        Ok(links)
    }

    async fn carry_link(&self, old_id: &str, new_id: &str) -> StoreResult<bool> {
        let _guard = self.write_lock.lock();
        carry_link_locked(&self.links, old_id, new_id)
    }

    async fn get_asset(&self, public_id: &str) -> StoreResult<Option<PhysicalAsset>> {
        Ok(self.assets.get(public_id).map(|r| r.clone()))
    }

    async fn upsert_asset(&self, asset: &PhysicalAsset) -> StoreResult<()> {
        self.assets.insert(asset.public_id.clone(), asset.clone());
        Ok(())
    }

    async fn list_assets(&self) -> StoreResult<Vec<PhysicalAsset>> {
        let mut assets: Vec<_> = self.assets.iter().map(|r| r.value().clone()).collect();
        assets.sort_by(|a, b| a.public_id.cmp(&b.public_id));
        Ok(assets)
    }

    async fn delete_asset(&self, public_id: &str) -> StoreResult<Option<Vec<String>>> {
        let _guard = self.write_lock.lock();
        if self.assets.remove(public_id).is_none() {
            return Ok(None);
        }

        let mut removed: Vec<String> = self
            .links
            .iter()
            .filter(|r| r.value() == public_id)
            .map(|r| r.key().clone())
            .collect();
        for placeholder_id in &removed {
            self.links.remove(placeholder_id);
        }
        removed.sort();
        Ok(Some(removed))
    }

    async fn list_placeholders(&self) -> StoreResult<Vec<StoredPlaceholder>> {
        Ok(self.placeholders.read().clone())
    }

    async fn upsert_placeholders(&self, placeholders: &[LogicalPlaceholder]) -> StoreResult<usize> {
        let mut rows = self.placeholders.write();
        let mut inserted = 0;

        for placeholder in placeholders {
            let existing = rows.iter().position(|row| {
                row.placeholder.id == placeholder.id
                    && row.placeholder.page == placeholder.page
                    && row.placeholder.section == placeholder.section
            });
            match existing {
                Some(pos) => rows[pos].placeholder = placeholder.clone(),
                None => {
                    rows.push(StoredPlaceholder {
                        row_id: self.allocate_row_id(),
                        placeholder: placeholder.clone(),
                    });
                    inserted += 1;
                }
            }
        }
        Ok(inserted)
    }

    async fn rename_placeholder(&self, row_id: i64, old_id: &str, new_id: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock();
        let mut rows = self.placeholders.write();

        let row = rows
            .iter_mut()
            .find(|row| row.row_id == row_id && row.placeholder.id == old_id)
            .ok_or_else(|| StoreError::Missing(format!("placeholder row {} ({})", row_id, old_id)))?;
        row.placeholder.id = new_id.to_string();
        carry_link_locked(&self.links, old_id, new_id)?;
        Ok(())
    }
}

fn carry_link_locked(links: &DashMap<String, String>, old_id: &str, new_id: &str) -> StoreResult<bool> {
    if links.contains_key(new_id) {
        return Ok(false);
    }
    let target = match links.get(old_id) {
        Some(public_id) => public_id.value().clone(),
        None => return Ok(false),
    };
    links.insert(new_id.to_string(), target);
    Ok(true)
}
