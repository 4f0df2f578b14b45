//! Fault-injecting store wrapper for tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::backend::{MediaStore, StoreError, StoreResult, StoredPlaceholder};
use super::memory::MemoryStore;
use crate::media::{LogicalPlaceholder, PhysicalAsset, PlaceholderAssetLink};

/// Delegates to a `MemoryStore`, failing on demand.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_all: AtomicBool,
    fail_renames_to: Mutex<HashSet<String>>,
    fail_carries_to: Mutex<HashSet<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_everything(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_rename_to(&self, new_id: &str) {
        self.fail_renames_to.lock().insert(new_id.to_string());
    }

    pub fn fail_carry_to(&self, new_id: &str) {
        self.fail_carries_to.lock().insert(new_id.to_string());
    }

    fn check(&self) -> StoreResult<()> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MediaStore for FlakyStore {
    async fn get_link(&self, placeholder_id: &str) -> StoreResult<Option<PlaceholderAssetLink>> {
        self.check()?;
        self.inner.get_link(placeholder_id).await
    }

    async fn put_link(&self, link: &PlaceholderAssetLink) -> StoreResult<()> {
        self.check()?;
        self.inner.put_link(link).await
    }

    async fn link_asset(&self, link: &PlaceholderAssetLink) -> StoreResult<bool> {
        self.check()?;
        self.inner.link_asset(link).await
    }

    async fn delete_link(&self, placeholder_id: &str) -> StoreResult<bool> {
        self.check()?;
        self.inner.delete_link(placeholder_id).await
    }

    async fn list_links(&self) -> StoreResult<Vec<PlaceholderAssetLink>> {
        self.check()?;
        self.inner.list_links().await
    }

    async fn carry_link(&self, old_id: &str, new_id: &str) -> StoreResult<bool> {
        self.check()?;
        if self.fail_carries_to.lock().contains(new_id) {
            return Err(StoreError::Unavailable(format!("write to {} timed out", new_id)));
        }
        self.inner.carry_link(old_id, new_id).await
    }

    async fn get_asset(&self, public_id: &str) -> StoreResult<Option<PhysicalAsset>> {
        self.check()?;
        self.inner.get_asset(public_id).await
    }

    async fn upsert_asset(&self, asset: &PhysicalAsset) -> StoreResult<()> {
        self.check()?;
        self.inner.upsert_asset(asset).await
    }

    async fn list_assets(&self) -> StoreResult<Vec<PhysicalAsset>> {
        self.check()?;
        self.inner.list_assets().await
    }

    async fn delete_asset(&self, public_id: &str) -> StoreResult<Option<Vec<String>>> {
        self.check()?;
        self.inner.delete_asset(public_id).await
    }

    async fn list_placeholders(&self) -> StoreResult<Vec<StoredPlaceholder>> {
        self.check()?;
        self.inner.list_placeholders().await
    }

    async fn upsert_placeholders(&self, placeholders: &[LogicalPlaceholder]) -> StoreResult<usize> {
        self.check()?;
        self.inner.upsert_placeholders(placeholders).await
    }

    async fn rename_placeholder(&self, row_id: i64, old_id: &str, new_id: &str) -> StoreResult<()> {
        self.check()?;
        if self.fail_renames_to.lock().contains(new_id) {
            return Err(StoreError::Unavailable(format!("write to {} timed out", new_id)));
        }
        self.inner.rename_placeholder(row_id, old_id, new_id).await
    }
}
