//! Media store trait definition.
//!
//! The store holds the three persisted record kinds: physical assets keyed by
//! `public_id`, placeholder links keyed by `placeholder_id`, and the discovered
//! placeholder rows (which may legitimately contain duplicate IDs until the
//! consistency pass repairs them).

use async_trait::async_trait;
use std::fmt;

use crate::media::{LogicalPlaceholder, PhysicalAsset, PlaceholderAssetLink};

/// Store error types
#[derive(Debug)]
pub enum StoreError {
    /// Backend unreachable or a query failed
    Unavailable(String),
    /// A row expected to exist was not there (e.g. renaming a stale row)
    Missing(String),
    /// Stored data could not be decoded
    Corrupt(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Missing(what) => write!(f, "Row missing: {}", what),
            StoreError::Corrupt(msg) => write!(f, "Corrupt row: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sea_orm::DbErr> for StoreError {
    fn from(e: sea_orm::DbErr) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A discovered placeholder as persisted, with its row key.
///
/// `row_id` orders rows by insertion, which is the "first encountered" order
/// the consistency pass relies on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredPlaceholder {
    pub row_id: i64,
    pub placeholder: LogicalPlaceholder,
}

/// Persistence seam for links, assets, and discovered placeholders.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Point lookup of the canonical link for a placeholder
    async fn get_link(&self, placeholder_id: &str) -> StoreResult<Option<PlaceholderAssetLink>>;

    /// Create or re-point a link
    async fn put_link(&self, link: &PlaceholderAssetLink) -> StoreResult<()>;

    /// Create or re-point a link only if its asset exists, checked and written
    /// as one step. Returns `false` and writes nothing when the asset is absent.
    async fn link_asset(&self, link: &PlaceholderAssetLink) -> StoreResult<bool>;

    /// Remove a link, returning whether one existed
    async fn delete_link(&self, placeholder_id: &str) -> StoreResult<bool>;

    async fn list_links(&self) -> StoreResult<Vec<PlaceholderAssetLink>>;

    /// Copy the link of `old_id` onto `new_id`, unless `new_id` already has one.
    /// Returns whether a link was written.
    async fn carry_link(&self, old_id: &str, new_id: &str) -> StoreResult<bool>;

    async fn get_asset(&self, public_id: &str) -> StoreResult<Option<PhysicalAsset>>;

    /// Insert or replace the asset row keyed by `public_id`
    async fn upsert_asset(&self, asset: &PhysicalAsset) -> StoreResult<()>;

    async fn list_assets(&self) -> StoreResult<Vec<PhysicalAsset>>;

    /// Delete an asset and every link pointing at it, atomically.
    /// Returns the placeholder IDs whose links were removed, or `None` if the
    /// asset did not exist.
    async fn delete_asset(&self, public_id: &str) -> StoreResult<Option<Vec<String>>>;

    /// All placeholder rows in insertion order
    async fn list_placeholders(&self) -> StoreResult<Vec<StoredPlaceholder>>;

    /// Insert or update rows keyed by `(id, page, section)`. Never deletes.
    /// Returns the number of rows inserted.
    async fn upsert_placeholders(&self, placeholders: &[LogicalPlaceholder]) -> StoreResult<usize>;

    /// Rename one placeholder row and carry its link, as a single atomic step.
    async fn rename_placeholder(&self, row_id: i64, old_id: &str, new_id: &str) -> StoreResult<()>;
}
