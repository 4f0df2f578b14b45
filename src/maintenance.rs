//! Maintenance passes behind the `generate-map`, `sync`, `fix-duplicates`
//! and `resolve` commands.
//!
//! Store errors that stop a pass from starting propagate as `Err`. Once the
//! duplicate repair is under way each rename commits on its own, and a failed
//! rename is recorded and skipped.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use crate::discovery::{PlaceholderManifest, PlaceholderMap};
use crate::error::Result;
use crate::media::{dedupe, LogicalPlaceholder, Rename, Resolution, Resolver};
use crate::store::MediaStore;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GenerateMapSummary {
    pub discovered: usize,
    pub renamed: usize,
    /// Renames applied to rows already in the store
    pub renamed_in_store: usize,
    pub inserted: usize,
    pub carried_links: usize,
    pub failed: Vec<FailedRename>,
}

impl GenerateMapSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub discovered: usize,
    pub inserted: usize,
    pub duplicate_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailedRename {
    pub rename: Rename,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FixDuplicatesSummary {
    pub scanned: usize,
    pub applied: Vec<Rename>,
    pub failed: Vec<FailedRename>,
}

impl FixDuplicatesSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Discover, repair, write the map, then persist.
///
/// Rows an earlier `sync` stored under a duplicate ID are renamed in place,
/// so the store ends up with one row per slot. A failed rename keeps its
/// slot out of the upsert; a failed link carry leaves the row in place. Both
/// are listed in the summary and a rerun picks them up.
pub async fn generate_map(
    store: &dyn MediaStore,
    manifest_path: &Path,
    output: &Path,
) -> Result<GenerateMapSummary> {
    let manifest = PlaceholderManifest::load(manifest_path)?;
    let discovered = manifest.len();
    tracing::info!("loaded {} placeholders from {}", discovered, manifest_path.display());

    let report = dedupe(manifest.placeholders);
    PlaceholderMap::from_report(&report).write(output)?;

    let mut summary = GenerateMapSummary {
        discovered,
        renamed: report.renamed.len(),
        ..Default::default()
    };

    // A slot that keeps its ID owns the stored row with that key
    let kept: HashSet<(&str, &str, &str)> = report
        .unchanged()
        .map(|p| (p.id.as_str(), p.page.as_str(), p.section.as_str()))
        .collect();
    let existing = store.list_placeholders().await?;
    let mut claimed_rows: HashSet<i64> = HashSet::new();
    let mut skipped: HashSet<usize> = HashSet::new();

    for rename in &report.renamed {
        let key = (rename.old_id.as_str(), rename.page.as_str(), rename.section.as_str());
        if kept.contains(&key) {
            continue;
        }
        let row = existing.iter().find(|row| {
            !claimed_rows.contains(&row.row_id)
                && row.placeholder.id == rename.old_id
                && row.placeholder.page == rename.page
                && row.placeholder.section == rename.section
        });
        let Some(row) = row else { continue };
        claimed_rows.insert(row.row_id);

        match store.rename_placeholder(row.row_id, &rename.old_id, &rename.new_id).await {
            Ok(()) => {
                tracing::info!("renamed stored row {} to {}", rename.old_id, rename.new_id);
                summary.renamed_in_store += 1;
            }
            Err(e) => {
                tracing::error!("failed to rename {} to {}: {}", rename.old_id, rename.new_id, e);
                skipped.insert(rename.position);
                summary.failed.push(FailedRename {
                    rename: rename.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let to_persist: Vec<LogicalPlaceholder> = report
        .placeholders
        .iter()
        .enumerate()
        .filter(|(position, _)| !skipped.contains(position))
        .map(|(_, placeholder)| placeholder.clone())
        .collect();
    summary.inserted = store.upsert_placeholders(&to_persist).await?;

    for rename in report.renamed.iter().filter(|r| !skipped.contains(&r.position)) {
        match store.carry_link(&rename.old_id, &rename.new_id).await {
            Ok(true) => {
                tracing::info!("carried link from {} to {}", rename.old_id, rename.new_id);
                summary.carried_links += 1;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(
                    "failed to carry link from {} to {}: {}",
                    rename.old_id,
                    rename.new_id,
                    e
                );
                summary.failed.push(FailedRename {
                    rename: rename.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(summary)
}

/// Push the discovered set into the store unchanged.
pub async fn sync(store: &dyn MediaStore, manifest_path: &Path) -> Result<SyncSummary> {
    let manifest = PlaceholderManifest::load(manifest_path)?;
    let report = dedupe(manifest.placeholders.clone());
    let duplicate_ids: Vec<String> = report.conflicts.iter().map(|c| c.id.clone()).collect();
    if !duplicate_ids.is_empty() {
        tracing::warn!(
            "syncing {} duplicate id(s) as-is, run fix-duplicates afterwards",
            duplicate_ids.len()
        );
    }

    let inserted = store.upsert_placeholders(&manifest.placeholders).await?;
    tracing::info!("synced {} placeholders ({} new)", manifest.len(), inserted);

    Ok(SyncSummary {
        discovered: manifest.len(),
        inserted,
        duplicate_ids,
    })
}

/// Re-run duplicate repair against persisted placeholder rows.
pub async fn fix_duplicates(store: &dyn MediaStore) -> Result<FixDuplicatesSummary> {
    let rows = store.list_placeholders().await?;
    let scanned = rows.len();
    let row_ids: Vec<i64> = rows.iter().map(|row| row.row_id).collect();
    let report = dedupe(rows.into_iter().map(|row| row.placeholder).collect());

    let mut summary = FixDuplicatesSummary {
        scanned,
        ..Default::default()
    };

    for rename in report.renamed {
        let row_id = row_ids[rename.position];
        match store.rename_placeholder(row_id, &rename.old_id, &rename.new_id).await {
            Ok(()) => {
                tracing::info!(
                    "renamed {} on {}/{} to {}",
                    rename.old_id,
                    rename.page,
                    rename.section,
                    rename.new_id
                );
                summary.applied.push(rename);
            }
            Err(e) => {
                tracing::error!("failed to rename {} to {}: {}", rename.old_id, rename.new_id, e);
                summary.failed.push(FailedRename {
                    rename,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(summary)
}

pub async fn resolve_one(resolver: &Resolver, placeholder_id: &str) -> Result<Resolution> {
    resolver.resolve(placeholder_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tempfile::TempDir;

    use crate::media::{FallbackTable, PlaceholderAssetLink, ResolutionSource};
    use crate::store::testing::FlakyStore;
    use crate::store::{MemoryStore, SqliteStore};

    const DUP_MANIFEST: &str = r#"{"pages":[
        {"name":"home","sections":[{"name":"hero","placeholders":[{"id":"dup","area":"hero"}]}]},
        {"name":"services","sections":[
            {"name":"injectables","placeholders":[{"id":"dup","area":"services"}]},
            {"name":"laser","placeholders":[{"id":"dup","area":"services"}]}
        ]}
    ]}"#;

    fn write_manifest(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("manifest.json");
        std::fs::write(&path, DUP_MANIFEST).unwrap();
        path
    }

    async fn ids(store: &dyn MediaStore) -> Vec<String> {
        store
            .list_placeholders()
            .await
            .unwrap()
            .into_iter()
            .map(|row| row.placeholder.id)
            .collect()
    }

    #[tokio::test]
    async fn test_generate_map_repairs_before_persisting() {
        let dir = TempDir::new().unwrap();
        let manifest = write_manifest(&dir);
        let output = dir.path().join("map.json");
        let store = MemoryStore::new();
        store.put_link(&PlaceholderAssetLink::new("dup", "img1")).await.unwrap();

        let summary = generate_map(&store, &manifest, &output).await.unwrap();
        assert_eq!(summary.discovered, 3);
        assert_eq!(summary.renamed, 2);
        assert_eq!(summary.renamed_in_store, 0);
        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.carried_links, 2);
        assert!(summary.is_complete());
        assert!(output.exists());

        assert_eq!(
            ids(&store).await,
            vec!["dup", "dup-services-injectables-2", "dup-services-laser-3"]
        );

        // Running again persists nothing new
        let again = generate_map(&store, &manifest, &output).await.unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.carried_links, 0);
    }

    #[tokio::test]
    async fn test_generate_map_after_sync_renames_stored_rows() {
        let dir = TempDir::new().unwrap();
        let manifest = write_manifest(&dir);
        let output = dir.path().join("map.json");
        let store = Arc::new(SqliteStore::open(&dir.path().join("media.db")).await.unwrap());

        sync(store.as_ref(), &manifest).await.unwrap();
        store.put_link(&PlaceholderAssetLink::new("dup", "img1")).await.unwrap();

        let summary = generate_map(store.as_ref(), &manifest, &output).await.unwrap();
        assert_eq!(summary.renamed, 2);
        assert_eq!(summary.renamed_in_store, 2);
        assert_eq!(summary.inserted, 0);
        assert!(summary.is_complete());

        assert_eq!(
            ids(store.as_ref()).await,
            vec!["dup", "dup-services-injectables-2", "dup-services-laser-3"]
        );

        let resolver = Resolver::new(store.clone(), Arc::new(FallbackTable::empty()));
        for id in ["dup", "dup-services-injectables-2", "dup-services-laser-3"] {
            let resolved = resolve_one(&resolver, id).await.unwrap().found().unwrap();
            assert_eq!(resolved.asset.public_id, "img1");
        }

        let fixed = fix_duplicates(store.as_ref()).await.unwrap();
        assert!(fixed.applied.is_empty());
        assert!(fixed.failed.is_empty());
    }

    #[tokio::test]
    async fn test_generate_map_leaves_slot_of_failed_rename_alone() {
        let dir = TempDir::new().unwrap();
        let manifest = write_manifest(&dir);
        let output = dir.path().join("map.json");
        let store = FlakyStore::new();
        sync(&store, &manifest).await.unwrap();
        store.fail_rename_to("dup-services-injectables-2");

        let summary = generate_map(&store, &manifest, &output).await.unwrap();
        assert_eq!(summary.renamed_in_store, 1);
        assert_eq!(summary.inserted, 0);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].rename.new_id, "dup-services-injectables-2");

        // No extra row for the slot that kept its stale ID
        assert_eq!(ids(&store).await, vec!["dup", "dup", "dup-services-laser-3"]);
    }

    #[tokio::test]
    async fn test_generate_map_continues_past_failed_carry() {
        let dir = TempDir::new().unwrap();
        let manifest = write_manifest(&dir);
        let output = dir.path().join("map.json");
        let store = Arc::new(FlakyStore::new());
        store.put_link(&PlaceholderAssetLink::new("dup", "img1")).await.unwrap();
        store.fail_carry_to("dup-services-injectables-2");

        let summary = generate_map(store.as_ref(), &manifest, &output).await.unwrap();
        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.carried_links, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].rename.new_id, "dup-services-injectables-2");
        assert!(!summary.is_complete());

        let resolver = Resolver::new(store.clone(), Arc::new(FallbackTable::empty()));
        let laser = resolve_one(&resolver, "dup-services-laser-3").await.unwrap().found().unwrap();
        assert_eq!(laser.asset.public_id, "img1");
        assert_eq!(laser.source, ResolutionSource::Linked);
    }

    #[tokio::test]
    async fn test_sync_then_fix_duplicates_preserves_links() {
        let dir = TempDir::new().unwrap();
        let manifest = write_manifest(&dir);
        let store = Arc::new(SqliteStore::open(&dir.path().join("media.db")).await.unwrap());

        let synced = sync(store.as_ref(), &manifest).await.unwrap();
        assert_eq!(synced.inserted, 3);
        assert_eq!(synced.duplicate_ids, vec!["dup".to_string()]);

        store.put_link(&PlaceholderAssetLink::new("dup", "img1")).await.unwrap();

        let summary = fix_duplicates(store.as_ref()).await.unwrap();
        assert_eq!(summary.scanned, 3);
        assert_eq!(summary.applied.len(), 2);
        assert!(summary.is_complete());

        let resolver = Resolver::new(store.clone(), Arc::new(FallbackTable::empty()));
        for id in ["dup", "dup-services-injectables-2", "dup-services-laser-3"] {
            let resolved = resolve_one(&resolver, id).await.unwrap().found().unwrap();
            assert_eq!(resolved.asset.public_id, "img1");
            assert_eq!(resolved.source, ResolutionSource::Linked);
        }

        let second = fix_duplicates(store.as_ref()).await.unwrap();
        assert!(second.applied.is_empty());
        assert!(second.failed.is_empty());
    }

    #[tokio::test]
    async fn test_fix_duplicates_continues_past_failed_rename() {
        let dir = TempDir::new().unwrap();
        let manifest = write_manifest(&dir);
        let store = FlakyStore::new();
        sync(&store, &manifest).await.unwrap();
        store.fail_rename_to("dup-services-injectables-2");

        let summary = fix_duplicates(&store).await.unwrap();
        assert_eq!(summary.applied.len(), 1);
        assert_eq!(summary.applied[0].new_id, "dup-services-laser-3");
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].rename.new_id, "dup-services-injectables-2");
        assert!(!summary.is_complete());

        // Strictly fewer duplicates remain
        let remaining = ids(&store).await;
        assert_eq!(remaining.iter().filter(|id| *id == "dup").count(), 2);
    }

    #[tokio::test]
    async fn test_fix_duplicates_surfaces_unavailable_store() {
        let store = FlakyStore::new();
        store.fail_everything(true);
        let err = fix_duplicates(&store).await.unwrap_err();
        assert!(err.is_store_failure());
    }
}
