//! Placeholder discovery manifest and the generated placeholder map.
//!
//! The page scanner writes a manifest of every media slot it found, grouped
//! by page and section. Loading flattens it in document order, which is the
//! order the consistency pass treats as "first encountered".

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, Result};
use crate::media::{validate_id, Area, DedupeReport, Dimensions, LogicalPlaceholder, Rename};

#[derive(Debug, Deserialize)]
struct ManifestPlaceholder {
    id: String,
    area: String,
    #[serde(default)]
    dimensions: Option<Dimensions>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ManifestSection {
    name: String,
    #[serde(default)]
    placeholders: Vec<ManifestPlaceholder>,
}

#[derive(Debug, Deserialize)]
struct ManifestPage {
    name: String,
    #[serde(default)]
    sections: Vec<ManifestSection>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    pages: Vec<ManifestPage>,
}

/// Flattened scanner output
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaceholderManifest {
    pub placeholders: Vec<LogicalPlaceholder>,
}

impl PlaceholderManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            MediaError::Manifest(msg) => {
                MediaError::Manifest(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawManifest =
            serde_json::from_str(content).map_err(|e| MediaError::Manifest(e.to_string()))?;

        let mut placeholders = Vec::new();
        for page in raw.pages {
            for section in page.sections {
                for entry in section.placeholders {
                    validate_id("placeholder id", &entry.id)
                        .map_err(|e| MediaError::Manifest(e.to_string()))?;
                    // Unknown areas fail fast as configuration errors
                    let area = Area::from_str(&entry.area)?;
                    placeholders.push(LogicalPlaceholder {
                        id: entry.id,
                        area,
                        page: page.name.clone(),
                        section: section.name.clone(),
                        dimensions: entry.dimensions,
                        description: entry.description,
                    });
                }
            }
        }

        Ok(Self { placeholders })
    }

    pub fn len(&self) -> usize {
        self.placeholders.len()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlaceholderMapEntry {
    pub id: String,
    pub area: Area,
    pub page: String,
    pub section: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where an upload for this slot should land on the CDN
    pub suggested_public_id: String,
}

impl From<&LogicalPlaceholder> for PlaceholderMapEntry {
    fn from(p: &LogicalPlaceholder) -> Self {
        Self {
            id: p.id.clone(),
            area: p.area,
            page: p.page.clone(),
            section: p.section.clone(),
            dimensions: p.dimensions.clone(),
            description: p.description.clone(),
            suggested_public_id: p.area.placement().public_id_for(&p.id),
        }
    }
}

/// Generated map of every placeholder after duplicate repair
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlaceholderMap {
    pub placeholders: Vec<PlaceholderMapEntry>,
    pub renames: Vec<Rename>,
}

impl PlaceholderMap {
    pub fn from_report(report: &DedupeReport) -> Self {
        Self {
            placeholders: report.placeholders.iter().map(PlaceholderMapEntry::from).collect(),
            renames: report.renamed.clone(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MediaError::Manifest(e.to_string()))?;
        std::fs::write(path, json)?;
        tracing::info!(
            "wrote placeholder map with {} entries to {}",
            self.placeholders.len(),
            path.display()
        );
        Ok(())
    }
}
