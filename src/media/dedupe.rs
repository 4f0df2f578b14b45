//! Duplicate placeholder ID detection and repair.
//!
//! The pass is a pure function over the discovered placeholder list. The
//! first occurrence of an ID keeps it; every later occurrence gets
//! `{id}-{page}-{section}-{ordinal}`, where `ordinal` is its 1-based position
//! within the duplicate group. Generated IDs never collide with any ID present
//! in the input, so first occurrences are always left alone and a second run
//! over the output changes nothing.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::model::LogicalPlaceholder;

/// An ID seen more than once in the discovered set
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DuplicateIdConflict {
    pub id: String,
    pub occurrences: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rename {
    /// Index of the renamed placeholder in the input list
    pub position: usize,
    pub old_id: String,
    pub new_id: String,
    pub page: String,
    pub section: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DedupeReport {
    /// Every placeholder, input order preserved, renames applied
    pub placeholders: Vec<LogicalPlaceholder>,
    pub renamed: Vec<Rename>,
    pub conflicts: Vec<DuplicateIdConflict>,
}

impl DedupeReport {
    #[cfg(test)]
    pub fn is_clean(&self) -> bool {
        self.renamed.is_empty()
    }

    /// Placeholders whose ID was left untouched
    pub fn unchanged(&self) -> impl Iterator<Item = &LogicalPlaceholder> {
        let renamed: HashSet<usize> = self.renamed.iter().map(|r| r.position).collect();
        self.placeholders
            .iter()
            .enumerate()
            .filter(move |(i, _)| !renamed.contains(i))
            .map(|(_, p)| p)
    }
}

/// Lowercase, `-`-separated form of a page or section name
fn slug(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

fn candidate(placeholder: &LogicalPlaceholder, ordinal: usize) -> String {
    let mut parts = vec![placeholder.id.clone()];
    for part in [slug(&placeholder.page), slug(&placeholder.section)] {
        if !part.is_empty() {
            parts.push(part);
        }
    }
    parts.push(ordinal.to_string());
    parts.join("-")
}

/// Detect duplicate IDs and rename every occurrence after the first.
pub fn dedupe(placeholders: Vec<LogicalPlaceholder>) -> DedupeReport {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for p in &placeholders {
        *counts.entry(p.id.as_str()).or_default() += 1;
    }

    let mut conflicts: Vec<DuplicateIdConflict> = Vec::new();
    let mut reported: HashSet<&str> = HashSet::new();
    for p in &placeholders {
        let occurrences = counts[p.id.as_str()];
        if occurrences > 1 && reported.insert(p.id.as_str()) {
            conflicts.push(DuplicateIdConflict {
                id: p.id.clone(),
                occurrences,
            });
        }
    }

    if conflicts.is_empty() {
        return DedupeReport {
            placeholders,
            ..Default::default()
        };
    }

    // Reserve every input ID up front so generated IDs can never shadow one.
    let mut taken: HashSet<String> = placeholders.iter().map(|p| p.id.clone()).collect();
    let mut claimed: HashSet<String> = HashSet::new();
    let mut seen_in_group: HashMap<String, usize> = HashMap::new();
    let mut renamed = Vec::new();
    let mut output = Vec::with_capacity(placeholders.len());

    for (position, mut placeholder) in placeholders.into_iter().enumerate() {
        let ordinal = {
            let seen = seen_in_group.entry(placeholder.id.clone()).or_default();
            *seen += 1;
            *seen
        };

        if claimed.insert(placeholder.id.clone()) {
            output.push(placeholder);
            continue;
        }

        let mut attempt = ordinal;
        let mut new_id = candidate(&placeholder, attempt);
        while taken.contains(&new_id) {
            attempt += 1;
            new_id = candidate(&placeholder, attempt);
        }
        taken.insert(new_id.clone());

        tracing::debug!(
            "renaming duplicate {} on {}/{} to {}",
            placeholder.id,
            placeholder.page,
            placeholder.section,
            new_id
        );
        renamed.push(Rename {
            position,
            old_id: placeholder.id.clone(),
            new_id: new_id.clone(),
            page: placeholder.page.clone(),
            section: placeholder.section.clone(),
        });
        placeholder.id = new_id;
        output.push(placeholder);
    }

    for conflict in &conflicts {
        tracing::warn!(
            "duplicate placeholder id {} ({} occurrences)",
            conflict.id,
            conflict.occurrences
        );
    }

    DedupeReport {
        placeholders: output,
        renamed,
        conflicts,
    }
}
