//! Provider backed by a static taxonomy, typically loaded from a JSON file.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::domain::{ParentRef, TaxonomyRecord, PATH_DELIMITER};
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::{ProviderError, TaxonomyProvider};

/// One entry of a taxonomy file. `path` and `child_count` are derived.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaxonomyEntry {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub share_title: Option<String>,
}

impl TaxonomyEntry {
    pub fn new(id: impl Into<String>, text: impl Into<String>, parent: Option<&str>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            parent: parent.map(str::to_string),
            share_title: None,
        }
    }
}

/// In-memory taxonomy answering children queries in file order.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    top_level: Vec<TaxonomyRecord>,
    children: HashMap<String, Vec<TaxonomyRecord>>,
}

impl StaticProvider {
    /// Build the provider, computing paths and child counts.
    ///
    /// Fails on duplicate ids, unknown parents and parent cycles.
    pub fn from_entries(entries: Vec<TaxonomyEntry>) -> InfraResult<Self> {
        let mut parents: HashMap<&str, Option<&str>> = HashMap::new();
        for entry in &entries {
            if entry.id.is_empty() || entry.id.contains(PATH_DELIMITER) {
                return Err(InfraError::invalid(format!("invalid id: {:?}", entry.id)));
            }
            if parents.insert(&entry.id, entry.parent.as_deref()).is_some() {
                return Err(InfraError::invalid(format!("duplicate id: {}", entry.id)));
            }
        }

        let mut child_counts: HashMap<&str, usize> = HashMap::new();
        for entry in &entries {
            if let Some(parent) = entry.parent.as_deref() {
                if !parents.contains_key(parent) {
                    return Err(InfraError::invalid(format!(
                        "unknown parent {} of {}",
                        parent, entry.id
                    )));
                }
                *child_counts.entry(parent).or_default() += 1;
            }
        }

        let mut provider = Self::default();
        for entry in &entries {
            let record = TaxonomyRecord {
                id: entry.id.clone(),
                text: entry.text.clone(),
                child_count: child_counts.get(entry.id.as_str()).copied().unwrap_or(0),
                share_title: entry.share_title.clone(),
                path: path_of(&entry.id, &parents)?,
            };
            match &entry.parent {
                Some(parent) => provider
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .push(record),
                None => provider.top_level.push(record),
            }
        }
        debug!(
            "static provider: {} entries, {} top-level",
            entries.len(),
            provider.top_level.len()
        );
        Ok(provider)
    }

    pub fn from_json_str(content: &str, origin: &Path) -> InfraResult<Self> {
        let entries: Vec<TaxonomyEntry> =
            serde_json::from_str(content).map_err(|source| InfraError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;
        Self::from_entries(entries)
    }

    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> InfraResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| InfraError::io(format!("read taxonomy {}", path.display()), e))?;
        Self::from_json_str(&content, path)
    }

    fn knows(&self, id: &str) -> bool {
        self.children.contains_key(id)
            || self
                .top_level
                .iter()
                .chain(self.children.values().flatten())
                .any(|record| record.id == id)
    }
}

/// Walk up the parent chain of `id` and build `|root|...|id`.
fn path_of(id: &str, parents: &HashMap<&str, Option<&str>>) -> InfraResult<String> {
    let mut chain = vec![id];
    let mut visited: HashSet<&str> = HashSet::from([id]);
    let mut current = parents.get(id).copied().flatten();
    while let Some(parent) = current {
        if !visited.insert(parent) {
            return Err(InfraError::invalid(format!("cycle detected at {}", parent)));
        }
        chain.push(parent);
        current = parents.get(parent).copied().flatten();
    }
    Ok(chain
        .iter()
        .rev()
        .map(|segment| format!("{PATH_DELIMITER}{segment}"))
        .collect())
}

#[async_trait]
impl TaxonomyProvider for StaticProvider {
    async fn query_children(
        &self,
        parent: &ParentRef,
        page_size: usize,
    ) -> Result<Vec<TaxonomyRecord>, ProviderError> {
        let page: &[TaxonomyRecord] = match parent {
            ParentRef::Root => &self.top_level[..],
            ParentRef::Id(id) => match self.children.get(id) {
                Some(children) => &children[..],
                None if self.knows(id) => &[],
                None => return Err(ProviderError::UnknownParent(id.clone())),
            },
        };
        Ok(page.iter().take(page_size).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_and_child_counts_are_derived() {
        let provider = StaticProvider::from_entries(vec![
            TaxonomyEntry::new("A", "Arts", None),
            TaxonomyEntry::new("B", "Brushes", Some("A")),
            TaxonomyEntry::new("C", "Color", Some("B")),
        ])
        .unwrap();

        assert_eq!(provider.top_level[0].path, "|A");
        assert_eq!(provider.top_level[0].child_count, 1);
        assert_eq!(provider.children["B"][0].path, "|A|B|C");
        assert_eq!(provider.children["B"][0].child_count, 0);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let result = StaticProvider::from_entries(vec![
            TaxonomyEntry::new("A", "A", Some("B")),
            TaxonomyEntry::new("B", "B", Some("A")),
        ]);
        assert!(matches!(result, Err(InfraError::InvalidTaxonomy { .. })));
    }
}
