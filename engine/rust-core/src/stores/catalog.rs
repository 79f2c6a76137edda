use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::RwLock;

use crate::error::CatalogError;
use crate::models::{ContentItem, ItemFlags, Tier};

/// Read-only paradox catalog plus the learner's per-item flags.
pub struct CatalogRepository {
    items: Vec<ContentItem>,
    index: HashMap<String, usize>,
    flags: RwLock<HashMap<String, ItemFlags>>,
}

impl CatalogRepository {
    pub fn new(items: Vec<ContentItem>) -> Result<Self, CatalogError> {
        if items.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(items.len());
        let mut flags = HashMap::new();
        for (position, item) in items.iter().enumerate() {
            if index.insert(item.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(item.id.clone()));
            }
            if item.is_favorite || item.is_learned {
                flags.insert(
                    item.id.clone(),
                    ItemFlags {
                        is_favorite: item.is_favorite,
                        is_learned: item.is_learned,
                    },
                );
            }
        }

        tracing::info!("Catalog loaded with {} items", items.len());

        Ok(Self {
            items,
            index,
            flags: RwLock::new(flags),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let items: Vec<ContentItem> = serde_json::from_str(json)?;
        Self::new(items)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        tracing::debug!("Loading catalog from {}", path.display());
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Catalog content in file order. Learner flags are not applied.
    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn content(&self, id: &str) -> Option<&ContentItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    /// Item with the learner's flags attached.
    pub fn get(&self, id: &str) -> Option<ContentItem> {
        let item = self.content(id)?;
        Some(item.clone().with_flags(self.flags_for(id)))
    }

    pub fn by_tier(&self, tier: Tier) -> Vec<&ContentItem> {
        self.items.iter().filter(|item| item.tier == tier).collect()
    }

    pub fn tiers(&self) -> BTreeSet<Tier> {
        self.items.iter().map(|item| item.tier).collect()
    }

    pub fn flags_for(&self, id: &str) -> ItemFlags {
        self.read_flags().get(id).copied().unwrap_or_default()
    }

    /// Flips the favorite flag and returns the new value.
    pub fn toggle_favorite(&self, id: &str) -> Result<bool, CatalogError> {
        self.update_flags(id, |flags| {
            flags.is_favorite = !flags.is_favorite;
            flags.is_favorite
        })
    }

    pub fn set_learned(&self, id: &str, learned: bool) -> Result<(), CatalogError> {
        self.update_flags(id, |flags| flags.is_learned = learned)
    }

    pub fn favorites(&self) -> Vec<ContentItem> {
        self.filter_by_flags(|flags| flags.is_favorite)
    }

    pub fn learned(&self) -> Vec<ContentItem> {
        self.filter_by_flags(|flags| flags.is_learned)
    }

    /// Snapshot of all non-default flags, for the host to persist.
    pub fn export_flags(&self) -> HashMap<String, ItemFlags> {
        self.read_flags().clone()
    }

    /// Restores previously exported flags. Ids missing from the catalog are skipped.
    pub fn import_flags(&self, flags: HashMap<String, ItemFlags>) {
        let mut guard = self
            .flags
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for (id, item_flags) in flags {
            if self.index.contains_key(&id) {
                guard.insert(id, item_flags);
            } else {
                tracing::warn!("Skipping flags for unknown catalog item {}", id);
            }
        }
    }

    fn update_flags<T>(
        &self,
        id: &str,
        apply: impl FnOnce(&mut ItemFlags) -> T,
    ) -> Result<T, CatalogError> {
        if !self.index.contains_key(id) {
            return Err(CatalogError::UnknownItem(id.to_string()));
        }
        let mut guard = self
            .flags
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = guard.entry(id.to_string()).or_default();
        Ok(apply(entry))
    }

    fn filter_by_flags(&self, keep: impl Fn(&ItemFlags) -> bool) -> Vec<ContentItem> {
        let flags = self.read_flags();
        self.items
            .iter()
            .filter_map(|item| {
                let item_flags = flags.get(&item.id).copied().unwrap_or_default();
                keep(&item_flags).then(|| item.clone().with_flags(item_flags))
            })
            .collect()
    }

    fn read_flags(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, ItemFlags>> {
        self.flags
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
