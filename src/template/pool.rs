//! Template pools and override resolution.

use std::collections::HashMap;

use rand::seq::IndexedRandom;
use rand::Rng;

use super::defaults::default_pool;
use super::store::TemplateStore;
use super::types::{StoreResult, TemplateEntry, TemplateScope};
use super::unwrap::unwrap_stored_body;

/// Insertion-ordered set of keyed template variants
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplatePool {
    entries: Vec<(String, TemplateEntry)>,
}

/// Category name -> pool, as loaded from the store
pub type TemplateOverrides = HashMap<String, TemplatePool>;

impl TemplatePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a variant. A replaced variant keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, entry: TemplateEntry) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((key, entry)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&TemplateEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, entry)| entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    pub fn first(&self) -> Option<&TemplateEntry> {
        self.entries.first().map(|(_, entry)| entry)
    }

    /// Uniform random pick. Never fails: an empty pool yields an empty entry.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> TemplateEntry {
        self.entries
            .choose(rng)
            .map(|(_, entry)| entry.clone())
            .unwrap_or_else(|| TemplateEntry::new(""))
    }
}

fn lookup_variants(category: &str) -> Vec<String> {
    let lowered = category.to_lowercase();
    let stripped = lowered.replace("_dict", "");
    let mut variants = vec![
        category.to_string(),
        lowered.clone(),
        format!("{}_dict", lowered),
        stripped,
    ];
    variants.dedup();
    variants
}

/// Effective pool for a category.
///
/// Non-empty overrides win, matched under several spellings of the category
/// (exact, lowercased, with `_dict`, without `_dict`). Otherwise the built-in
/// pool is used, or an empty pool if none exists.
pub fn resolve_pool<'a>(category: &str, overrides: &'a TemplateOverrides) -> &'a TemplatePool {
    for candidate in lookup_variants(category) {
        if let Some(pool) = overrides.get(&candidate).filter(|p| !p.is_empty()) {
            return pool;
        }
    }

    match default_pool(category) {
        Some(pool) => pool,
        None => {
            tracing::debug!(category = %category, "No template pool for category");
            empty_pool()
        }
    }
}

fn empty_pool() -> &'static TemplatePool {
    static EMPTY: TemplatePool = TemplatePool {
        entries: Vec::new(),
    };
    &EMPTY
}

/// Assemble overrides from the store: global rows first, then rows owned by
/// `owner`, which replace global variants with the same (category, key).
pub async fn load_overrides(
    store: &dyn TemplateStore,
    owner: Option<&str>,
) -> StoreResult<TemplateOverrides> {
    let mut rows = store.list(Some(&TemplateScope::Global), None).await?;
    if let Some(owner) = owner.filter(|o| !o.trim().is_empty()) {
        rows.extend(store.list(Some(&TemplateScope::owner(owner)), None).await?);
    }

    let mut overrides = TemplateOverrides::new();
    for row in rows {
        let mut entry = unwrap_stored_body(&row.content);
        if entry.reply_relay.is_none() {
            entry.reply_relay = row.reply_relay.clone();
        }
        overrides
            .entry(row.category.clone())
            .or_default()
            .insert(row.key.clone(), entry);
    }

    tracing::debug!(
        categories = overrides.len(),
        owner = owner.unwrap_or("-"),
        "Loaded template overrides"
    );
    Ok(overrides)
}
