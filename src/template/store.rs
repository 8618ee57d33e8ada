//! Template store adapter.
//!
//! The engine reads templates and settings through [`TemplateStore`] so the
//! persistence backend can be swapped. [`MemoryTemplateStore`] is the bundled
//! implementation, used by tests and single-process deployments.
//!
//! # Thread Safety
//!
//! Implementations must be `Send + Sync`; every call is independently atomic
//! and no operation spans multiple rows transactionally.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::types::{
    validate_content, validate_name, StoreResult, Template, TemplateError, TemplateScope,
};

/// Row identity: (scope, category, key)
type TemplateId = (TemplateScope, String, String);

#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Fetch one template
    async fn get(
        &self,
        scope: &TemplateScope,
        category: &str,
        key: &str,
    ) -> StoreResult<Option<Template>>;

    /// List templates ordered by (category, key). `None` scope lists every scope.
    async fn list(
        &self,
        scope: Option<&TemplateScope>,
        category: Option<&str>,
    ) -> StoreResult<Vec<Template>>;

    /// Insert a new template; fails with `AlreadyExists` on a duplicate id
    async fn create(&self, template: Template) -> StoreResult<Template>;

    /// Replace body and relay hint. Returns whether a row changed.
    async fn update(
        &self,
        scope: &TemplateScope,
        category: &str,
        key: &str,
        content: &str,
        reply_relay: Option<&str>,
    ) -> StoreResult<bool>;

    /// Returns whether a row was removed
    async fn delete(&self, scope: &TemplateScope, category: &str, key: &str)
        -> StoreResult<bool>;

    /// Remove a whole category, returning the number of rows removed
    async fn delete_category(&self, scope: &TemplateScope, category: &str) -> StoreResult<usize>;

    /// Move every row of `from` to `to`, returning the number of rows moved
    async fn rename_category(
        &self,
        scope: &TemplateScope,
        from: &str,
        to: &str,
    ) -> StoreResult<usize>;

    async fn get_setting(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set_setting(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Per-owner settings (stored signing keys and the like)
    async fn get_owner_setting(&self, owner: &str, key: &str) -> StoreResult<Option<String>>;

    async fn set_owner_setting(&self, owner: &str, key: &str, value: &str) -> StoreResult<()>;

    async fn delete_owner_setting(&self, owner: &str, key: &str) -> StoreResult<bool>;
}

/// In-memory template storage
pub struct MemoryTemplateStore {
    templates: DashMap<TemplateId, Template>,
    settings: DashMap<String, String>,
    owner_settings: DashMap<(String, String), String>,
}

impl Default for MemoryTemplateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self {
            templates: DashMap::new(),
            settings: DashMap::new(),
            owner_settings: DashMap::new(),
        }
    }

    /// Get the number of templates across all scopes
    pub fn count(&self) -> usize {
        self.templates.len()
    }

    fn id(scope: &TemplateScope, category: &str, key: &str) -> TemplateId {
        (scope.clone(), category.to_string(), key.to_string())
    }
}

#[async_trait]
impl TemplateStore for MemoryTemplateStore {
    async fn get(
        &self,
        scope: &TemplateScope,
        category: &str,
        key: &str,
    ) -> StoreResult<Option<Template>> {
        Ok(self
            .templates
            .get(&Self::id(scope, category, key))
            .map(|entry| entry.value().clone()))
    }

    async fn list(
        &self,
        scope: Option<&TemplateScope>,
        category: Option<&str>,
    ) -> StoreResult<Vec<Template>> {
        let mut rows: Vec<Template> = self
            .templates
            .iter()
            .filter(|entry| scope.map_or(true, |s| &entry.value().scope == s))
            .filter(|entry| category.map_or(true, |c| entry.value().category == c))
            .map(|entry| entry.value().clone())
            .collect();

        rows.sort_by(|a, b| {
            (&a.category, &a.key, &a.scope).cmp(&(&b.category, &b.key, &b.scope))
        });
        Ok(rows)
    }

    async fn create(&self, template: Template) -> StoreResult<Template> {
        template.validate()?;

        let id = Self::id(&template.scope, &template.category, &template.key);
        match self.templates.entry(id) {
            Entry::Occupied(_) => Err(TemplateError::AlreadyExists {
                category: template.category,
                key: template.key,
            }
            .into()),
            Entry::Vacant(slot) => {
                slot.insert(template.clone());
                Ok(template)
            }
        }
    }

    async fn update(
        &self,
        scope: &TemplateScope,
        category: &str,
        key: &str,
        content: &str,
        reply_relay: Option<&str>,
    ) -> StoreResult<bool> {
        validate_name("category", category)?;
        validate_name("key", key)?;
        validate_content(content)?;

        match self.templates.get_mut(&Self::id(scope, category, key)) {
            Some(mut entry) => {
                let template = entry.value_mut();
                template.content = content.to_string();
                template.reply_relay = reply_relay
                    .map(str::trim)
                    .filter(|relay| !relay.is_empty())
                    .map(str::to_string);
                template.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(
        &self,
        scope: &TemplateScope,
        category: &str,
        key: &str,
    ) -> StoreResult<bool> {
        Ok(self
            .templates
            .remove(&Self::id(scope, category, key))
            .is_some())
    }

    async fn delete_category(&self, scope: &TemplateScope, category: &str) -> StoreResult<usize> {
        let before = self.templates.len();
        self.templates
            .retain(|(row_scope, row_category, _), _| !(row_scope == scope && row_category == category));
        Ok(before - self.templates.len())
    }

    async fn rename_category(
        &self,
        scope: &TemplateScope,
        from: &str,
        to: &str,
    ) -> StoreResult<usize> {
        super::types::validate_name("category", to)?;
        if from == to {
            return Ok(0);
        }

        let ids: Vec<TemplateId> = self
            .templates
            .iter()
            .filter(|entry| &entry.key().0 == scope && entry.key().1 == from)
            .map(|entry| entry.key().clone())
            .collect();

        // Refuse a rename that would collide with rows already in the target category
        for (_, _, key) in &ids {
            if self.templates.contains_key(&Self::id(scope, to, key)) {
                return Err(TemplateError::AlreadyExists {
                    category: to.to_string(),
                    key: key.clone(),
                }
                .into());
            }
        }

        let now = Utc::now();
        let mut moved = 0;
        for id in ids {
            if let Some((_, mut template)) = self.templates.remove(&id) {
                template.category = to.to_string();
                template.updated_at = now;
                self.templates
                    .insert(Self::id(scope, to, &template.key), template);
                moved += 1;
            }
        }
        Ok(moved)
    }

    async fn get_setting(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.settings.get(key).map(|v| v.value().clone()))
    }

    async fn set_setting(&self, key: &str, value: &str) -> StoreResult<()> {
        self.settings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_owner_setting(&self, owner: &str, key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .owner_settings
            .get(&(owner.to_string(), key.to_string()))
            .map(|v| v.value().clone()))
    }

    async fn set_owner_setting(&self, owner: &str, key: &str, value: &str) -> StoreResult<()> {
        self.owner_settings
            .insert((owner.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn delete_owner_setting(&self, owner: &str, key: &str) -> StoreResult<bool> {
        Ok(self
            .owner_settings
            .remove(&(owner.to_string(), key.to_string()))
            .is_some())
    }
}

/// Create an Arc-wrapped in-memory template store
pub fn create_template_store() -> Arc<dyn TemplateStore> {
    tracing::info!(backend = "memory", "Creating in-memory template store");
    Arc::new(MemoryTemplateStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::StoreError;

    fn global(category: &str, key: &str, content: &str) -> Template {
        Template::new(TemplateScope::Global, category, key, content)
    }

    #[tokio::test]
    async fn test_store_create_and_get() {
        let store = MemoryTemplateStore::new();
        store
            .create(global("cyber_herd_join", "0", "Hi {name}"))
            .await
            .unwrap();

        let fetched = store
            .get(&TemplateScope::Global, "cyber_herd_join", "0")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.content, "Hi {name}");
        assert!(store
            .get(&TemplateScope::owner("u1"), "cyber_herd_join", "0")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_store_create_duplicate() {
        let store = MemoryTemplateStore::new();
        store.create(global("variations", "0", "a")).await.unwrap();

        let err = store.create(global("variations", "0", "b")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Template(TemplateError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_store_rejects_invalid() {
        let store = MemoryTemplateStore::new();
        let err = store.create(global("", "0", "a")).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Template(TemplateError::InvalidKey(_))
        ));
    }

    #[tokio::test]
    async fn test_store_update_and_delete() {
        let store = MemoryTemplateStore::new();
        let scope = TemplateScope::owner("u1");
        store
            .create(Template::new(scope.clone(), "daily_reset", "0", "old"))
            .await
            .unwrap();

        assert!(store
            .update(&scope, "daily_reset", "0", "new", Some("wss://nos.lol"))
            .await
            .unwrap());
        assert!(!store
            .update(&scope, "daily_reset", "9", "new", None)
            .await
            .unwrap());

        let row = store.get(&scope, "daily_reset", "0").await.unwrap().unwrap();
        assert_eq!(row.content, "new");
        assert_eq!(row.reply_relay.as_deref(), Some("wss://nos.lol"));

        assert!(store.delete(&scope, "daily_reset", "0").await.unwrap());
        assert!(!store.delete(&scope, "daily_reset", "0").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_list_ordering_and_filters() {
        let store = MemoryTemplateStore::new();
        store.create(global("variations", "1", "b")).await.unwrap();
        store.create(global("daily_reset", "0", "c")).await.unwrap();
        store.create(global("variations", "0", "a")).await.unwrap();
        store
            .create(Template::new(TemplateScope::owner("u1"), "variations", "0", "o"))
            .await
            .unwrap();

        let globals = store.list(Some(&TemplateScope::Global), None).await.unwrap();
        let ids: Vec<(&str, &str)> = globals
            .iter()
            .map(|t| (t.category.as_str(), t.key.as_str()))
            .collect();
        assert_eq!(
            ids,
            vec![("daily_reset", "0"), ("variations", "0"), ("variations", "1")]
        );

        let all_variations = store.list(None, Some("variations")).await.unwrap();
        assert_eq!(all_variations.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_and_rename_category() {
        let store = MemoryTemplateStore::new();
        let scope = TemplateScope::owner("u1");
        for key in ["0", "1", "2"] {
            store
                .create(Template::new(scope.clone(), "old_pool", key, "x"))
                .await
                .unwrap();
        }
        store.create(global("old_pool", "0", "g")).await.unwrap();

        assert_eq!(
            store.rename_category(&scope, "old_pool", "new_pool").await.unwrap(),
            3
        );
        assert!(store.get(&scope, "new_pool", "1").await.unwrap().is_some());
        assert!(store
            .get(&TemplateScope::Global, "old_pool", "0")
            .await
            .unwrap()
            .is_some());

        assert_eq!(store.delete_category(&scope, "new_pool").await.unwrap(), 3);
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_rename_collision_rejected() {
        let store = MemoryTemplateStore::new();
        store.create(global("a", "0", "x")).await.unwrap();
        store.create(global("b", "0", "y")).await.unwrap();

        assert!(store
            .rename_category(&TemplateScope::Global, "a", "b")
            .await
            .is_err());
        assert_eq!(store.count(), 2);
    }

    #[tokio::test]
    async fn test_settings() {
        let store = MemoryTemplateStore::new();
        assert!(store.get_setting("nostr_publishing_enabled").await.unwrap().is_none());
        store.set_setting("nostr_publishing_enabled", "1").await.unwrap();
        assert_eq!(
            store.get_setting("nostr_publishing_enabled").await.unwrap().as_deref(),
            Some("1")
        );

        store.set_owner_setting("u1", "nostr_private_key", "k").await.unwrap();
        assert_eq!(
            store.get_owner_setting("u1", "nostr_private_key").await.unwrap().as_deref(),
            Some("k")
        );
        assert!(store.get_owner_setting("u2", "nostr_private_key").await.unwrap().is_none());
        assert!(store.delete_owner_setting("u1", "nostr_private_key").await.unwrap());
        assert!(!store.delete_owner_setting("u1", "nostr_private_key").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_enforces_create_rules() {
        let store = MemoryTemplateStore::new();
        store.create(global("greetings", "0", "Hello")).await.unwrap();

        let oversized = "x".repeat(16 * 1024 + 1);
        let result = store
            .update(&TemplateScope::Global, "greetings", "0", &oversized, None)
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Template(TemplateError::InvalidTemplate(_)))
        ));

        let result = store
            .update(&TemplateScope::Global, "bad/cat", "0", "x", None)
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Template(TemplateError::InvalidKey(_)))
        ));

        let stored = store
            .get(&TemplateScope::Global, "greetings", "0")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.content, "Hello");
    }
}
