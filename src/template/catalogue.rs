//! Catalogue management on top of a [`TemplateStore`].

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;

use super::defaults::{default_categories, default_pool};
use super::store::TemplateStore;
use super::types::{StoreResult, Template, TemplateError, TemplateScope};
use super::unwrap::unwrap_stored_body;

/// `{category: {key: content}}`
pub type TemplateExport = BTreeMap<String, BTreeMap<String, String>>;

/// Outcome of a bulk import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub categories: Vec<String>,
}

/// Seed every built-in (category, key) missing from `scope`.
///
/// Returns the number of rows created. Existing rows are never touched.
pub async fn import_defaults(store: &dyn TemplateStore, scope: &TemplateScope) -> StoreResult<usize> {
    let mut created = 0;
    for category in default_categories() {
        let Some(pool) = default_pool(category) else {
            continue;
        };
        for (key, entry) in pool.iter() {
            if store.get(scope, category, key).await?.is_some() {
                continue;
            }
            let template = Template::new(scope.clone(), category, key, entry.content.clone())
                .with_reply_relay(entry.reply_relay.clone());
            store.create(template).await?;
            created += 1;
        }
    }

    tracing::info!(scope = %scope, created, "Imported default templates");
    Ok(created)
}

/// Distinct category names: numeric names first in numeric order, then the
/// rest alphabetically.
pub async fn list_categories(
    store: &dyn TemplateStore,
    scope: Option<&TemplateScope>,
) -> StoreResult<Vec<String>> {
    let distinct: BTreeSet<String> = store
        .list(scope, None)
        .await?
        .into_iter()
        .map(|t| t.category)
        .collect();

    let (mut numeric, named): (Vec<(f64, String)>, Vec<String>) =
        distinct.into_iter().fold((Vec::new(), Vec::new()), |(mut n, mut s), c| {
            match c.parse::<f64>() {
                Ok(v) if v.is_finite() => n.push((v, c)),
                _ => s.push(c),
            }
            (n, s)
        });
    numeric.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    Ok(numeric.into_iter().map(|(_, c)| c).chain(named).collect())
}

/// Uniform pick among the stored rows of one category.
pub async fn random_template<R: Rng + ?Sized + Send>(
    store: &dyn TemplateStore,
    scope: Option<&TemplateScope>,
    category: &str,
    rng: &mut R,
) -> StoreResult<Template> {
    let rows = store.list(scope, Some(category)).await?;
    rows.choose(rng).cloned().ok_or_else(|| {
        TemplateError::NotFound {
            category: category.to_string(),
            key: "*".to_string(),
        }
        .into()
    })
}

/// Every template of `scope` as `{category: {key: content}}`.
pub async fn export_templates(
    store: &dyn TemplateStore,
    scope: &TemplateScope,
) -> StoreResult<TemplateExport> {
    let mut export = TemplateExport::new();
    for template in store.list(Some(scope), None).await? {
        export
            .entry(template.category)
            .or_default()
            .insert(template.key, template.content);
    }
    Ok(export)
}

/// Create or update rows from a `{category: {key: content}}` document.
///
/// Every row is validated before the first write, so a document with a bad
/// shape, name or body leaves the store untouched.
pub async fn import_templates(
    store: &dyn TemplateStore,
    scope: &TemplateScope,
    document: &serde_json::Value,
) -> StoreResult<ImportSummary> {
    let mapping = normalize_document(document).ok_or_else(|| {
        TemplateError::InvalidTemplate(
            "expected {category: {key: content}} with string contents".to_string(),
        )
    })?;

    let mut rows = Vec::new();
    for (category, entries) in &mapping {
        for (key, content) in entries {
            let template =
                Template::new(scope.clone(), category.as_str(), key.as_str(), content.as_str());
            template.validate()?;
            rows.push(template);
        }
    }

    let mut summary = ImportSummary::default();
    for template in rows {
        if store
            .update(scope, &template.category, &template.key, &template.content, None)
            .await?
        {
            summary.updated += 1;
        } else {
            store.create(template).await?;
            summary.created += 1;
        }
    }
    summary.categories = mapping.into_keys().collect();

    tracing::info!(
        scope = %scope,
        created = summary.created,
        updated = summary.updated,
        "Imported templates"
    );
    Ok(summary)
}

fn normalize_document(document: &serde_json::Value) -> Option<TemplateExport> {
    let mut mapping = TemplateExport::new();
    for (category, inner) in document.as_object()? {
        let mut entries = BTreeMap::new();
        for (key, content) in inner.as_object()? {
            entries.insert(key.clone(), content.as_str()?.to_string());
        }
        mapping.insert(category.clone(), entries);
    }
    (!mapping.is_empty()).then_some(mapping)
}

/// Create a template from a body that may still be a serialized wrapper.
///
/// The wrapper is unwrapped at write time so the row stores plain content
/// and a separate relay hint. An explicit `reply_relay` wins over an
/// embedded one.
pub async fn create_from_body(
    store: &dyn TemplateStore,
    scope: &TemplateScope,
    category: &str,
    key: &str,
    body: &str,
    reply_relay: Option<&str>,
) -> StoreResult<Template> {
    let entry = unwrap_stored_body(body);
    let relay = reply_relay
        .map(str::to_string)
        .filter(|r| !r.trim().is_empty())
        .or(entry.reply_relay);

    let template =
        Template::new(scope.clone(), category, key, entry.content).with_reply_relay(relay);
    store.create(template).await
}
