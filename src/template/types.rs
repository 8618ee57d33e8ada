use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {category}/{key}")]
    NotFound { category: String, key: String },

    #[error("Template already exists: {category}/{key}")]
    AlreadyExists { category: String, key: String },

    #[error("Invalid template key: {0}")]
    InvalidKey(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Store adapter error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Template store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Who a template belongs to. Owner templates override global ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateScope {
    Global,
    Owner(String),
}

impl TemplateScope {
    pub fn owner(id: impl Into<String>) -> Self {
        TemplateScope::Owner(id.into())
    }

    pub fn owner_id(&self) -> Option<&str> {
        match self {
            TemplateScope::Global => None,
            TemplateScope::Owner(id) => Some(id),
        }
    }
}

impl fmt::Display for TemplateScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateScope::Global => write!(f, "global"),
            TemplateScope::Owner(id) => write!(f, "owner:{}", id),
        }
    }
}

/// A stored message template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub scope: TemplateScope,

    /// Pool name, e.g. `cyber_herd_join`
    pub category: String,

    /// Variant key inside the pool
    pub key: String,

    /// Body text; legacy rows may hold a serialized `{content, reply_relay}` wrapper
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_relay: Option<String>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Template {
    pub fn new(
        scope: TemplateScope,
        category: impl Into<String>,
        key: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            scope,
            category: category.into(),
            key: key.into(),
            content: content.into(),
            reply_relay: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_reply_relay(mut self, reply_relay: Option<String>) -> Self {
        self.reply_relay = reply_relay.filter(|relay| !relay.trim().is_empty());
        self
    }

    /// Validate the template
    pub fn validate(&self) -> TemplateResult<()> {
        validate_name("category", &self.category)?;
        validate_name("key", &self.key)?;

        if let TemplateScope::Owner(id) = &self.scope {
            if id.trim().is_empty() {
                return Err(TemplateError::InvalidTemplate(
                    "Owner id must not be empty".to_string(),
                ));
            }
        }

        validate_content(&self.content)
    }
}

const MAX_NAME_LEN: usize = 64;
const MAX_CONTENT_LEN: usize = 16 * 1024;

/// Category and key names: 1-64 characters of alphanumerics, `_`, `-` or `.`
pub(crate) fn validate_name(field: &str, value: &str) -> TemplateResult<()> {
    if value.is_empty() || value.chars().count() > MAX_NAME_LEN {
        return Err(TemplateError::InvalidKey(format!(
            "{} must be 1-{} characters",
            field, MAX_NAME_LEN
        )));
    }

    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(TemplateError::InvalidKey(format!(
            "{} must contain only alphanumeric, underscore, dash or dot",
            field
        )));
    }

    Ok(())
}

pub(crate) fn validate_content(content: &str) -> TemplateResult<()> {
    if content.len() > MAX_CONTENT_LEN {
        return Err(TemplateError::InvalidTemplate(format!(
            "Content must be at most {} bytes",
            MAX_CONTENT_LEN
        )));
    }
    Ok(())
}

/// One pool variant after unwrapping: body text plus optional relay hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_relay: Option<String>,
}

impl TemplateEntry {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reply_relay: None,
        }
    }

    pub fn with_relay(content: impl Into<String>, reply_relay: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            reply_relay: Some(reply_relay.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_validation_valid() {
        let template = Template::new(TemplateScope::Global, "cyber_herd_join", "0", "Hi {name}");
        assert!(template.validate().is_ok());
    }

    #[test]
    fn test_template_validation_empty_key() {
        let template = Template::new(TemplateScope::Global, "variations", "", "text");
        assert!(matches!(
            template.validate(),
            Err(TemplateError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_template_validation_invalid_category_chars() {
        let template = Template::new(TemplateScope::owner("u1"), "bad/category", "0", "text");
        assert!(matches!(
            template.validate(),
            Err(TemplateError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_template_validation_blank_owner() {
        let template = Template::new(TemplateScope::owner(" "), "variations", "0", "text");
        assert!(matches!(
            template.validate(),
            Err(TemplateError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn test_blank_reply_relay_dropped() {
        let template = Template::new(TemplateScope::Global, "variations", "0", "text")
            .with_reply_relay(Some("  ".to_string()));
        assert!(template.reply_relay.is_none());
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(TemplateScope::Global.to_string(), "global");
        assert_eq!(TemplateScope::owner("abc").to_string(), "owner:abc");
        assert_eq!(TemplateScope::owner("abc").owner_id(), Some("abc"));
    }
}
