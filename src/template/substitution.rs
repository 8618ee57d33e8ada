//! Restricted placeholder substitution.
//!
//! Only bare identifiers (`{name}`) are substituted. Attribute access,
//! indexing, conversions and format specs (`{a.b}`, `{a[0]}`, `{a!r}`,
//! `{a:>5}`) are rejected because context values come from user-controlled
//! display names. `{{` and `}}` produce literal braces. Identifiers with no
//! context entry are left in place verbatim.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::metrics::RenderMetrics;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("placeholder {{{0}}} is not a bare identifier")]
    UnsafePlaceholder(String),

    #[error("unbalanced brace at byte {0}")]
    UnbalancedBrace(usize),
}

/// A primitive context value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Text(String),
    Integer(i64),
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Text(s) => f.write_str(s),
            ContextValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<&String> for ContextValue {
    fn from(value: &String) -> Self {
        ContextValue::Text(value.clone())
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Integer(value)
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        ContextValue::Integer(value.into())
    }
}

impl From<u32> for ContextValue {
    fn from(value: u32) -> Self {
        ContextValue::Integer(value.into())
    }
}

/// Flat placeholder -> value mapping for one render
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderContext {
    values: BTreeMap<String, ContextValue>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ContextValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Build a context from loosely typed JSON.
    ///
    /// Strings and numbers are kept (integral floats become integers, other
    /// numbers their decimal text), booleans become `true`/`false`. Nulls,
    /// arrays and objects never reach the renderer and are skipped.
    pub fn from_json(values: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut context = Self::new();
        for (name, value) in values {
            match value {
                serde_json::Value::String(s) => context.insert(name.clone(), s.clone()),
                serde_json::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        context.insert(name.clone(), i);
                    } else if let Some(f) = n.as_f64().filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15) {
                        context.insert(name.clone(), f as i64);
                    } else {
                        context.insert(name.clone(), n.to_string());
                    }
                }
                serde_json::Value::Bool(b) => context.insert(name.clone(), b.to_string()),
                _ => {}
            }
        }
        context
    }
}

fn is_identifier(field: &str) -> bool {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Substitute bare placeholders from `context`.
pub fn render(template: &str, context: &RenderContext) -> Result<String, RenderError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    out.push('{');
                    continue;
                }

                let start = idx + ch.len_utf8();
                let mut end = None;
                for (j, c) in chars.by_ref() {
                    match c {
                        '}' => {
                            end = Some(j);
                            break;
                        }
                        '{' => {
                            return Err(RenderError::UnsafePlaceholder(
                                template[start..j].to_string(),
                            ))
                        }
                        _ => {}
                    }
                }

                let end = end.ok_or(RenderError::UnbalancedBrace(idx))?;
                let field = &template[start..end];
                if !is_identifier(field) {
                    return Err(RenderError::UnsafePlaceholder(field.to_string()));
                }

                match context.get(field) {
                    Some(value) => out.push_str(&value.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(field);
                        out.push('}');
                    }
                }
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    out.push('}');
                    continue;
                }
                return Err(RenderError::UnbalancedBrace(idx));
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Render, or return the template unmodified when rendering fails.
pub fn render_or_raw(template: &str, context: &RenderContext) -> String {
    match render(template, context) {
        Ok(rendered) => rendered,
        Err(e) => {
            RenderMetrics::record_render_failure();
            tracing::warn!(error = %e, "Template render failed, using raw text");
            template.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_substitute_simple() {
        let ctx = RenderContext::new().with("name", "Alice");
        assert_eq!(render("Hello {name}", &ctx).unwrap(), "Hello Alice");
    }

    #[test]
    fn test_substitute_integer_and_repeat() {
        let ctx = RenderContext::new().with("n", 21i64).with("who", "Nova");
        assert_eq!(
            render("{who} ate {n} sats, {who}!", &ctx).unwrap(),
            "Nova ate 21 sats, Nova!"
        );
    }

    #[test]
    fn test_unknown_placeholder_left_intact() {
        let ctx = RenderContext::new().with("name", "Alice");
        assert_eq!(
            render("{name} needs {difference} sats", &ctx).unwrap(),
            "Alice needs {difference} sats"
        );
    }

    #[test]
    fn test_escaped_braces() {
        let ctx = RenderContext::new().with("x", "1");
        assert_eq!(render("{{x}} is {x}", &ctx).unwrap(), "{x} is 1");
    }

    #[test]
    fn test_attribute_and_index_access_rejected() {
        let ctx = RenderContext::new().with("name", "Alice");
        for template in [
            "{name.__class__}",
            "{name[0]}",
            "{name!r}",
            "{name:>10}",
            "{0}",
            "{}",
            "{ name }",
        ] {
            assert!(
                matches!(render(template, &ctx), Err(RenderError::UnsafePlaceholder(_))),
                "template {:?}",
                template
            );
        }
    }

    #[test]
    fn test_unbalanced_braces() {
        let ctx = RenderContext::new();
        assert_eq!(render("oops {name", &ctx), Err(RenderError::UnbalancedBrace(5)));
        assert_eq!(render("oops }", &ctx), Err(RenderError::UnbalancedBrace(5)));
    }

    #[test]
    fn test_nested_placeholder_rejected() {
        let ctx = RenderContext::new();
        assert!(matches!(
            render("{a{b}}", &ctx),
            Err(RenderError::UnsafePlaceholder(_))
        ));
    }

    #[test]
    fn test_render_or_raw_falls_back() {
        let ctx = RenderContext::new().with("name", "Alice");
        assert_eq!(render_or_raw("{name.upper}", &ctx), "{name.upper}");
        assert_eq!(render_or_raw("Hi {name}", &ctx), "Hi Alice");
    }

    #[test]
    fn test_unicode_passthrough() {
        let ctx = RenderContext::new().with("name", "Gö");
        assert_eq!(
            render("⚡ {name} joined the ⚡ CyberHerd ⚡", &ctx).unwrap(),
            "⚡ Gö joined the ⚡ CyberHerd ⚡"
        );
    }

    #[test]
    fn test_from_json_skips_nested() {
        let value = json!({
            "name": "Alice",
            "amount": 21,
            "ratio": 2.5,
            "whole": 10.0,
            "flag": true,
            "nested": {"x": 1},
            "list": [1, 2],
            "none": null
        });
        let ctx = RenderContext::from_json(value.as_object().unwrap());

        assert_eq!(ctx.get("name"), Some(&ContextValue::Text("Alice".to_string())));
        assert_eq!(ctx.get("amount"), Some(&ContextValue::Integer(21)));
        assert_eq!(ctx.get("ratio"), Some(&ContextValue::Text("2.5".to_string())));
        assert_eq!(ctx.get("whole"), Some(&ContextValue::Integer(10)));
        assert_eq!(ctx.get("flag"), Some(&ContextValue::Text("true".to_string())));
        assert!(!ctx.contains("nested"));
        assert!(!ctx.contains("list"));
        assert!(!ctx.contains("none"));
        assert_eq!(ctx.len(), 5);
    }
}
