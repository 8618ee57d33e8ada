//! Message template system.
//!
//! This module provides:
//! - Template definitions scoped globally or per owner
//! - The store adapter trait with an in-memory implementation
//! - Recovery of legacy serialized template bodies
//! - Restricted `{placeholder}` substitution
//! - Template pools, built-in defaults and override resolution
//! - Catalogue management (seed defaults, export/import, random pick)

pub mod catalogue;
mod defaults;
mod literal;
mod pool;
mod store;
mod substitution;
mod types;
mod unwrap;

pub use defaults::{default_categories, default_pool};
pub use pool::{load_overrides, resolve_pool, TemplateOverrides, TemplatePool};
pub use store::{create_template_store, MemoryTemplateStore, TemplateStore};
pub use substitution::{render, render_or_raw, ContextValue, RenderContext, RenderError};
pub use types::{
    StoreError, StoreResult, Template, TemplateEntry, TemplateError, TemplateResult,
    TemplateScope,
};
pub use unwrap::unwrap_stored_body;
