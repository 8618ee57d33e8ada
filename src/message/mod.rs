//! Event notification rendering.
//!
//! Turns an event type plus its loosely typed item record into a
//! [`MessageBundle`] with protocol-facing and display-facing text.

mod builder;
mod bundle;
mod entities;
mod item;

pub use builder::{capacity_notice, member_reference, MessageBuilder, ENTITY_PLACEHOLDER};
pub use bundle::MessageBundle;
pub use entities::{
    image_slug, join_with_and, normalize_entities, Entity, EntityCatalogue, EntityImage,
    EntitySelection,
};
pub use item::{
    coerce_int, coerce_text, DisplacementCandidate, EventType, MessageItem, RenderRequest,
    ReplyContext,
};
