//! Messaging facade.
//!
//! [`MessagingService`] wires the template store, the bundle builder, the
//! publish dispatcher and the display broadcast together. None of its
//! produced-surface methods return errors for render or publish problems:
//! those degrade to fallback content or `false`.

mod request;

pub use request::{DisplayPayload, RenderedTemplate, TemplatePublishOptions, TemplateRenderRequest};

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use crate::config::MessagingConfig;
use crate::message::{EntityCatalogue, EntitySelection, EventType, MessageBuilder, MessageBundle, RenderRequest, ENTITY_PLACEHOLDER};
use crate::metrics::DisplayMetrics;
use crate::nostr::normalize_relay_hint;
use crate::publish::{DisplayBroadcaster, PublishDispatcher, PublishRequest};
use crate::template::{
    load_overrides, render_or_raw, unwrap_stored_body, RenderContext, StoreResult, Template,
    TemplateError, TemplateOverrides, TemplateStore,
};

/// Outcome of [`MessagingService::announce`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnnounceOutcome {
    pub published: bool,
    pub displayed: bool,
}

pub struct MessagingService {
    store: Arc<dyn TemplateStore>,
    dispatcher: Arc<PublishDispatcher>,
    broadcaster: Arc<dyn DisplayBroadcaster>,
    catalogue: EntityCatalogue,
    promo_trailer: String,
    display_topic: String,
}

impl MessagingService {
    pub fn new(
        store: Arc<dyn TemplateStore>,
        dispatcher: Arc<PublishDispatcher>,
        broadcaster: Arc<dyn DisplayBroadcaster>,
    ) -> Self {
        let config = MessagingConfig::default();
        Self {
            store,
            dispatcher,
            broadcaster,
            catalogue: EntityCatalogue::goats(),
            promo_trailer: config.promo_trailer,
            display_topic: config.display_topic,
        }
    }

    pub fn with_config(mut self, config: &MessagingConfig) -> Self {
        self.promo_trailer = config.promo_trailer.clone();
        self.display_topic = config.display_topic.clone();
        self
    }

    pub fn with_catalogue(mut self, catalogue: EntityCatalogue) -> Self {
        self.catalogue = catalogue;
        self
    }

    pub fn store(&self) -> &Arc<dyn TemplateStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &PublishDispatcher {
        &self.dispatcher
    }

    pub fn display_topic(&self) -> &str {
        &self.display_topic
    }

    /// Builder primed with the stored overrides for `owner` (and global rows)
    pub async fn message_builder(&self, owner: Option<&str>) -> MessageBuilder {
        let overrides = match load_overrides(self.store.as_ref(), owner).await {
            Ok(overrides) => overrides,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load template overrides, using built-in pools");
                TemplateOverrides::new()
            }
        };
        MessageBuilder::new()
            .with_overrides(overrides)
            .with_catalogue(self.catalogue.clone())
            .with_promo_trailer(self.promo_trailer.clone())
    }

    /// Render an event into a bundle
    #[tracing::instrument(
        name = "service.render",
        skip(self, request),
        fields(event_type = %request.event_type)
    )]
    pub async fn render(&self, request: &RenderRequest, owner: Option<&str>) -> MessageBundle {
        let builder = self.message_builder(owner).await;
        builder.build(request, &mut rand::rng())
    }

    /// [`render`](Self::render) with a caller-supplied random source
    pub async fn render_with<R: Rng + ?Sized>(
        &self,
        request: &RenderRequest,
        owner: Option<&str>,
        rng: &mut R,
    ) -> MessageBundle {
        let builder = self.message_builder(owner).await;
        builder.build(request, rng)
    }

    pub async fn compose_and_publish(&self, request: &PublishRequest) -> bool {
        self.dispatcher.compose_and_publish(request).await
    }

    async fn fetch_template(&self, request: &TemplateRenderRequest) -> StoreResult<Template> {
        for scope in request.scopes() {
            if let Some(template) = self
                .store
                .get(&scope, &request.category, &request.key)
                .await?
            {
                return Ok(template);
            }
        }
        Err(TemplateError::NotFound {
            category: request.category.clone(),
            key: request.key.clone(),
        }
        .into())
    }

    /// Render a stored template for both channels.
    ///
    /// Fails only when the template does not exist or the store errors.
    #[tracing::instrument(
        name = "service.render_template",
        skip(self, request),
        fields(category = %request.category, key = %request.key)
    )]
    pub async fn render_template(&self, request: &TemplateRenderRequest) -> StoreResult<RenderedTemplate> {
        let template = self.fetch_template(request).await?;
        let membership = request.membership_request();
        let builder = self.message_builder(request.owner.as_deref()).await;

        let mut rng = rand::rng();
        Ok(self.finish_template(request, &template, membership.as_ref(), &builder, &mut rng))
    }

    /// [`render_template`](Self::render_template) with a caller-supplied random source
    pub async fn render_template_with<R: Rng + ?Sized>(
        &self,
        request: &TemplateRenderRequest,
        rng: &mut R,
    ) -> StoreResult<RenderedTemplate> {
        let template = self.fetch_template(request).await?;
        let membership = request.membership_request();
        let builder = self.message_builder(request.owner.as_deref()).await;
        Ok(self.finish_template(request, &template, membership.as_ref(), &builder, rng))
    }

    fn finish_template<R: Rng + ?Sized>(
        &self,
        request: &TemplateRenderRequest,
        template: &Template,
        membership: Option<&RenderRequest>,
        builder: &MessageBuilder,
        rng: &mut R,
    ) -> RenderedTemplate {
        let entry = unwrap_stored_body(&template.content);

        let selection = if entry.content.contains(ENTITY_PLACEHOLDER) {
            self.catalogue.select(rng)
        } else {
            EntitySelection::default()
        };

        let base = RenderContext::from_json(&request.values);
        let protocol = if selection.is_empty() {
            base.clone()
        } else {
            base.clone().with("goat_name", &selection.references)
        };
        let display = if selection.is_empty() {
            base
        } else {
            base.with("goat_name", &selection.names)
        };

        let mut nostr_content = render_or_raw(&entry.content, &protocol);
        let mut display_content = render_or_raw(&entry.content, &display);

        let mut entities = (!selection.is_empty()).then(|| selection.images.clone());
        if let Some(membership) = membership {
            let bundle = builder.build(membership, rng);
            let supplement = bundle.supplemental_text();
            nostr_content.push_str(&supplement);
            display_content.push_str(&supplement);
            if bundle.entities.is_some() {
                entities = bundle.entities;
            }
        }

        RenderedTemplate {
            nostr_content: builder.strip_trailer(&nostr_content, request.reply.is_container_reply()),
            display_content,
            entities,
            entity_pubkeys: selection.pubkeys,
            reply_relay: effective_relay(
                request.relay_hint.as_deref(),
                entry.reply_relay.as_deref(),
                template.reply_relay.as_deref(),
            ),
        }
    }

    /// Render a stored template and publish its protocol content
    #[tracing::instrument(
        name = "service.render_and_publish_template",
        skip(self, request, options),
        fields(category = %request.category, key = %request.key)
    )]
    pub async fn render_and_publish_template(
        &self,
        request: &TemplateRenderRequest,
        options: TemplatePublishOptions,
    ) -> bool {
        let rendered = match self.render_template(request).await {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::error!(error = %e, "Template render failed, nothing published");
                return false;
            }
        };

        let publish = PublishRequest {
            content: rendered.nostr_content,
            explicit_tags: options.tags,
            event_ids: options.event_ids,
            pubkeys: merge_pubkeys(&options.pubkeys, &rendered.entity_pubkeys),
            container_event_id: request.reply.container_event_id.clone(),
            container_ref: request.reply.container_ref.clone(),
            relay_hint: rendered.reply_relay,
            signing: options.signing,
        };
        self.dispatcher.compose_and_publish(&publish).await
    }

    /// Serialise `message` and push it to the display topic
    pub async fn send_to_display<T: Serialize + ?Sized>(&self, message: &T) -> bool {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                DisplayMetrics::record_failed();
                tracing::error!(topic = %self.display_topic, error = %e, "Failed to serialise display payload");
                return false;
            }
        };

        if self.broadcaster.broadcast(&self.display_topic, &payload).await {
            DisplayMetrics::record_sent();
            true
        } else {
            DisplayMetrics::record_failed();
            tracing::error!(topic = %self.display_topic, "Display broadcast failed");
            false
        }
    }

    /// Publish a bundle's protocol content and show its display content
    #[tracing::instrument(
        name = "service.announce",
        skip(self, bundle, options, reply),
        fields(event_type = %event_type)
    )]
    pub async fn announce(
        &self,
        event_type: &EventType,
        bundle: &MessageBundle,
        options: TemplatePublishOptions,
        reply: &crate::message::ReplyContext,
    ) -> AnnounceOutcome {
        let publish = PublishRequest {
            content: bundle.nostr_content.clone(),
            explicit_tags: options.tags,
            event_ids: options.event_ids,
            pubkeys: merge_pubkeys(&options.pubkeys, &bundle.entity_pubkeys),
            container_event_id: reply.container_event_id.clone(),
            container_ref: reply.container_ref.clone(),
            relay_hint: bundle.reply_relay.clone(),
            signing: options.signing,
        };
        let published = self.dispatcher.compose_and_publish(&publish).await;

        let payload = DisplayPayload::from_bundle(event_type.as_str(), bundle);
        let displayed = self.send_to_display(&payload).await;

        AnnounceOutcome {
            published,
            displayed,
        }
    }
}

/// Explicit hint, then the hint embedded in the stored body, then the row's column
fn effective_relay(explicit: Option<&str>, embedded: Option<&str>, column: Option<&str>) -> Option<String> {
    if let Some(hint) = explicit.and_then(normalize_relay_hint) {
        return Some(hint);
    }

    if let Some(raw) = embedded.filter(|s| !s.trim().is_empty()) {
        match normalize_relay_hint(raw) {
            Some(hint) => return Some(hint),
            None => tracing::warn!(relay = %raw, "Template relay hint is not a websocket URL, ignoring"),
        }
    }

    column.and_then(normalize_relay_hint)
}

/// Append `extra` pubkeys not already present (case-insensitive)
fn merge_pubkeys(base: &[String], extra: &[String]) -> Vec<String> {
    let mut merged = base.to_vec();
    for pubkey in extra {
        let candidate = pubkey.trim();
        if !merged
            .iter()
            .any(|existing| existing.trim().eq_ignore_ascii_case(candidate))
        {
            merged.push(candidate.to_string());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_relay_precedence() {
        assert_eq!(
            effective_relay(Some("wss://explicit"), Some("wss://embedded"), Some("wss://column")),
            Some("wss://explicit".to_string())
        );
        assert_eq!(
            effective_relay(None, Some("https://embedded"), Some("wss://column")),
            Some("wss://embedded".to_string())
        );
        assert_eq!(
            effective_relay(Some("not a url"), Some("ftp://embedded"), Some("http://column")),
            Some("ws://column".to_string())
        );
        assert_eq!(effective_relay(None, None, None), None);
    }

    #[test]
    fn test_merge_pubkeys_case_insensitive() {
        let base = vec!["ABC".to_string()];
        let extra = vec!["abc".to_string(), " def ".to_string()];
        assert_eq!(merge_pubkeys(&base, &extra), vec!["ABC".to_string(), "def".to_string()]);
    }
}
