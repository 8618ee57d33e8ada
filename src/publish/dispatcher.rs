use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::availability::BackendAvailability;
use super::signer::{
    LocalKeySigning, LocalSigner, NoteSigner, RelayTransport, RemoteSignError, RemoteSigner,
    RemoteSigning, SignerError,
};
use crate::config::{MessagingConfig, SignerConfig};
use crate::metrics::PublishMetrics;
use crate::nostr::{compose_tags, sanitize_private_key, KeyError, Tag, TagRequest, UnsignedNote};
use crate::template::TemplateStore;

/// Setting values that switch publishing off (after trim + lowercase)
const DISABLED_VALUES: &[&str] = &["0", "false", "no", "off", ""];

/// Per-owner setting holding a stored private key
pub const OWNER_KEY_SETTING: &str = "nostr_private_key";

/// Which credential signs a note. The two paths never fall back to each other.
#[derive(Clone, PartialEq, Eq)]
pub enum SigningSelector {
    /// Raw key material (hex, `0x…` or `nsec1…`), sanitised before use
    LocalKey(String),
    /// Key material stored in the owner's settings
    OwnerKey { owner: String },
    /// Opaque wallet handle for the remote custodial signer
    Remote { handle: String },
}

impl fmt::Debug for SigningSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningSelector::LocalKey(_) => f.write_str("LocalKey(<redacted>)"),
            SigningSelector::OwnerKey { owner } => {
                f.debug_struct("OwnerKey").field("owner", owner).finish()
            }
            SigningSelector::Remote { .. } => f.write_str("Remote { handle: <redacted> }"),
        }
    }
}

/// Everything needed to compose, sign and hand off one note
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    pub content: String,
    pub explicit_tags: Vec<Tag>,
    pub event_ids: Vec<String>,
    pub pubkeys: Vec<String>,
    pub container_event_id: Option<String>,
    pub container_ref: Option<String>,
    pub relay_hint: Option<String>,
    pub signing: Option<SigningSelector>,
}

impl PublishRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.explicit_tags = tags;
        self
    }

    pub fn with_event_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_pubkeys<I, S>(mut self, pubkeys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pubkeys = pubkeys.into_iter().map(Into::into).collect();
        self
    }

    /// Reply into a live container event
    pub fn with_container(mut self, event_id: impl Into<String>, coordinate: impl Into<String>) -> Self {
        self.container_event_id = Some(event_id.into());
        self.container_ref = Some(coordinate.into());
        self
    }

    pub fn with_relay_hint(mut self, relay_hint: Option<String>) -> Self {
        self.relay_hint = relay_hint;
        self
    }

    pub fn with_signing(mut self, signing: SigningSelector) -> Self {
        self.signing = Some(signing);
        self
    }

    pub fn tag_request(&self) -> TagRequest {
        TagRequest {
            explicit_tags: self.explicit_tags.clone(),
            event_ids: self.event_ids.clone(),
            pubkeys: self.pubkeys.clone(),
            container_event_id: self.container_event_id.clone(),
            container_ref: self.container_ref.clone(),
            relay_hint: self.relay_hint.clone(),
        }
    }
}

/// Statistics for the publish dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    pub published: AtomicU64,
    /// Calls short-circuited by the publishing switch
    pub disabled: AtomicU64,
    /// Calls without any usable credential
    pub skipped: AtomicU64,
    pub signing_failures: AtomicU64,
    pub transport_failures: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            disabled: self.disabled.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            signing_failures: self.signing_failures.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub published: u64,
    pub disabled: u64,
    pub skipped: u64,
    pub signing_failures: u64,
    pub transport_failures: u64,
}

/// Picks a signing path, signs and hands notes to the relay transport.
///
/// Every failure collapses to `false`; causes are logged and counted.
pub struct PublishDispatcher {
    store: Arc<dyn TemplateStore>,
    transport: Arc<dyn RelayTransport>,
    local_signer: Option<Arc<dyn LocalSigner>>,
    remote_signer: Option<Arc<dyn RemoteSigner>>,
    availability: Arc<BackendAvailability>,
    publishing_setting_key: String,
    remote_scope_tag: String,
    stats: DispatcherStats,
}

impl PublishDispatcher {
    pub fn new(store: Arc<dyn TemplateStore>, transport: Arc<dyn RelayTransport>) -> Self {
        Self {
            store,
            transport,
            local_signer: None,
            remote_signer: None,
            availability: Arc::new(BackendAvailability::new()),
            publishing_setting_key: MessagingConfig::default().publishing_setting_key,
            remote_scope_tag: SignerConfig::default().remote_scope_tag,
            stats: DispatcherStats::default(),
        }
    }

    pub fn with_local_signer(mut self, signer: Arc<dyn LocalSigner>) -> Self {
        self.local_signer = Some(signer);
        self
    }

    pub fn with_remote_signer(mut self, signer: Arc<dyn RemoteSigner>) -> Self {
        self.remote_signer = Some(signer);
        self
    }

    /// Share one availability cache across dispatchers
    pub fn with_availability(mut self, availability: Arc<BackendAvailability>) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_config(mut self, messaging: &MessagingConfig, signer: &SignerConfig) -> Self {
        self.publishing_setting_key = messaging.publishing_setting_key.clone();
        self.remote_scope_tag = signer.remote_scope_tag.clone();
        self
    }

    pub fn availability(&self) -> &BackendAvailability {
        &self.availability
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Read the publishing switch. Missing rows and read errors count as enabled.
    pub async fn is_publishing_enabled(&self) -> bool {
        match self.store.get_setting(&self.publishing_setting_key).await {
            Ok(Some(value)) => {
                let normalized = value.trim().to_lowercase();
                if DISABLED_VALUES.contains(&normalized.as_str()) {
                    tracing::info!(
                        setting = %self.publishing_setting_key,
                        value = %normalized,
                        "Publishing disabled by setting"
                    );
                    false
                } else {
                    true
                }
            }
            Ok(None) => {
                tracing::debug!(
                    setting = %self.publishing_setting_key,
                    "Publishing setting not found, defaulting to enabled"
                );
                true
            }
            Err(e) => {
                tracing::warn!(
                    setting = %self.publishing_setting_key,
                    error = %e,
                    "Failed to read publishing setting, defaulting to enabled"
                );
                true
            }
        }
    }

    /// Compose tags, sign through the selected path and publish.
    ///
    /// Returns `true` when the event was handed to the transport, or when
    /// publishing is switched off.
    #[tracing::instrument(
        name = "publish.compose_and_publish",
        skip(self, request),
        fields(
            content_len = request.content.len(),
            event_ids = request.event_ids.len(),
            pubkeys = request.pubkeys.len(),
            signing = ?request.signing
        )
    )]
    pub async fn compose_and_publish(&self, request: &PublishRequest) -> bool {
        if !self.is_publishing_enabled().await {
            self.stats.disabled.fetch_add(1, Ordering::Relaxed);
            PublishMetrics::record_disabled();
            return true;
        }

        let Some(selector) = request.signing.as_ref() else {
            self.record_skipped("no signing credential supplied");
            return false;
        };

        let signer = match self.signer_for(selector).await {
            Ok(signer) => signer,
            Err(SignerError::InvalidKey(KeyError::Missing)) => {
                self.record_skipped("empty private key");
                return false;
            }
            Err(e) => {
                self.record_signing_failure(path_label(selector), &e);
                return false;
            }
        };

        let note = UnsignedNote::new(request.content.clone(), compose_tags(&request.tag_request()));
        self.sign_and_send(signer.as_ref(), &note).await
    }

    async fn signer_for<'a>(
        &'a self,
        selector: &'a SigningSelector,
    ) -> Result<Box<dyn NoteSigner + 'a>, SignerError> {
        match selector {
            SigningSelector::LocalKey(raw) => self.local_signing(raw),
            SigningSelector::OwnerKey { owner } => {
                let stored = self
                    .store
                    .get_owner_setting(owner, OWNER_KEY_SETTING)
                    .await
                    .map_err(|e| SignerError::Failed(format!("reading stored key: {}", e)))?;
                self.local_signing(stored.as_deref().unwrap_or_default())
            }
            SigningSelector::Remote { handle } => {
                let backend = self
                    .remote_signer
                    .as_deref()
                    .ok_or_else(|| SignerError::Remote(RemoteSignError::Other("no remote signer configured".to_string())))?;
                Ok(Box::new(RemoteSigning::new(backend, handle, &self.remote_scope_tag)))
            }
        }
    }

    fn local_signing(&self, raw_key: &str) -> Result<Box<dyn NoteSigner + '_>, SignerError> {
        let private_key_hex = sanitize_private_key(raw_key)?;
        let backend = self.local_signer.as_deref().ok_or(SignerError::Unavailable)?;
        Ok(Box::new(LocalKeySigning::new(
            backend,
            &self.availability,
            private_key_hex,
        )))
    }

    async fn sign_and_send(&self, signer: &dyn NoteSigner, note: &UnsignedNote) -> bool {
        let event = match signer.sign_note(note).await {
            Ok(event) => event,
            Err(e) => {
                self.record_signing_failure(signer.path(), &e);
                return false;
            }
        };

        match self.transport.publish(&event).await {
            Ok(()) => {
                self.stats.published.fetch_add(1, Ordering::Relaxed);
                PublishMetrics::record_published();
                tracing::info!(
                    kind = event.kind,
                    event_id = %event.short_id(),
                    tags = event.tags.len(),
                    path = signer.path(),
                    "Published note"
                );
                true
            }
            Err(e) => {
                self.stats.transport_failures.fetch_add(1, Ordering::Relaxed);
                PublishMetrics::record_failed();
                tracing::error!(event_id = %event.short_id(), error = %e, "Relay publish failed");
                false
            }
        }
    }

    fn record_skipped(&self, reason: &str) {
        self.stats.skipped.fetch_add(1, Ordering::Relaxed);
        PublishMetrics::record_skipped();
        tracing::warn!(reason = %reason, "Skipping publish");
    }

    fn record_signing_failure(&self, path: &str, error: &SignerError) {
        self.stats.signing_failures.fetch_add(1, Ordering::Relaxed);
        PublishMetrics::record_failed();
        PublishMetrics::record_signing_failure(error.cause());

        match error {
            SignerError::Remote(RemoteSignError::NotFound) => {
                tracing::warn!(path = %path, "No remote signing key registered for handle")
            }
            SignerError::Remote(RemoteSignError::PermissionDenied { kind }) => {
                tracing::warn!(path = %path, kind = kind, "Remote signing key not permitted for this kind")
            }
            SignerError::InvalidKey(e) => {
                tracing::warn!(path = %path, error = %e, "Private key could not be sanitised")
            }
            SignerError::Unavailable => {
                tracing::error!(path = %path, "Local signing backend unavailable")
            }
            other => tracing::error!(path = %path, error = %other, "Signing failed"),
        }
    }
}

fn path_label(selector: &SigningSelector) -> &'static str {
    match selector {
        SigningSelector::LocalKey(_) | SigningSelector::OwnerKey { .. } => "local",
        SigningSelector::Remote { .. } => "remote",
    }
}
