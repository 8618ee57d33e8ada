//! Signing and transport contracts.
//!
//! The engines themselves live outside this crate. [`NoteSigner`] is the one
//! interface the dispatcher signs through; [`LocalKeySigning`] and
//! [`RemoteSigning`] adapt the two backend contracts to it.

use async_trait::async_trait;
use thiserror::Error;

use super::availability::BackendAvailability;
use crate::nostr::{KeyError, SignedEvent, UnsignedNote};

/// Failures reported by the remote custodial signer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteSignError {
    #[error("no signing key registered for this handle")]
    NotFound,

    #[error("signing key lacks permission for kind {kind}")]
    PermissionDenied { kind: u16 },

    #[error("remote signer failed: {0}")]
    Other(String),
}

/// Any failure on the way from an unsigned note to a signed event
#[derive(Debug, Error)]
pub enum SignerError {
    #[error("local signing backend unavailable")]
    Unavailable,

    #[error("invalid private key: {0}")]
    InvalidKey(#[from] KeyError),

    #[error(transparent)]
    Remote(#[from] RemoteSignError),

    #[error("signing failed: {0}")]
    Failed(String),
}

impl SignerError {
    /// Metric/log label for the failure cause
    pub fn cause(&self) -> &'static str {
        match self {
            SignerError::Unavailable => "backend_unavailable",
            SignerError::InvalidKey(_) => "key_sanitisation",
            SignerError::Remote(RemoteSignError::NotFound) => "not_found",
            SignerError::Remote(RemoteSignError::PermissionDenied { .. }) => "permission_denied",
            SignerError::Remote(RemoteSignError::Other(_)) => "other",
            SignerError::Failed(_) => "other",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("relay transport failed: {0}")]
pub struct TransportError(pub String);

/// Local-key signing engine
#[async_trait]
pub trait LocalSigner: Send + Sync {
    /// Whether the engine can sign at all in this process
    async fn probe(&self) -> bool;

    /// Sign with a sanitised 64-character hex private key
    async fn sign(&self, note: &UnsignedNote, private_key_hex: &str) -> Result<SignedEvent, SignerError>;
}

/// Remote custodial ("bunker") signing engine
#[async_trait]
pub trait RemoteSigner: Send + Sync {
    async fn sign_remote(
        &self,
        handle: &str,
        scope_tag: &str,
        note: &UnsignedNote,
    ) -> Result<SignedEvent, RemoteSignError>;
}

/// Hands signed events to the relay pool. Delivery to individual relays is
/// not awaited.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn publish(&self, event: &SignedEvent) -> Result<(), TransportError>;
}

/// A ready-to-use signing path for one publish call
#[async_trait]
pub trait NoteSigner: Send + Sync {
    /// Path label for logs
    fn path(&self) -> &'static str;

    async fn sign_note(&self, note: &UnsignedNote) -> Result<SignedEvent, SignerError>;
}

/// Local engine plus sanitised key material
pub struct LocalKeySigning<'a> {
    backend: &'a dyn LocalSigner,
    availability: &'a BackendAvailability,
    private_key_hex: String,
}

impl<'a> LocalKeySigning<'a> {
    /// Key material must already be sanitised
    pub fn new(
        backend: &'a dyn LocalSigner,
        availability: &'a BackendAvailability,
        private_key_hex: String,
    ) -> Self {
        Self {
            backend,
            availability,
            private_key_hex,
        }
    }
}

#[async_trait]
impl NoteSigner for LocalKeySigning<'_> {
    fn path(&self) -> &'static str {
        "local"
    }

    async fn sign_note(&self, note: &UnsignedNote) -> Result<SignedEvent, SignerError> {
        let available = self
            .availability
            .get_or_check(|| self.backend.probe())
            .await;
        if !available {
            return Err(SignerError::Unavailable);
        }
        self.backend.sign(note, &self.private_key_hex).await
    }
}

/// Remote engine plus the caller's wallet handle
pub struct RemoteSigning<'a> {
    backend: &'a dyn RemoteSigner,
    handle: &'a str,
    scope_tag: &'a str,
}

impl<'a> RemoteSigning<'a> {
    pub fn new(backend: &'a dyn RemoteSigner, handle: &'a str, scope_tag: &'a str) -> Self {
        Self {
            backend,
            handle,
            scope_tag,
        }
    }
}

#[async_trait]
impl NoteSigner for RemoteSigning<'_> {
    fn path(&self) -> &'static str {
        "remote"
    }

    async fn sign_note(&self, note: &UnsignedNote) -> Result<SignedEvent, SignerError> {
        Ok(self
            .backend
            .sign_remote(self.handle, self.scope_tag, note)
            .await?)
    }
}
