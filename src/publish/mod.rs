//! Signing-path selection and publishing.
//!
//! - Contracts for the local-key signer, the remote custodial signer, the
//!   relay transport and the display broadcast
//! - The local-backend availability cache
//! - [`PublishDispatcher`], which gates on the publishing switch, signs
//!   through exactly one path and hands the event to the transport

mod availability;
mod broadcast;
mod dispatcher;
mod signer;

pub use availability::BackendAvailability;
pub use broadcast::{ChannelBroadcaster, DisplayBroadcaster, DisplayFrame};
pub use dispatcher::{
    DispatcherStats, DispatcherStatsSnapshot, PublishDispatcher, PublishRequest, SigningSelector,
    OWNER_KEY_SETTING,
};
pub use signer::{
    LocalKeySigning, LocalSigner, NoteSigner, RelayTransport, RemoteSignError, RemoteSigner,
    RemoteSigning, SignerError, TransportError,
};
