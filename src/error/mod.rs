use thiserror::Error;

use crate::nostr::KeyError;
use crate::publish::{RemoteSignError, SignerError, TransportError};
use crate::telemetry::TelemetryError;
use crate::template::{RenderError, StoreError, TemplateError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Template store error: {0}")]
    Store(#[from] StoreError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("Remote signer error: {0}")]
    RemoteSign(#[from] RemoteSignError),

    #[error("Relay transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// Stable code used in log lines
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Template(TemplateError::NotFound { .. }) => "NOT_FOUND",
            AppError::Template(_) => "TEMPLATE_ERROR",
            AppError::Store(StoreError::Template(TemplateError::NotFound { .. })) => "NOT_FOUND",
            AppError::Store(_) => "STORE_ERROR",
            AppError::Render(_) => "RENDER_ERROR",
            AppError::Key(_) => "KEY_ERROR",
            AppError::Signer(_) => "SIGNER_ERROR",
            AppError::RemoteSign(_) => "REMOTE_SIGN_ERROR",
            AppError::Transport(_) => "TRANSPORT_ERROR",
            AppError::Telemetry(_) => "TELEMETRY_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
