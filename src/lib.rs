// Shared components
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Protocol plumbing
pub mod nostr;

// Templates and message composition
pub mod message;
pub mod template;

// Signing, publishing and the display feed
pub mod publish;

// Facade
pub mod service;

pub use config::Settings;
pub use error::{AppError, Result};
pub use message::{EventType, MessageBuilder, MessageBundle, RenderRequest, ReplyContext};
pub use publish::{PublishDispatcher, PublishRequest, SigningSelector};
pub use service::{MessagingService, TemplatePublishOptions, TemplateRenderRequest};
