use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub messaging: MessagingConfig,
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    /// Topic used for the local real-time display feed
    #[serde(default = "default_display_topic")]
    pub display_topic: String,
    /// Trailer stripped from protocol content when replying into a live container
    #[serde(default = "default_promo_trailer")]
    pub promo_trailer: String,
    /// Settings row consulted before every publish
    #[serde(default = "default_publishing_setting_key")]
    pub publishing_setting_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignerConfig {
    /// Scope tag handed to the remote custodial signer
    #[serde(default = "default_remote_scope_tag")]
    pub remote_scope_tag: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_display_topic() -> String {
    "cyberherd".to_string()
}

pub(crate) fn default_promo_trailer() -> String {
    "\n\n https://lightning-goats.com\n\n".to_string()
}

fn default_publishing_setting_key() -> String {
    "nostr_publishing_enabled".to_string()
}

fn default_remote_scope_tag() -> String {
    "cyberherd_messaging".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("messaging.display_topic", default_display_topic())?
            .set_default("messaging.promo_trailer", default_promo_trailer())?
            .set_default(
                "messaging.publishing_setting_key",
                default_publishing_setting_key(),
            )?
            .set_default("signer.remote_scope_tag", default_remote_scope_tag())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // MESSAGING__DISPLAY_TOPIC, SIGNER__REMOTE_SCOPE_TAG, LOGGING__JSON, ...
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            display_topic: default_display_topic(),
            promo_trailer: default_promo_trailer(),
            publishing_setting_key: default_publishing_setting_key(),
        }
    }
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            remote_scope_tag: default_remote_scope_tag(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
