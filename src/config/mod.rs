mod settings;

pub(crate) use settings::default_promo_trailer;
pub use settings::{LoggingConfig, MessagingConfig, Settings, SignerConfig};
