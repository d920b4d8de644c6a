mod settings;

pub use settings::{GatewayConfig, LoggingConfig, Settings, DEFAULT_ENDPOINT};
