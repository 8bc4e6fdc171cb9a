pub mod engine_config;
pub mod log_config;

pub use engine_config::{load_config, CheckpointConfig, EngineConfig, EngineConfigBuilder};
pub use log_config::LoggingConfig;
