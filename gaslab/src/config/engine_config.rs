use crate::{config::log_config::LoggingConfig, core::Direction, errors::GasError};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 10;

#[derive(Debug, Deserialize, PartialEq, Clone, Serialize)]
pub struct CheckpointConfig {
    pub enabled: bool,
    /// Take a checkpoint after every `interval` supersteps.
    pub interval: usize,
    /// Where file checkpoints are written, in-memory checkpoints when unset.
    pub dir: Option<PathBuf>,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: DEFAULT_CHECKPOINT_INTERVAL,
            dir: None,
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Clone, Serialize)]
pub struct EngineConfig {
    pub gather_edges: Direction,
    pub scatter_edges: Direction,
    /// Run the gather phase and merge contributions. When off `apply` receives no accumulator.
    pub aggregator: bool,
    pub max_iterations: Option<usize>,
    pub num_threads: Option<usize>,
    pub transform_on_load: bool,
    pub save_on_finish: bool,
    pub checkpoint: CheckpointConfig,
    pub logging: LoggingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gather_edges: Direction::IN,
            scatter_edges: Direction::OUT,
            aggregator: true,
            max_iterations: None,
            num_threads: None,
            transform_on_load: false,
            save_on_finish: false,
            checkpoint: CheckpointConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

pub struct EngineConfigBuilder {
    gather_edges: Direction,
    scatter_edges: Direction,
    aggregator: bool,
    max_iterations: Option<usize>,
    num_threads: Option<usize>,
    transform_on_load: bool,
    save_on_finish: bool,
    checkpoint: CheckpointConfig,
    logging: LoggingConfig,
}

impl From<EngineConfig> for EngineConfigBuilder {
    fn from(config: EngineConfig) -> Self {
        Self {
            gather_edges: config.gather_edges,
            scatter_edges: config.scatter_edges,
            aggregator: config.aggregator,
            max_iterations: config.max_iterations,
            num_threads: config.num_threads,
            transform_on_load: config.transform_on_load,
            save_on_finish: config.save_on_finish,
            checkpoint: config.checkpoint,
            logging: config.logging,
        }
    }
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        EngineConfig::default().into()
    }

    pub fn with_gather_edges(mut self, dir: Direction) -> Self {
        self.gather_edges = dir;
        self
    }

    pub fn with_scatter_edges(mut self, dir: Direction) -> Self {
        self.scatter_edges = dir;
        self
    }

    pub fn with_aggregator(mut self, aggregator: bool) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    pub fn with_transform_on_load(mut self, transform_on_load: bool) -> Self {
        self.transform_on_load = transform_on_load;
        self
    }

    pub fn with_save_on_finish(mut self, save_on_finish: bool) -> Self {
        self.save_on_finish = save_on_finish;
        self
    }

    pub fn with_checkpoints(mut self, interval: usize, dir: Option<PathBuf>) -> Self {
        self.checkpoint = CheckpointConfig {
            enabled: true,
            interval,
            dir,
        };
        self
    }

    pub fn with_log_level(mut self, log_level: String) -> Self {
        self.logging.log_level = log_level;
        self
    }

    pub fn build(self) -> EngineConfig {
        EngineConfig {
            gather_edges: self.gather_edges,
            scatter_edges: self.scatter_edges,
            aggregator: self.aggregator,
            max_iterations: self.max_iterations,
            num_threads: self.num_threads,
            transform_on_load: self.transform_on_load,
            save_on_finish: self.save_on_finish,
            checkpoint: self.checkpoint,
            logging: self.logging,
        }
    }
}

// Order of precedence: config file >> config args >> defaults
// The args act as the base layer so a file can still override individual keys.
pub fn load_config(
    engine_config: Option<EngineConfig>,
    config_path: Option<PathBuf>,
) -> Result<EngineConfig, GasError> {
    let engine_config = engine_config.unwrap_or_default();
    let json = serde_json::to_string(&engine_config)
        .map_err(|err| config::ConfigError::Foreign(Box::new(err)))?;
    let mut builder = Config::builder().add_source(File::from_str(&json, FileFormat::Json));
    if let Some(config_path) = config_path {
        builder = builder.add_source(File::from(config_path));
    }
    Ok(builder.build()?.try_deserialize::<EngineConfig>()?)
}
