//! Configuration management

mod mapping;
mod settings;

pub use mapping::{NameMap, DEFAULT_MAPPING_FILE, LEGACY_MAPPING_FILE};
pub use settings::{
    AppConfig, ConfigError, ConfigOverrides, Settings, DEFAULT_BAUD, DEFAULT_LISTEN, DEFAULT_PORT,
};
