//! Configuration file loading for waverun
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Environment: `WAVERUN_OUTPUT__NAMESPACE=...`, `WAVERUN_STORE__PATH=...`
//! 2. `--config <path>` specified file
//! 3. Project root: `./waverun.toml` or `./.waverun.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/waverun/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileOutputConfig, FileOutputFormat, FileStoreConfig,
};
pub use loader::ConfigLoader;
